//! Layouts describe which views and boxes should be live after an update.

use indexmap::IndexMap;

/// How a layout slot is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// A regular view.
    Leaf,
    /// A box that selects which of its children are shown.
    Box,
    /// A view whose content may arrive later.
    Async,
}

/// Child slots in layout order.
pub type Layout = IndexMap<String, LayoutNode>;

/// A node in a layout tree. Immutable for the duration of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub kind: LayoutKind,
    pub views: Layout,
}

impl LayoutNode {
    pub fn new(id: impl Into<String>, kind: LayoutKind) -> LayoutNode {
        LayoutNode {
            id: id.into(),
            kind,
            views: IndexMap::new(),
        }
    }

    pub fn leaf(id: impl Into<String>) -> LayoutNode {
        LayoutNode::new(id, LayoutKind::Leaf)
    }

    pub fn boxed(id: impl Into<String>) -> LayoutNode {
        LayoutNode::new(id, LayoutKind::Box)
    }

    pub fn async_leaf(id: impl Into<String>) -> LayoutNode {
        LayoutNode::new(id, LayoutKind::Async)
    }

    /// Appends a child slot. A second child with the same id replaces the first in place.
    pub fn child(mut self, child: LayoutNode) -> LayoutNode {
        self.views.insert(child.id.clone(), child);
        self
    }
}

#[test]
fn test_layout_children_keep_order() {
    let layout = LayoutNode::boxed("content")
        .child(LayoutNode::leaf("b"))
        .child(LayoutNode::async_leaf("a"))
        .child(LayoutNode::leaf("c"));

    let ids: Vec<_> = layout.views.keys().map(String::as_str).collect();
    assert_eq!(ids, ["b", "a", "c"]);
    assert_eq!(layout.views["a"].kind, LayoutKind::Async);
}
