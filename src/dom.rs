//! DOM primitives.
//!
//! The engine only needs a handful of operations on the render target; they are collected in the
//! [`Dom`] trait. [`MemoryDom`] is an in-memory implementation, and [`Markup`] describes freshly
//! rendered subtrees for it.

use crate::error::DomError;
use std::collections::HashMap;
use uuid::Uuid;

/// A reference to a node in a [`Dom`].
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32, u16, u16, [u8; 8]);

impl NodeId {
    pub(crate) fn new() -> NodeId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        NodeId(a, b, c, *d)
    }
}

/// A mutable render target.
pub trait Dom {
    /// Returns every descendant of `scope` carrying the class, in document order. `scope` itself
    /// is not included.
    fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId>;

    /// Returns the first descendant of `scope` (in document order, excluding `scope`) carrying
    /// the class.
    fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.find_all_by_class(scope, class).into_iter().next()
    }

    /// Returns the node’s children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Moves `node` into `parent`, right before `before`.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, before: NodeId)
        -> Result<(), DomError>;

    /// Moves `node` to the end of `parent`’s children.
    fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError>;

    /// True if `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError>;

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError>;
}

/// A description of a subtree to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub children: Vec<Markup>,
}

impl Markup {
    pub fn new(tag: impl Into<String>) -> Markup {
        Markup {
            tag: tag.into(),
            ..Markup::default()
        }
    }

    pub fn div() -> Markup {
        Markup::new("div")
    }

    pub fn class(mut self, class: impl Into<String>) -> Markup {
        self.classes.push(class.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Markup {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Markup) -> Markup {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    classes: Vec<String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory DOM.
///
/// Nodes are never freed; detached subtrees stay addressable so they can be re-attached later.
#[derive(Debug, Default)]
pub struct MemoryDom {
    nodes: HashMap<NodeId, Element>,
}

impl MemoryDom {
    pub fn new() -> MemoryDom {
        MemoryDom::default()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id,
            Element {
                tag: tag.to_string(),
                classes: Vec::new(),
                text: None,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Renders markup into a new detached subtree and returns its root.
    pub fn render(&mut self, markup: &Markup) -> NodeId {
        let id = self.create_element(&markup.tag);
        if let Some(element) = self.nodes.get_mut(&id) {
            element.classes = markup.classes.clone();
            element.text = markup.text.clone();
        }
        for child in &markup.children {
            let child_id = self.render(child);
            self.attach(id, child_id, None);
        }
        id
    }

    /// Replaces a node’s children with freshly rendered markup.
    ///
    /// The old children are detached, not destroyed.
    pub fn set_children(&mut self, parent: NodeId, markup: &[Markup]) -> Result<(), DomError> {
        let old = match self.nodes.get_mut(&parent) {
            Some(element) => std::mem::take(&mut element.children),
            None => return Err(DomError::NoSuchNode(parent)),
        };
        for child in old {
            if let Some(element) = self.nodes.get_mut(&child) {
                element.parent = None;
            }
        }
        for markup in markup {
            let child = self.render(markup);
            self.attach(parent, child, None);
        }
        Ok(())
    }

    /// Detaches a node from its parent.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = match self.nodes.get_mut(&node) {
            Some(element) => element.parent.take(),
            None => return Err(DomError::NoSuchNode(node)),
        };
        if let Some(parent) = parent {
            if let Some(element) = self.nodes.get_mut(&parent) {
                element.children.retain(|child| *child != node);
            }
        }
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|element| element.parent)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|element| element.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|element| element.text.as_deref())
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.nodes
            .get(&node)
            .map(|element| element.classes.as_slice())
            .unwrap_or(&[])
    }

    fn check_move(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        if !self.nodes.contains_key(&parent) {
            return Err(DomError::NoSuchNode(parent));
        }
        if !self.nodes.contains_key(&node) {
            return Err(DomError::NoSuchNode(node));
        }
        if self.contains(node, parent) {
            return Err(DomError::Cycle(node));
        }
        Ok(())
    }

    /// Links a detached node into `parent` at `index` (or at the end).
    fn attach(&mut self, parent: NodeId, node: NodeId, index: Option<usize>) {
        if let Some(element) = self.nodes.get_mut(&parent) {
            match index {
                Some(index) => element.children.insert(index, node),
                None => element.children.push(node),
            }
        }
        if let Some(element) = self.nodes.get_mut(&node) {
            element.parent = Some(parent);
        }
    }
}

impl Dom for MemoryDom {
    fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            let element = &self.nodes[&id];
            if element.classes.iter().any(|c| c == class) {
                found.push(id);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|element| element.children.clone())
            .unwrap_or_default()
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        self.check_move(parent, node)?;
        if self.parent(before) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                node: before,
            });
        }
        if node == before {
            return Ok(());
        }
        self.detach(node)?;
        // position is looked up after detaching, since detaching may shift it
        let index = self.nodes[&parent]
            .children
            .iter()
            .position(|child| *child == before)
            .ok_or(DomError::NotAChild {
                parent,
                node: before,
            })?;
        self.attach(parent, node, Some(index));
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.check_move(parent, node)?;
        self.detach(node)?;
        self.attach(parent, node, None);
        Ok(())
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let element = self.nodes.get_mut(&node).ok_or(DomError::NoSuchNode(node))?;
        if !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let element = self.nodes.get_mut(&node).ok_or(DomError::NoSuchNode(node))?;
        element.classes.retain(|c| c != class);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (MemoryDom, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.render(
            &Markup::div()
                .child(Markup::div().class("a"))
                .child(Markup::div().class("b").child(Markup::div().class("c")))
                .child(Markup::div().class("c")),
        );
        (dom, root)
    }

    #[test]
    fn test_find_by_class_in_document_order() {
        let (dom, root) = fixture();
        let b = dom.children(root)[1];
        let nested_c = dom.children(b)[0];
        assert_eq!(
            dom.find_by_class(root, "c"),
            Some(nested_c),
            "the nested node comes first in document order"
        );
        assert_eq!(dom.find_by_class(b, "b"), None, "scope itself is not searched");
        assert_eq!(
            dom.find_all_by_class(root, "c"),
            vec![nested_c, dom.children(root)[2]]
        );
    }

    #[test]
    fn test_insert_before_moves_node() {
        let (mut dom, root) = fixture();
        let children = dom.children(root);
        let (a, b, c) = (children[0], children[1], children[2]);

        dom.insert_before(root, c, a).unwrap();
        assert_eq!(dom.children(root), vec![c, a, b]);

        dom.insert_before(root, a, b).unwrap();
        assert_eq!(dom.children(root), vec![c, a, b], "already in place");

        dom.append_child(root, c).unwrap();
        assert_eq!(dom.children(root), vec![a, b, c]);
    }

    #[test]
    fn test_moves_across_parents() {
        let (mut dom, root) = fixture();
        let b = dom.children(root)[1];
        let nested_c = dom.children(b)[0];
        let other = dom.create_element("div");

        dom.append_child(other, nested_c).unwrap();
        assert!(dom.children(b).is_empty());
        assert_eq!(dom.parent(nested_c), Some(other));
        assert!(!dom.contains(root, nested_c));
        assert!(dom.contains(other, nested_c));
    }

    #[test]
    fn test_rejects_cycles() {
        let (mut dom, root) = fixture();
        let b = dom.children(root)[1];
        assert_eq!(dom.append_child(b, root), Err(DomError::Cycle(root)));
        let stray = dom.create_element("div");
        assert_eq!(
            dom.insert_before(root, stray, stray),
            Err(DomError::NotAChild { parent: root, node: stray })
        );
    }

    #[test]
    fn test_classes() {
        let (mut dom, root) = fixture();
        dom.add_class(root, "x").unwrap();
        dom.add_class(root, "x").unwrap();
        assert_eq!(dom.classes(root), ["x".to_string()]);
        dom.remove_class(root, "x").unwrap();
        assert!(!dom.has_class(root, "x"));
    }
}
