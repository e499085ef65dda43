//! Boxes.
//!
//! A box has no markup of its own. It owns every child instance it has ever created (`views`),
//! and the most recent layout decides which of them are live (`active`). Inactive children are
//! hidden, not dropped, so they can come back later with their state and node intact.

use crate::decl::ViewFactory;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::layout::{Layout, LayoutKind};
use crate::params::Params;
use crate::view::{Component, Instance, Pass, UpdateOptions, View};
use indexmap::IndexMap;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// A component that selects which of its children are shown.
#[derive(Debug)]
pub struct BoxView {
    id: String,
    params: Params,
    key: Key,
    node: Option<NodeId>,
    /// Every instance created in this box, by key.
    views: HashMap<Key, Instance>,
    /// Child id -> key of the live instance, in layout order.
    active: IndexMap<String, Key>,
    visible: bool,
}

impl BoxView {
    pub fn new(id: impl Into<String>, params: Params) -> BoxView {
        let id = id.into();
        BoxView {
            key: Key::for_box(&id),
            id,
            params,
            node: None,
            views: HashMap::new(),
            active: IndexMap::new(),
            visible: false,
        }
    }

    /// Returns the key a child would have.
    fn child_key(
        factory: &dyn ViewFactory,
        id: &str,
        params: &Params,
        kind: LayoutKind,
    ) -> Result<Key> {
        match kind {
            LayoutKind::Box => Ok(Key::for_box(id)),
            LayoutKind::Leaf | LayoutKind::Async => factory.view_key(id, params),
        }
    }

    /// Returns the child instance for this slot, creating it if there is none with that key yet.
    pub fn resolve_child(
        &mut self,
        factory: &dyn ViewFactory,
        id: &str,
        params: &Params,
        kind: LayoutKind,
    ) -> Result<&mut Instance> {
        let key = Self::child_key(factory, id, params, kind)?;

        match self.views.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let instance = match kind {
                    LayoutKind::Box => Instance::Box(BoxView::new(id, params.clone())),
                    LayoutKind::Leaf => Instance::View(factory.create(id, params, false)?),
                    LayoutKind::Async => Instance::View(factory.create(id, params, true)?),
                };
                if instance.key() != entry.key() {
                    warn!("view factory created {} for {}", instance.key(), entry.key());
                    return Err(Error::KeyMismatch {
                        expected: entry.key().clone(),
                        found: instance.key().clone(),
                    });
                }
                trace!("{} creates {}", self.key, entry.key());
                Ok(entry.insert(instance))
            }
        }
    }

    /// Resolves every child of the layout, recursing into child boxes, and replaces the active set
    /// with the result.
    ///
    /// If anything fails, this box keeps its previous active set.
    pub fn apply_layout(
        &mut self,
        factory: &dyn ViewFactory,
        layout: &Layout,
        params: &Params,
    ) -> Result<()> {
        let mut active = IndexMap::with_capacity(layout.len());

        for (id, child_layout) in layout {
            let instance = self.resolve_child(factory, id, params, child_layout.kind)?;
            match &mut *instance {
                Instance::Box(child) => child.apply_layout(factory, &child_layout.views, params)?,
                Instance::View(view) => {
                    if !child_layout.views.is_empty() {
                        trace!(
                            "ignoring {} layout children of view {}",
                            child_layout.views.len(),
                            view.key()
                        );
                    }
                }
            }
            active.insert(id.clone(), instance.key().clone());
        }

        self.active = active;
        Ok(())
    }

    fn is_active(active: &IndexMap<String, Key>, instance: &Instance) -> bool {
        active.get(instance.id()) == Some(instance.key())
    }

    /// Hides every instance the current layout left out.
    fn hide_inactive(&mut self, pass: &mut Pass) -> Result<()> {
        let active = &self.active;
        for instance in self.views.values_mut() {
            if !Self::is_active(active, instance) {
                instance.hide(pass)?;
            }
        }
        Ok(())
    }

    /// Moves nodes of inactive instances out of the box’s previous node into the current one.
    fn transfer_inactive(&self, pass: &mut Pass, old_node: NodeId, node: NodeId) -> Result<()> {
        for instance in self.views.values() {
            if Self::is_active(&self.active, instance) {
                continue;
            }
            if let Some(view_node) = instance.node() {
                if pass.dom.contains(old_node, view_node) {
                    debug!("{} moves {} into its new node", self.key, instance.key());
                    pass.dom.append_child(node, view_node)?;
                }
            }
        }
        Ok(())
    }

    /// Puts the nodes of active children in layout order.
    ///
    /// Walks the visible child nodes and the active set side by side, moving a node into place
    /// whenever they disagree.
    fn order_nodes(&self, pass: &mut Pass, node: NodeId) -> Result<()> {
        let mut children = pass.dom.children(node);
        let mut pos = 0;

        for key in self.active.values() {
            let view_node = match self.views.get(key).and_then(|instance| instance.node()) {
                Some(view_node) => view_node,
                // async content that hasn’t arrived
                None => continue,
            };

            while pos < children.len()
                && !pass.dom.has_class(children[pos], &pass.config.visible_class)
            {
                pos += 1;
            }

            let cursor = children.get(pos).copied();
            if cursor == Some(view_node) {
                pos += 1;
                continue;
            }

            trace!("{} moves {} into position {}", self.key, key, pos);
            match cursor {
                Some(cursor) => pass.dom.insert_before(node, view_node, cursor)?,
                None => pass.dom.append_child(node, view_node)?,
            }

            // mirror the move in the local child list
            if let Some(i) = children.iter().position(|child| *child == view_node) {
                children.remove(i);
                if i < pos {
                    pos -= 1;
                }
            }
            if cursor.is_some() {
                children.insert(pos, view_node);
            } else {
                children.push(view_node);
                pos = children.len() - 1;
            }
            pos += 1;
        }

        Ok(())
    }

    /// Explicitly destroys a child instance, removing it from the active set as well.
    pub fn destroy(&mut self, key: &Key) -> Option<Instance> {
        let instance = self.views.remove(key)?;
        self.active.retain(|_, active_key| *active_key != *key);
        debug!("{} destroyed {}", self.key, key);
        Some(instance)
    }

    /// Hides the box and drops every instance it owns.
    pub fn teardown(&mut self, pass: &mut Pass) -> Result<()> {
        self.hide(pass)?;
        self.hide_inactive(pass)?;
        self.views.clear();
        self.active.clear();
        self.node = None;
        Ok(())
    }

    /// Returns the instance with the given key, active or not.
    pub fn view(&self, key: &Key) -> Option<&Instance> {
        self.views.get(key)
    }

    pub fn view_mut(&mut self, key: &Key) -> Option<&mut Instance> {
        self.views.get_mut(key)
    }

    /// Iterates over every instance owned by the box.
    pub fn views(&self) -> impl Iterator<Item = &Instance> {
        self.views.values()
    }

    /// Iterates over the active set as (child id, key), in layout order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &Key)> {
        self.active.iter().map(|(id, key)| (id.as_str(), key))
    }

    /// Returns the live instance for a child id.
    pub fn active_view(&self, id: &str) -> Option<&Instance> {
        self.active.get(id).and_then(|key| self.views.get(key))
    }

    pub fn active_view_mut(&mut self, id: &str) -> Option<&mut Instance> {
        let key = self.active.get(id)?;
        self.views.get_mut(key)
    }

    pub fn is_key_active(&self, key: &Key) -> bool {
        self.active.values().any(|active_key| active_key == key)
    }

    /// Calls `f` with every leaf view in this subtree, active or not.
    pub fn for_each_view_mut(&mut self, f: &mut dyn FnMut(&mut View)) {
        for instance in self.views.values_mut() {
            match instance {
                Instance::View(view) => f(view),
                Instance::Box(child) => child.for_each_view_mut(f),
            }
        }
    }
}

impl Component for BoxView {
    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &Key {
        &self.key
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn show(&mut self, pass: &mut Pass) -> Result<bool> {
        if self.visible {
            return Ok(false);
        }
        if let Some(node) = self.node {
            pass.mark_node(node, true)?;
        }
        self.visible = true;
        Ok(true)
    }

    fn hide(&mut self, pass: &mut Pass) -> Result<bool> {
        // descendants first, so nothing stays visible under a hidden box
        for key in self.active.values() {
            if let Some(instance) = self.views.get_mut(key) {
                instance.hide(pass)?;
            }
        }

        if !self.visible {
            return Ok(false);
        }
        if let Some(node) = self.node {
            pass.mark_node(node, false)?;
        }
        self.visible = false;
        Ok(true)
    }

    fn reconcile(
        &mut self,
        pass: &mut Pass,
        container: NodeId,
        options: UpdateOptions,
    ) -> Result<()> {
        let mut old_node = None;
        let mut replaced = false;
        if self.node.is_none() || !options.toplevel {
            if let Some(found) = pass.find_node(container, &self.id) {
                if self.node != Some(found) {
                    pass.mark_node(found, self.visible)?;
                    old_node = self.node.replace(found);
                    replaced = true;
                }
            }
        }
        let node = match self.node {
            Some(node) => node,
            None => {
                warn!("no node for box {} in rendered markup", self.key);
                return Err(Error::NodeNotFound {
                    id: self.id.clone(),
                });
            }
        };

        self.hide_inactive(pass)?;

        let child_options = UpdateOptions {
            toplevel: options.toplevel && !replaced,
        };
        let owned: Vec<(Key, NodeId)> = self
            .views
            .values()
            .filter_map(|instance| instance.node().map(|n| (instance.key().clone(), n)))
            .collect();
        let keys: Vec<Key> = self.active.values().cloned().collect();
        for key in keys {
            let instance = self
                .views
                .get_mut(&key)
                .ok_or_else(|| Error::MissingInstance(key.clone()))?;
            // a sibling’s node is never adopted, even if it carries the same view class
            let claimed: HashSet<NodeId> = owned
                .iter()
                .filter(|(owner, _)| *owner != key)
                .map(|(_, n)| *n)
                .collect();
            pass.set_claimed(claimed);
            instance.reconcile(pass, node, child_options)?;
        }
        pass.set_claimed(HashSet::new());

        if let Some(old_node) = old_node {
            self.transfer_inactive(pass, old_node, node)?;
        }

        self.order_nodes(pass, node)?;

        self.show(pass)?;
        Ok(())
    }

    fn descendants_and_self<'a>(&'a self, out: &mut Vec<&'a dyn Component>) {
        out.push(self);
        for key in self.active.values() {
            if let Some(instance) = self.views.get(key) {
                instance.descendants_and_self(out);
            }
        }
    }
}
