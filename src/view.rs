use crate::boxes::BoxView;
use crate::config::Config;
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::events::{LifecycleEvent, LifecycleKind};
use crate::key::Key;
use crate::params::Params;
use crossbeam::channel::Sender;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Options for one update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// False when an ancestor re-rendered its markup, so every component below it has to look up
    /// its node again in the fresh markup.
    pub toplevel: bool,
}

impl Default for UpdateOptions {
    fn default() -> UpdateOptions {
        UpdateOptions { toplevel: true }
    }
}

/// State shared by everything taking part in one reconciliation pass.
pub struct Pass<'a> {
    pub dom: &'a mut dyn Dom,
    pub config: &'a Config,
    events: Sender<LifecycleEvent>,
    /// Nodes owned by siblings of the component being reconciled.
    claimed: HashSet<NodeId>,
}

impl<'a> Pass<'a> {
    pub fn new(dom: &'a mut dyn Dom, config: &'a Config, events: Sender<LifecycleEvent>) -> Pass<'a> {
        Pass {
            dom,
            config,
            events,
            claimed: HashSet::new(),
        }
    }

    fn emit(&self, kind: LifecycleKind, id: &str, key: &Key) {
        let event = LifecycleEvent {
            kind,
            id: id.to_string(),
            key: key.clone(),
        };
        if self.events.send(event).is_err() {
            // nobody is listening
            trace!("dropped {:?} event for {}", kind, key);
        }
    }

    /// Puts the visibility markers of a node in the requested state.
    pub(crate) fn mark_node(&mut self, node: NodeId, visible: bool) -> Result<()> {
        let config = self.config;
        let (add, remove) = if visible {
            (&config.visible_class, &config.hidden_class)
        } else {
            (&config.hidden_class, &config.visible_class)
        };
        self.dom.remove_class(node, remove)?;
        self.dom.add_class(node, add)?;
        Ok(())
    }

    /// Sets the nodes that node lookups must pass over.
    pub(crate) fn set_claimed(&mut self, claimed: HashSet<NodeId>) {
        self.claimed = claimed;
    }

    /// Looks up a component’s node in freshly rendered markup, skipping nodes claimed by other
    /// instances.
    pub(crate) fn find_node(&self, container: NodeId, id: &str) -> Option<NodeId> {
        self.dom
            .find_all_by_class(container, &self.config.view_class(id))
            .into_iter()
            .find(|node| !self.claimed.contains(node))
    }
}

/// Capabilities shared by views and boxes.
pub trait Component {
    /// The declared component name.
    fn id(&self) -> &str;

    fn key(&self) -> &Key;

    fn params(&self) -> &Params;

    /// The backing node, if the component has been rendered.
    fn node(&self) -> Option<NodeId>;

    fn is_visible(&self) -> bool;

    /// Whether the component’s content is available. Polled, never awaited.
    fn is_ready(&self) -> bool;

    /// Shows the component. Returns false if it was already visible.
    fn show(&mut self, pass: &mut Pass) -> Result<bool>;

    /// Hides the component and everything active below it. Returns false if it was already
    /// hidden.
    fn hide(&mut self, pass: &mut Pass) -> Result<bool>;

    /// Aligns the component’s node (and, for boxes, its subtree) with its logical state.
    fn reconcile(&mut self, pass: &mut Pass, container: NodeId, options: UpdateOptions)
        -> Result<()>;

    /// Collects the component and all active descendants, depth-first.
    fn descendants_and_self<'a>(&'a self, out: &mut Vec<&'a dyn Component>);
}

/// Content readiness of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ready,
    /// Async content has not arrived yet.
    Loading,
}

/// A leaf component bound to one piece of data-driven markup.
#[derive(Debug)]
pub struct View {
    id: String,
    params: Params,
    key: Key,
    node: Option<NodeId>,
    visible: bool,
    is_async: bool,
    status: Status,
    models: Vec<String>,
}

impl View {
    /// Creates a view. Async views start out loading.
    pub fn new(id: impl Into<String>, params: Params, key: Key, is_async: bool) -> View {
        View {
            id: id.into(),
            params,
            key,
            node: None,
            visible: false,
            is_async,
            status: if is_async {
                Status::Loading
            } else {
                Status::Ready
            },
            models: Vec::new(),
        }
    }

    /// Sets the models the view’s content depends on.
    pub fn with_models(mut self, models: Vec<String>) -> View {
        self.models = models;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl Component for View {
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
        self.status == Status::Ready
    }

    fn show(&mut self, pass: &mut Pass) -> Result<bool> {
        if self.visible {
            return Ok(false);
        }
        if let Some(node) = self.node {
            pass.mark_node(node, true)?;
        }
        self.visible = true;
        pass.emit(LifecycleKind::Show, &self.id, &self.key);
        Ok(true)
    }

    fn hide(&mut self, pass: &mut Pass) -> Result<bool> {
        if !self.visible {
            return Ok(false);
        }
        if let Some(node) = self.node {
            pass.mark_node(node, false)?;
        }
        self.visible = false;
        pass.emit(LifecycleKind::Hide, &self.id, &self.key);
        Ok(true)
    }

    fn reconcile(
        &mut self,
        pass: &mut Pass,
        container: NodeId,
        options: UpdateOptions,
    ) -> Result<()> {
        if self.node.is_none() || !options.toplevel {
            if let Some(found) = pass.find_node(container, &self.id) {
                if self.node != Some(found) {
                    trace!("{} takes node {:?}", self.key, found);
                    // the fresh node gets the markers of the current state
                    pass.mark_node(found, self.visible)?;
                    self.node = Some(found);
                }
            }
        }

        if self.node.is_none() {
            if !self.is_ready() {
                trace!("{} is still loading", self.key);
                return Ok(());
            }
            warn!("no node for view {} in rendered markup", self.key);
            return Err(Error::NodeNotFound {
                id: self.id.clone(),
            });
        }

        self.show(pass)?;
        Ok(())
    }

    fn descendants_and_self<'a>(&'a self, out: &mut Vec<&'a dyn Component>) {
        out.push(self);
    }
}

/// A component instance owned by a box.
#[derive(Debug)]
pub enum Instance {
    View(View),
    Box(BoxView),
}

impl Instance {
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Instance::View(view) => Some(view),
            Instance::Box(_) => None,
        }
    }

    pub fn as_view_mut(&mut self) -> Option<&mut View> {
        match self {
            Instance::View(view) => Some(view),
            Instance::Box(_) => None,
        }
    }

    pub fn as_box(&self) -> Option<&BoxView> {
        match self {
            Instance::Box(b) => Some(b),
            Instance::View(_) => None,
        }
    }

    pub fn as_box_mut(&mut self) -> Option<&mut BoxView> {
        match self {
            Instance::Box(b) => Some(b),
            Instance::View(_) => None,
        }
    }

    fn component(&self) -> &dyn Component {
        match self {
            Instance::View(view) => view,
            Instance::Box(b) => b,
        }
    }

    fn component_mut(&mut self) -> &mut dyn Component {
        match self {
            Instance::View(view) => view,
            Instance::Box(b) => b,
        }
    }
}

impl Component for Instance {
    fn id(&self) -> &str {
        self.component().id()
    }

    fn key(&self) -> &Key {
        self.component().key()
    }

    fn params(&self) -> &Params {
        self.component().params()
    }

    fn node(&self) -> Option<NodeId> {
        self.component().node()
    }

    fn is_visible(&self) -> bool {
        self.component().is_visible()
    }

    fn is_ready(&self) -> bool {
        self.component().is_ready()
    }

    fn show(&mut self, pass: &mut Pass) -> Result<bool> {
        self.component_mut().show(pass)
    }

    fn hide(&mut self, pass: &mut Pass) -> Result<bool> {
        self.component_mut().hide(pass)
    }

    fn reconcile(
        &mut self,
        pass: &mut Pass,
        container: NodeId,
        options: UpdateOptions,
    ) -> Result<()> {
        self.component_mut().reconcile(pass, container, options)
    }

    fn descendants_and_self<'a>(&'a self, out: &mut Vec<&'a dyn Component>) {
        self.component().descendants_and_self(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Markup, MemoryDom};
    use crate::key::{KeyParams, Kind};
    use crossbeam::channel;

    fn view(id: &str, is_async: bool) -> View {
        let key = Key::new(Kind::View, id, &Params::new(), &KeyParams::new());
        View::new(id, Params::new(), key, is_async)
    }

    #[test]
    fn test_show_hide_idempotent() {
        let mut dom = MemoryDom::new();
        let container = dom.render(&Markup::div().child(Markup::div().class("ns-view-a")));
        let config = Config::default();
        let (send, recv) = channel::unbounded();
        let mut pass = Pass::new(&mut dom, &config, send);

        let mut a = view("a", false);
        a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        assert!(a.is_visible());
        assert_eq!(a.show(&mut pass).unwrap(), false, "second show is a no-op");
        assert_eq!(a.hide(&mut pass).unwrap(), true);
        assert_eq!(a.hide(&mut pass).unwrap(), false, "second hide is a no-op");
        drop(pass);

        let node = a.node().unwrap();
        assert!(dom.has_class(node, "ns-view-hidden"));
        assert!(!dom.has_class(node, "ns-view-visible"));
        let kinds: Vec<_> = recv.try_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [LifecycleKind::Show, LifecycleKind::Hide]);
    }

    #[test]
    fn test_missing_node_is_fatal() {
        let mut dom = MemoryDom::new();
        let container = dom.render(&Markup::div());
        let config = Config::default();
        let (send, _recv) = channel::unbounded();
        let mut pass = Pass::new(&mut dom, &config, send);

        let mut a = view("a", false);
        match a.reconcile(&mut pass, container, UpdateOptions::default()) {
            Err(Error::NodeNotFound { id }) => assert_eq!(id, "a"),
            other => panic!("expected NodeNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_async_view_waits_for_node() {
        let mut dom = MemoryDom::new();
        let container = dom.render(&Markup::div());
        let config = Config::default();
        let (send, _recv) = channel::unbounded();

        let mut a = view("a", true);
        {
            let mut pass = Pass::new(&mut dom, &config, send.clone());
            a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        }
        assert_eq!(a.node(), None);
        assert!(!a.is_visible());

        a.set_status(Status::Ready);
        dom.set_children(container, &[Markup::div().class("ns-view-a")]).unwrap();
        let mut pass = Pass::new(&mut dom, &config, send);
        a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        assert!(a.node().is_some());
        assert!(a.is_visible());
    }

    #[test]
    fn test_rerendered_node_keeps_visibility() {
        let mut dom = MemoryDom::new();
        let container = dom.render(&Markup::div().child(Markup::div().class("ns-view-a")));
        let config = Config::default();
        let (send, _recv) = channel::unbounded();

        let mut a = view("a", false);
        {
            let mut pass = Pass::new(&mut dom, &config, send.clone());
            a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        }
        let old = a.node().unwrap();

        dom.set_children(container, &[Markup::div().class("ns-view-a")]).unwrap();
        {
            let mut pass = Pass::new(&mut dom, &config, send.clone());
            a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        }
        assert_eq!(a.node(), Some(old), "toplevel views keep their node");

        let mut pass = Pass::new(&mut dom, &config, send);
        a.reconcile(&mut pass, container, UpdateOptions { toplevel: false })
            .unwrap();
        drop(pass);
        let new = a.node().unwrap();
        assert_ne!(new, old);
        assert!(dom.has_class(new, "ns-view-visible"));
    }

    #[test]
    fn test_claimed_nodes_are_skipped() {
        let mut dom = MemoryDom::new();
        let container = dom.render(
            &Markup::div()
                .child(Markup::div().class("ns-view-a"))
                .child(Markup::div().class("ns-view-a")),
        );
        let children = dom.children(container);
        let config = Config::default();
        let (send, _recv) = channel::unbounded();
        let mut pass = Pass::new(&mut dom, &config, send);

        pass.set_claimed([children[0]].into_iter().collect());
        let mut a = view("a", false);
        a.reconcile(&mut pass, container, UpdateOptions::default()).unwrap();
        assert_eq!(a.node(), Some(children[1]));

        pass.set_claimed(children.iter().copied().collect());
        let mut other = view("a", false);
        assert!(matches!(
            other.reconcile(&mut pass, container, UpdateOptions::default()),
            Err(Error::NodeNotFound { .. })
        ));
    }
}
