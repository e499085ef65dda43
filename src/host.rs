use crate::boxes::BoxView;
use crate::config::Config;
use crate::decl::Declarations;
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::events::LifecycleEvent;
use crate::layout::{LayoutKind, LayoutNode};
use crate::model::ModelCache;
use crate::params::Params;
use crate::view::{Component, Pass, Status, UpdateOptions, View};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

/// Connects a tree of boxes and views to a render target.
///
/// Updates run to completion one at a time: `update` takes `&mut self`.
pub struct Nest {
    root: BoxView,
    declarations: Declarations,
    config: Config,
    event_send: Sender<LifecycleEvent>,
    event_recv: Receiver<LifecycleEvent>,
    dispatch: bool,
}

impl Nest {
    /// Creates a new Nest around a root box.
    ///
    /// Nothing is rendered until the first `update`.
    pub fn new(root_id: impl Into<String>, declarations: Declarations) -> Nest {
        Nest::with_config(root_id, declarations, Config::default())
    }

    pub fn with_config(
        root_id: impl Into<String>,
        declarations: Declarations,
        config: Config,
    ) -> Nest {
        let (event_send, event_recv) = channel::unbounded();

        Nest {
            root: BoxView::new(root_id, Params::new()),
            declarations,
            config,
            event_send,
            event_recv,
            dispatch: true,
        }
    }

    /// If false, lifecycle events are left in the queue for [`Nest::take_events`] instead of
    /// being dispatched to declared handlers after each update.
    pub fn set_dispatch(&mut self, dispatch: bool) {
        self.dispatch = dispatch;
    }

    pub fn root(&self) -> &BoxView {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut BoxView {
        &mut self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// Brings the tree in line with a new layout.
    ///
    /// `layout` must be a box layout for the root box. The root box resolves the whole layout first; then the DOM is reconciled below
    /// `container`, where the root box’s node must be found. Lifecycle events collected during the
    /// pass are dispatched afterwards, even if the pass failed part way, since DOM changes
    /// are never rolled back.
    pub fn update(
        &mut self,
        dom: &mut dyn Dom,
        container: NodeId,
        layout: &LayoutNode,
        params: &Params,
        options: UpdateOptions,
    ) -> Result<()> {
        debug!(
            "updating {} with {} layout children, params {}",
            self.root.key(),
            layout.views.len(),
            params
        );

        if layout.kind != LayoutKind::Box || layout.id != self.root.id() {
            warn!("layout {} doesn’t describe {}", layout.id, self.root.key());
            return Err(Error::RootMismatch {
                expected: self.root.id().to_string(),
                found: layout.id.clone(),
            });
        }

        self.root
            .apply_layout(&self.declarations, &layout.views, params)?;

        let result = {
            let mut pass = Pass::new(dom, &self.config, self.event_send.clone());
            self.root.reconcile(&mut pass, container, options)
        };

        if self.dispatch {
            self.dispatch_events();
        }
        result
    }

    /// Returns the next queued lifecycle event, if any.
    pub fn poll_event(&self) -> Option<LifecycleEvent> {
        match self.event_recv.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains the lifecycle event queue.
    pub fn take_events(&self) -> Vec<LifecycleEvent> {
        self.event_recv.try_iter().collect()
    }

    /// Dispatches queued events to declared handlers. Returns how many were dispatched.
    pub fn dispatch_events(&self) -> usize {
        let mut count = 0;
        while let Some(event) = self.poll_event() {
            self.declarations.dispatch(&event);
            count += 1;
        }
        count
    }

    /// Marks loading async views ready once every model they depend on is fresh.
    ///
    /// Returns the number of views that became ready. They pick up their nodes on the next
    /// update that includes them.
    pub fn resolve_async<D>(&mut self, models: &ModelCache<D>) -> usize {
        let mut resolved = 0;
        self.root.for_each_view_mut(&mut |view: &mut View| {
            if view.status() != Status::Loading {
                return;
            }
            let fresh = view.models().iter().all(|id| {
                models
                    .key(id, view.params())
                    .map(|key| models.is_fresh(id, &key))
                    .unwrap_or(false)
            });
            if fresh {
                debug!("{} is ready", view.key());
                view.set_status(Status::Ready);
                resolved += 1;
            }
        });
        resolved
    }
}
