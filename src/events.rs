//! Lifecycle events.

use crate::key::Key;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;

/// Visibility transitions of a view.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleKind {
    Show = 0,
    Hide = 1,
}

/// A view was shown or hidden during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub id: String,
    pub key: Key,
}

/// A lifecycle event handler.
#[derive(Clone)]
pub struct LifecycleHandler(Arc<Mutex<dyn FnMut(&LifecycleEvent) + Send>>);

impl LifecycleHandler {
    pub fn new<F>(handler: F) -> LifecycleHandler
    where
        F: 'static + FnMut(&LifecycleEvent) + Send,
    {
        LifecycleHandler(Arc::new(Mutex::new(handler)))
    }

    pub fn call(&self, event: &LifecycleEvent) {
        let mut handler = self.0.lock();
        (*handler)(event)
    }
}

impl fmt::Debug for LifecycleHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LifecycleHandler")
    }
}

#[test]
fn test_handler_is_shared_between_clones() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = LifecycleHandler::new(move |event: &LifecycleEvent| {
        sink.lock().push(event.kind);
    });
    let clone = handler.clone();

    let event = LifecycleEvent {
        kind: LifecycleKind::Hide,
        id: "a".into(),
        key: Key::new(
            crate::key::Kind::View,
            "a",
            &crate::params::Params::new(),
            &crate::key::KeyParams::new(),
        ),
    };
    handler.call(&event);
    clone.call(&event);

    assert_eq!(*seen.lock(), vec![LifecycleKind::Hide, LifecycleKind::Hide]);
}
