//! Component declarations.
//!
//! Every leaf view used in a layout must be declared up front. The declaration table is built once
//! and never changes afterwards; boxes need no declaration.

use crate::error::{Error, Result};
use crate::events::{LifecycleEvent, LifecycleHandler, LifecycleKind};
use crate::key::{Key, KeyParams, Kind};
use crate::params::Params;
use crate::view::View;
use std::collections::HashMap;

/// Construction metadata of a view.
#[derive(Debug, Clone, Default)]
pub struct ViewInfo {
    key_params: KeyParams,
    models: Vec<String>,
    handlers: Vec<(LifecycleKind, LifecycleHandler)>,
}

impl ViewInfo {
    pub fn new() -> ViewInfo {
        ViewInfo::default()
    }

    /// Sets the parameters that make up the view’s identity.
    pub fn key_params(mut self, key_params: KeyParams) -> ViewInfo {
        self.key_params = key_params;
        self
    }

    /// Declares a model the view’s content depends on.
    pub fn model(mut self, id: impl Into<String>) -> ViewInfo {
        self.models.push(id.into());
        self
    }

    /// Adds a lifecycle handler.
    pub fn on<F>(mut self, kind: LifecycleKind, handler: F) -> ViewInfo
    where
        F: 'static + FnMut(&LifecycleEvent) + Send,
    {
        self.handlers.push((kind, LifecycleHandler::new(handler)));
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub(crate) fn handlers(&self, kind: LifecycleKind) -> impl Iterator<Item = &LifecycleHandler> {
        self.handlers
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, handler)| handler)
    }
}

/// Constructs leaf views for the engine.
pub trait ViewFactory {
    /// Returns the key a view with these parameters would have.
    fn view_key(&self, id: &str, params: &Params) -> Result<Key>;

    /// Creates a new view.
    fn create(&self, id: &str, params: &Params, is_async: bool) -> Result<View>;
}

/// The declaration table.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    views: HashMap<String, ViewInfo>,
}

impl Declarations {
    pub fn builder() -> DeclarationsBuilder {
        DeclarationsBuilder {
            views: HashMap::new(),
        }
    }

    pub fn info(&self, id: &str) -> Result<&ViewInfo> {
        self.views
            .get(id)
            .ok_or_else(|| Error::UnknownView(id.to_string()))
    }

    /// Calls the handlers declared for the event’s view.
    pub fn dispatch(&self, event: &LifecycleEvent) {
        if let Some(info) = self.views.get(&event.id) {
            for handler in info.handlers(event.kind) {
                handler.call(event);
            }
        }
    }
}

impl ViewFactory for Declarations {
    fn view_key(&self, id: &str, params: &Params) -> Result<Key> {
        let info = self.info(id)?;
        Ok(Key::new(Kind::View, id, params, &info.key_params))
    }

    fn create(&self, id: &str, params: &Params, is_async: bool) -> Result<View> {
        let info = self.info(id)?;
        let key = Key::new(Kind::View, id, params, &info.key_params);
        Ok(View::new(id, params.clone(), key, is_async).with_models(info.models.clone()))
    }
}

/// Collects declarations; see [`Declarations::builder`].
#[derive(Debug)]
pub struct DeclarationsBuilder {
    views: HashMap<String, ViewInfo>,
}

impl DeclarationsBuilder {
    pub fn view(mut self, id: impl Into<String>, info: ViewInfo) -> DeclarationsBuilder {
        self.views.insert(id.into(), info);
        self
    }

    pub fn build(self) -> Declarations {
        Declarations { views: self.views }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Component;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_unknown_view() {
        let decls = Declarations::builder().view("a", ViewInfo::new()).build();
        assert!(decls.create("a", &Params::new(), false).is_ok());
        match decls.create("nope", &Params::new(), false) {
            Err(Error::UnknownView(id)) => assert_eq!(id, "nope"),
            other => panic!("expected UnknownView, got {:?}", other),
        }
    }

    #[test]
    fn test_created_view_carries_declaration() {
        let decls = Declarations::builder()
            .view(
                "photo",
                ViewInfo::new()
                    .key_params(KeyParams::new().param("id"))
                    .model("photo"),
            )
            .build();
        let params = Params::new().with("id", "7").with("page", "2");

        let view = decls.create("photo", &params, true).unwrap();
        assert_eq!(view.key().as_str(), "view=photo&id=7");
        assert_eq!(view.models(), ["photo".to_string()]);
        assert!(view.is_async());
        assert_eq!(decls.view_key("photo", &params).unwrap(), *view.key());
    }

    #[test]
    fn test_dispatch_by_kind() {
        let hidden = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hidden);
        let decls = Declarations::builder()
            .view(
                "a",
                ViewInfo::new().on(LifecycleKind::Hide, move |_| *counter.lock() += 1),
            )
            .build();

        let mut event = LifecycleEvent {
            kind: LifecycleKind::Show,
            id: "a".into(),
            key: decls.view_key("a", &Params::new()).unwrap(),
        };
        decls.dispatch(&event);
        event.kind = LifecycleKind::Hide;
        decls.dispatch(&event);
        event.id = "b".into();
        decls.dispatch(&event);

        assert_eq!(*hidden.lock(), 1);
    }
}
