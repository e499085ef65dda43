//! The model cache.
//!
//! Data for views lives in models, which are cached per model id and key. A cached model goes
//! stale once it is older than its declared maximum age.

use crate::error::{Error, Result};
use crate::key::{Key, KeyParams, Kind};
use crate::params::Params;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Declaration of a model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub id: String,
    pub key_params: KeyParams,
    /// After this long, a cached model counts as stale. `None` means never.
    pub max_age: Option<Duration>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> ModelInfo {
        ModelInfo {
            id: id.into(),
            key_params: KeyParams::new(),
            max_age: None,
        }
    }

    pub fn key_params(mut self, key_params: KeyParams) -> ModelInfo {
        self.key_params = key_params;
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> ModelInfo {
        self.max_age = Some(max_age);
        self
    }
}

/// A model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Model<D> {
    pub id: String,
    pub key: Key,
    pub params: Params,
    pub data: Option<D>,
    pub max_age: Option<Duration>,
}

impl<D> Model<D> {
    pub fn set_data(&mut self, data: D) {
        self.data = Some(data);
    }
}

/// A cache entry.
#[derive(Debug, Clone)]
pub struct CacheItem<D> {
    pub model: Model<D>,
    pub timestamp: Instant,
}

impl<D> CacheItem<D> {
    /// Whether the entry is still valid at `now`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        match self.model.max_age {
            Some(max_age) => now.saturating_duration_since(self.timestamp) <= max_age,
            None => true,
        }
    }
}

/// Models, by id and key.
#[derive(Debug)]
pub struct ModelCache<D> {
    infos: HashMap<String, ModelInfo>,
    items: HashMap<String, HashMap<Key, CacheItem<D>>>,
}

impl<D> Default for ModelCache<D> {
    fn default() -> Self {
        ModelCache {
            infos: HashMap::new(),
            items: HashMap::new(),
        }
    }
}

impl<D> ModelCache<D> {
    pub fn new() -> ModelCache<D> {
        ModelCache::default()
    }

    pub fn register(&mut self, info: ModelInfo) {
        self.items.entry(info.id.clone()).or_default();
        self.infos.insert(info.id.clone(), info);
    }

    pub fn info(&self, id: &str) -> Result<&ModelInfo> {
        self.infos
            .get(id)
            .ok_or_else(|| Error::UnknownModel(id.to_string()))
    }

    pub fn key(&self, id: &str, params: &Params) -> Result<Key> {
        let info = self.info(id)?;
        Ok(Key::new(Kind::Model, id, params, &info.key_params))
    }

    /// Creates a model (without caching it).
    pub fn create(&self, id: &str, params: &Params, data: Option<D>) -> Result<Model<D>> {
        let info = self.info(id)?;
        Ok(Model {
            id: id.to_string(),
            key: Key::new(Kind::Model, id, params, &info.key_params),
            params: params.clone(),
            data,
            max_age: info.max_age,
        })
    }

    pub fn get_raw(&self, id: &str, key: &Key) -> Option<&CacheItem<D>> {
        self.items.get(id).and_then(|items| items.get(key))
    }

    pub fn get(&self, id: &str, key: &Key) -> Option<&Model<D>> {
        self.get_raw(id, key).map(|item| &item.model)
    }

    /// `None` if nothing is cached, `Some(false)` if the cached model is stale.
    pub fn is_cached_at(&self, id: &str, key: &Key, now: Instant) -> Option<bool> {
        self.get_raw(id, key).map(|item| item.is_fresh_at(now))
    }

    pub fn is_cached(&self, id: &str, key: &Key) -> Option<bool> {
        self.is_cached_at(id, key, Instant::now())
    }

    pub fn is_fresh_at(&self, id: &str, key: &Key, now: Instant) -> bool {
        self.is_cached_at(id, key, now).unwrap_or(false)
    }

    pub fn is_fresh(&self, id: &str, key: &Key) -> bool {
        self.is_fresh_at(id, key, Instant::now())
    }

    /// Caches a model, stamped now.
    pub fn set(&mut self, model: Model<D>) -> Result<()> {
        self.set_at(model, Instant::now())
    }

    /// Caches a model with the given timestamp.
    ///
    /// An existing entry keeps its model object; its data is replaced and its timestamp bumped.
    pub fn set_at(&mut self, model: Model<D>, timestamp: Instant) -> Result<()> {
        let items = self
            .items
            .get_mut(&model.id)
            .ok_or_else(|| Error::UnknownModel(model.id.clone()))?;

        match items.get_mut(&model.key) {
            Some(cached) => {
                if let Some(data) = model.data {
                    cached.model.set_data(data);
                }
                cached.timestamp = timestamp;
            }
            None => {
                items.insert(model.key.clone(), CacheItem { model, timestamp });
            }
        }
        Ok(())
    }

    pub fn destroy(&mut self, id: &str, key: &Key) -> Option<Model<D>> {
        self.items
            .get_mut(id)
            .and_then(|items| items.remove(key))
            .map(|item| item.model)
    }

    /// Drops every cached model with this id.
    pub fn clear(&mut self, id: &str) {
        if let Some(items) = self.items.get_mut(id) {
            items.clear();
        }
    }

    /// Drops cached models with this id for which `condition` holds.
    pub fn clear_where<F>(&mut self, id: &str, mut condition: F)
    where
        F: FnMut(&Model<D>) -> bool,
    {
        if let Some(items) = self.items.get_mut(id) {
            items.retain(|_, item| !condition(&item.model));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ModelCache<String> {
        let mut cache = ModelCache::new();
        cache.register(
            ModelInfo::new("photo")
                .key_params(KeyParams::new().param("id"))
                .max_age(Duration::from_millis(1000)),
        );
        cache.register(ModelInfo::new("settings"));
        cache
    }

    #[test]
    fn test_ttl_boundary() {
        let mut cache = cache();
        let params = Params::new().with("id", "1");
        let model = cache.create("photo", &params, Some("data".into())).unwrap();
        let key = model.key.clone();
        let stored = Instant::now();
        cache.set_at(model, stored).unwrap();

        assert!(cache.is_fresh_at("photo", &key, stored + Duration::from_millis(999)));
        assert!(cache.is_fresh_at("photo", &key, stored + Duration::from_millis(1000)));
        assert!(!cache.is_fresh_at("photo", &key, stored + Duration::from_millis(1001)));
        assert_eq!(
            cache.is_cached_at("photo", &key, stored + Duration::from_millis(1001)),
            Some(false)
        );
    }

    #[test]
    fn test_no_max_age_never_stale() {
        let mut cache = cache();
        let model = cache.create("settings", &Params::new(), Some("x".into())).unwrap();
        let key = model.key.clone();
        let stored = Instant::now();
        cache.set_at(model, stored).unwrap();
        assert!(cache.is_fresh_at("settings", &key, stored + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_missing_entry() {
        let cache = cache();
        let key = cache.key("photo", &Params::new().with("id", "2")).unwrap();
        assert_eq!(key.as_str(), "model=photo&id=2");
        assert_eq!(cache.is_cached("photo", &key), None);
        assert!(!cache.is_fresh("photo", &key));
        assert!(cache.get("photo", &key).is_none());
    }

    #[test]
    fn test_refresh_existing_entry() {
        let mut cache = cache();
        let params = Params::new().with("id", "1");
        let stored = Instant::now();
        let old = cache.create("photo", &params, Some("old".into())).unwrap();
        cache.set_at(old, stored).unwrap();

        let later = stored + Duration::from_millis(900);
        let new = cache.create("photo", &params, Some("new".into())).unwrap();
        cache.set_at(new, later).unwrap();

        let key = cache.key("photo", &params).unwrap();
        let item = cache.get_raw("photo", &key).unwrap();
        assert_eq!(item.model.data.as_deref(), Some("new"));
        assert_eq!(item.timestamp, later);
        assert!(cache.is_fresh_at("photo", &key, stored + Duration::from_millis(1500)));
    }

    #[test]
    fn test_unknown_model() {
        let mut cache = cache();
        assert!(matches!(cache.key("nope", &Params::new()), Err(Error::UnknownModel(_))));
        let model = Model {
            id: "nope".into(),
            key: Key::new(Kind::Model, "nope", &Params::new(), &KeyParams::new()),
            params: Params::new(),
            data: Some(String::new()),
            max_age: None,
        };
        assert!(matches!(cache.set(model), Err(Error::UnknownModel(_))));
    }

    #[test]
    fn test_destroy_and_clear() {
        let mut cache = cache();
        for id in &["1", "2", "3"] {
            let model = cache
                .create("photo", &Params::new().with("id", *id), Some(id.to_string()))
                .unwrap();
            cache.set(model).unwrap();
        }
        let key_params = KeyParams::new().param("id");
        let key = |id: &str| Key::new(Kind::Model, "photo", &Params::new().with("id", id), &key_params);

        assert_eq!(cache.destroy("photo", &key("1")).unwrap().data.as_deref(), Some("1"));
        cache.clear_where("photo", |model| model.data.as_deref() == Some("2"));
        assert!(cache.get("photo", &key("2")).is_none());
        assert!(cache.get("photo", &key("3")).is_some());
        cache.clear("photo");
        assert!(cache.get("photo", &key("3")).is_none());
    }
}
