//! Identity keys.
//!
//! Two component instances are the same instance iff their keys are equal. A key looks like
//! `kind=id&name=value&...`, where only declared key parameters appear, sorted by name.

use crate::params::Params;
use core::borrow::Borrow;
use core::fmt;
use std::collections::BTreeMap;

/// What a key identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    View,
    Box,
    Model,
}

impl Kind {
    fn prefix(self) -> &'static str {
        match self {
            Kind::View => "view",
            Kind::Box => "box",
            Kind::Model => "model",
        }
    }
}

/// The identity string of a component instance or model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Builds a key from declared key parameters.
    ///
    /// Each parameter takes its value from `params`, falling back to the declared default;
    /// parameters without a non-empty value are left out.
    pub fn new(kind: Kind, id: &str, params: &Params, key_params: &KeyParams) -> Key {
        let mut key = String::with_capacity(id.len() + 8);
        key.push_str(kind.prefix());
        key.push('=');
        key.push_str(id);

        for (name, default) in &key_params.params {
            let value = params
                .get_truthy(name)
                .or_else(|| default.as_deref().filter(|value| !value.is_empty()));
            if let Some(value) = value {
                key.push('&');
                key.push_str(name);
                key.push('=');
                key.push_str(value);
            }
        }

        Key(key)
    }

    /// Boxes have a fixed identity and are never keyed by parameters.
    pub fn for_box(id: &str) -> Key {
        Key(format!("{}={}", Kind::Box.prefix(), id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Declared key parameters: names with optional default values.
///
/// Stored sorted by name so that key derivation never depends on declaration or insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyParams {
    params: BTreeMap<String, Option<String>>,
}

impl KeyParams {
    pub fn new() -> KeyParams {
        KeyParams::default()
    }

    /// Adds a key parameter without a default.
    pub fn param(mut self, name: impl Into<String>) -> KeyParams {
        self.params.insert(name.into(), None);
        self
    }

    /// Adds a key parameter with a default used when params don’t carry a value.
    pub fn param_or(mut self, name: impl Into<String>, default: impl Into<String>) -> KeyParams {
        self.params.insert(name.into(), Some(default.into()));
        self
    }

    /// Parameter names, in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_view_key() {
        let key_params = KeyParams::new().param("page").param_or("sort", "date").param("id");
        let params = Params::new().with("page", "3").with("id", "").with("extra", "x");

        assert_eq!(
            Key::new(Kind::View, "list", &params, &key_params).as_str(),
            "view=list&page=3&sort=date",
            "names sorted, defaults applied, empty and undeclared params skipped"
        );
        assert_eq!(
            Key::new(Kind::Model, "list", &Params::new(), &KeyParams::new()).as_str(),
            "model=list"
        );
    }

    #[test]
    fn test_box_key_ignores_params() {
        assert_eq!(Key::for_box("content").as_str(), "box=content");
    }

    #[test]
    fn test_declaration_order_irrelevant() {
        let a = KeyParams::new().param("b").param("a");
        let b = KeyParams::new().param("a").param("b");
        let params = Params::new().with("a", "1").with("b", "2");
        assert_eq!(
            Key::new(Kind::View, "v", &params, &a),
            Key::new(Kind::View, "v", &params, &b)
        );
    }

    proptest! {
        #[test]
        fn key_is_independent_of_param_order(
            pairs in prop::collection::vec(("[a-e]", "[a-z0-9]{0,3}"), 0..8)
        ) {
            let key_params = KeyParams::new().param("a").param("c").param_or("e", "dflt");

            let forward: Params = pairs.iter().cloned().collect();
            // later duplicates win in both, so dedupe before reversing
            let mut deduped = std::collections::HashMap::new();
            for (k, v) in &pairs {
                deduped.insert(k.clone(), v.clone());
            }
            let mut reversed: Vec<_> = deduped.into_iter().collect();
            reversed.reverse();
            let backward: Params = reversed.into_iter().collect();

            let k1 = Key::new(Kind::View, "v", &forward, &key_params);
            let k2 = Key::new(Kind::View, "v", &backward, &key_params);
            prop_assert_eq!(&k1, &k2);
            prop_assert_eq!(k1, Key::new(Kind::View, "v", &forward, &key_params));
        }
    }
}
