use core::fmt;
use std::collections::HashMap;
use std::iter::FromIterator;

/// Parameters of a component or model.
///
/// Values are strings; an empty string counts as absent when building keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    /// Adds a parameter, builder-style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Params {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value only if it is present and non-empty.
    pub fn get_truthy(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Params {
        Params {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        write!(f, "{{")?;
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, self.values[name])?;
        }
        write!(f, "}}")
    }
}

#[test]
fn test_truthy_params() {
    let params = Params::new().with("page", "2").with("filter", "");
    assert_eq!(params.get_truthy("page"), Some("2"));
    assert_eq!(params.get("filter"), Some(""));
    assert_eq!(params.get_truthy("filter"), None, "empty values are not truthy");
    assert_eq!(params.get_truthy("missing"), None);
    assert_eq!(params.to_string(), "{filter=, page=2}");
}
