//! EnvironmentMap value object
//! Immutable key/value environment handed to child processes

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Environment variables for a child process
///
/// Keys are unique; ordering carries no meaning. Once built the map is never
/// mutated: overlaying produces a new map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentMap(HashMap<String, String>);

impl EnvironmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return a new map where `fixed` entries take precedence over ours
    pub fn overlay<I, K, V>(&self, fixed: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = self.0.clone();
        for (key, value) in fixed {
            merged.insert(key.into(), value.into());
        }
        Self(merged)
    }

    /// Entries sorted by key, for stable display
    pub fn sorted(&self) -> BTreeMap<&str, &str> {
        self.iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for EnvironmentMap {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}
