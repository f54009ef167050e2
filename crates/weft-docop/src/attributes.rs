//! Attributes - the immutable key/value map carried by a document item.

use crate::update::AttributesUpdate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable sorted mapping from attribute names to values.
///
/// Keys are unique; iteration order is key order. All mutating-looking
/// operations return a new value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, String>,
}

impl Attributes {
    /// An empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an attribute map from key/value pairs. Later duplicates win.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a diff to this attribute map, producing the updated map.
    ///
    /// For each triple in the update, the key is set to the new value when
    /// present and removed when absent. The old values in the update describe
    /// the expected pre-state and are not enforced here.
    pub fn updated_with(&self, update: &AttributesUpdate) -> Attributes {
        let mut entries = self.entries.clone();
        for triple in update.iter() {
            match &triple.new {
                Some(value) => {
                    entries.insert(triple.key.clone(), value.clone());
                }
                None => {
                    entries.remove(&triple.key);
                }
            }
        }
        Attributes { entries }
    }
}
