//! AttributesUpdate - an ordered diff over an attribute map.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single attribute change: old value (or absent) to new value (or absent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTriple {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// An immutable ordered sequence of attribute-change triples.
///
/// Keys are unique and kept in sorted order. An absent old value means the
/// key did not exist before; an absent new value means the key is removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesUpdate {
    triples: Vec<AttributeTriple>,
}

impl AttributesUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from (key, old, new) triples. Later duplicates win.
    pub fn from_triples<K, V, I>(triples: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, Option<V>, Option<V>)>,
    {
        let map: BTreeMap<String, (Option<String>, Option<String>)> = triples
            .into_iter()
            .map(|(k, old, new)| (k.into(), (old.map(Into::into), new.map(Into::into))))
            .collect();
        Self {
            triples: map
                .into_iter()
                .map(|(key, (old, new))| AttributeTriple { key, old, new })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeTriple> {
        self.triples.iter()
    }

    /// The triple for a key, if this update touches it.
    pub fn change_for(&self, key: &str) -> Option<&AttributeTriple> {
        self.triples
            .binary_search_by(|t| t.key.as_str().cmp(key))
            .ok()
            .map(|i| &self.triples[i])
    }

    /// The set of keys this update touches.
    pub fn keys(&self) -> BTreeSet<String> {
        self.triples.iter().map(|t| t.key.clone()).collect()
    }

    pub fn change_size(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Merge two sequential diffs into one.
    ///
    /// For a key in both, the old value comes from `self` and the new value
    /// from `later`; keys in only one update pass through.
    pub fn compose_with(&self, later: &AttributesUpdate) -> AttributesUpdate {
        let mut map: BTreeMap<String, (Option<String>, Option<String>)> = self
            .triples
            .iter()
            .map(|t| (t.key.clone(), (t.old.clone(), t.new.clone())))
            .collect();
        for triple in &later.triples {
            match map.get_mut(&triple.key) {
                Some(entry) => entry.1 = triple.new.clone(),
                None => {
                    map.insert(triple.key.clone(), (triple.old.clone(), triple.new.clone()));
                }
            }
        }
        AttributesUpdate {
            triples: map
                .into_iter()
                .map(|(key, (old, new))| AttributeTriple { key, old, new })
                .collect(),
        }
    }

    /// Drop every triple whose key is in `keys`.
    pub fn exclude(&self, keys: &BTreeSet<String>) -> AttributesUpdate {
        AttributesUpdate {
            triples: self
                .triples
                .iter()
                .filter(|t| !keys.contains(&t.key))
                .cloned()
                .collect(),
        }
    }
}
