//! AnnotationBoundary - range-annotation declarations at a cursor position.
//!
//! Annotations are out-of-band metadata painted over spans of items. A
//! boundary marks, at one position, which annotation keys stop changing
//! (ends) and which start changing (changes, with old and new values).
//! Annotation values are nullable, so values are `Option<String>`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single annotation-key change declared at a boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Declarations at one cursor position: an ordered list of ended keys and
/// an ordered list of changed keys. The two lists are disjoint and each is
/// sorted with unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBoundary {
    ends: Vec<String>,
    changes: Vec<AnnotationChange>,
}

/// What a boundary declares for one key.
enum Declaration {
    End,
    Change(Option<String>, Option<String>),
}

impl AnnotationBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a boundary from end keys and change triples. A later
    /// declaration for the same key overrides an earlier one.
    pub fn from_parts<I, C>(ends: I, changes: C) -> Self
    where
        I: IntoIterator<Item = String>,
        C: IntoIterator<Item = AnnotationChange>,
    {
        let mut map: BTreeMap<String, Declaration> = BTreeMap::new();
        for key in ends {
            map.insert(key, Declaration::End);
        }
        for change in changes {
            map.insert(change.key, Declaration::Change(change.old, change.new));
        }
        Self::from_declarations(map)
    }

    /// Declare a key ended at this boundary.
    pub fn with_end(self, key: impl Into<String>) -> Self {
        let mut map = self.into_declarations();
        map.insert(key.into(), Declaration::End);
        Self::from_declarations(map)
    }

    /// Declare a key changing from `old` to `new` at this boundary.
    pub fn with_change(
        self,
        key: impl Into<String>,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Self {
        let mut map = self.into_declarations();
        map.insert(
            key.into(),
            Declaration::Change(old.map(str::to_string), new.map(str::to_string)),
        );
        Self::from_declarations(map)
    }

    pub fn ends(&self) -> impl Iterator<Item = &str> {
        self.ends.iter().map(String::as_str)
    }

    pub fn changes(&self) -> impl Iterator<Item = &AnnotationChange> {
        self.changes.iter()
    }

    pub fn end_size(&self) -> usize {
        self.ends.len()
    }

    pub fn change_size(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty() && self.changes.is_empty()
    }

    /// Compose two boundaries declared at the same position. Declarations
    /// in `later` override declarations for the same key in `self`.
    pub fn compose_with(&self, later: &AnnotationBoundary) -> AnnotationBoundary {
        let mut map = self.clone().into_declarations();
        for (key, declaration) in later.clone().into_declarations() {
            map.insert(key, declaration);
        }
        Self::from_declarations(map)
    }

    fn into_declarations(self) -> BTreeMap<String, Declaration> {
        let mut map = BTreeMap::new();
        for key in self.ends {
            map.insert(key, Declaration::End);
        }
        for change in self.changes {
            map.insert(change.key, Declaration::Change(change.old, change.new));
        }
        map
    }

    fn from_declarations(map: BTreeMap<String, Declaration>) -> Self {
        let mut ends = Vec::new();
        let mut changes = Vec::new();
        for (key, declaration) in map {
            match declaration {
                Declaration::End => ends.push(key),
                Declaration::Change(old, new) => changes.push(AnnotationChange { key, old, new }),
            }
        }
        Self { ends, changes }
    }
}
