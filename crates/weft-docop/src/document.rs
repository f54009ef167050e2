//! Document - a flat attributed-span view that operations apply to.
//!
//! The transform engine itself never touches a document; this view exists
//! so callers (and the convergence tests) can check that transformed pairs
//! actually converge. Each item carries an attribute map plus the
//! annotation values painted over it so far.

use crate::annotation::AnnotationBoundary;
use crate::attributes::Attributes;
use crate::component::Component;
use crate::operation::DocOp;
use crate::update::AttributesUpdate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur when applying an operation to a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    #[error("operation spans {op} items but document has {doc}")]
    SpanMismatch { op: usize, doc: usize },

    #[error("content-bearing component {0} cannot apply to an attributed span")]
    ContentComponent(&'static str),

    #[error("attribute mismatch at item {index}: expected {expected}, found {found}")]
    AttributeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("annotation key {0} still open at end of operation")]
    UnclosedAnnotation(String),
}

pub type Result<T> = std::result::Result<T, DocError>;

/// One item of the document: an attribute map plus painted annotations.
///
/// An annotation explicitly painted with a null value (`None`) is distinct
/// from one never painted at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub attributes: Attributes,
    pub annotations: BTreeMap<String, Option<String>>,
}

/// A sequence of attributed items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    items: Vec<Item>,
}

impl Document {
    /// A document of `len` items with empty attributes.
    pub fn with_len(len: usize) -> Self {
        Self {
            items: vec![Item::default(); len],
        }
    }

    /// A document built from per-item attribute maps.
    pub fn from_attributes<I: IntoIterator<Item = Attributes>>(attrs: I) -> Self {
        Self {
            items: attrs
                .into_iter()
                .map(|attributes| Item {
                    attributes,
                    annotations: BTreeMap::new(),
                })
                .collect(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply a structure-preserving operation, producing the new document.
    ///
    /// Replace and update components are checked strictly against the
    /// current state: their recorded old values must match what the
    /// document holds. Annotation changes paint every item they span; an
    /// end for a key that is not open is a no-op.
    pub fn apply(&self, op: &DocOp) -> Result<Document> {
        if op.span() != self.items.len() {
            return Err(DocError::SpanMismatch {
                op: op.span(),
                doc: self.items.len(),
            });
        }
        let mut items = self.items.clone();
        let mut active: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut pos = 0usize;
        for component in op.components() {
            match component {
                Component::Retain(n) => {
                    for item in &mut items[pos..pos + n] {
                        paint(item, &active);
                    }
                    pos += n;
                }
                Component::ReplaceAttributes { old, new } => {
                    if &items[pos].attributes != old {
                        return Err(DocError::AttributeMismatch {
                            index: pos,
                            expected: format!("{old:?}"),
                            found: format!("{:?}", items[pos].attributes),
                        });
                    }
                    items[pos].attributes = new.clone();
                    paint(&mut items[pos], &active);
                    pos += 1;
                }
                Component::UpdateAttributes(update) => {
                    check_update(&items[pos], update, pos)?;
                    items[pos].attributes = items[pos].attributes.updated_with(update);
                    paint(&mut items[pos], &active);
                    pos += 1;
                }
                Component::AnnotationBoundary(boundary) => {
                    register_boundary(&mut active, boundary);
                }
                other => return Err(DocError::ContentComponent(other.kind())),
            }
        }
        if let Some(key) = active.keys().next() {
            return Err(DocError::UnclosedAnnotation(key.clone()));
        }
        Ok(Document { items })
    }
}

fn paint(item: &mut Item, active: &BTreeMap<String, Option<String>>) {
    for (key, value) in active {
        item.annotations.insert(key.clone(), value.clone());
    }
}

fn register_boundary(active: &mut BTreeMap<String, Option<String>>, boundary: &AnnotationBoundary) {
    for key in boundary.ends() {
        active.remove(key);
    }
    for change in boundary.changes() {
        active.insert(change.key.clone(), change.new.clone());
    }
}

fn check_update(item: &Item, update: &AttributesUpdate, index: usize) -> Result<()> {
    for triple in update.iter() {
        let found = item.attributes.get(&triple.key);
        if found != triple.old.as_deref() {
            return Err(DocError::AttributeMismatch {
                index,
                expected: format!("{}={:?}", triple.key, triple.old),
                found: format!("{}={:?}", triple.key, found),
            });
        }
    }
    Ok(())
}
