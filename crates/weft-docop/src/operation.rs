//! DocOp - immutable document operations and their normalizing builder.

use crate::annotation::AnnotationBoundary;
use crate::attributes::Attributes;
use crate::component::Component;
use crate::update::AttributesUpdate;
use serde::{Deserialize, Serialize};

/// An immutable ordered sequence of mutation components.
///
/// Only obtainable through [`DocOpBuilder`], so every `DocOp` is in normal
/// form: no zero-length or adjacent retains, no empty annotation boundaries,
/// no adjacent boundary pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocOp {
    components: Vec<Component>,
}

impl DocOp {
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Total positions of the base document this operation consumes.
    pub fn span(&self) -> usize {
        self.components.iter().map(Component::span).sum()
    }

    /// Whether every component is structure-preserving.
    pub fn is_structure_preserving(&self) -> bool {
        self.components.iter().all(Component::is_structure_preserving)
    }
}

/// Accumulator for building a [`DocOp`], normalizing as it goes.
///
/// One method per component kind; `finish` consumes the builder and yields
/// the immutable operation.
#[derive(Debug, Default)]
pub struct DocOpBuilder {
    components: Vec<Component>,
}

impl DocOpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance over `n` items. Zero-length retains are dropped and adjacent
    /// retains coalesce.
    pub fn retain(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if let Some(Component::Retain(last)) = self.components.last_mut() {
            *last += n;
        } else {
            self.components.push(Component::Retain(n));
        }
    }

    pub fn replace_attributes(&mut self, old: Attributes, new: Attributes) {
        self.components
            .push(Component::ReplaceAttributes { old, new });
    }

    /// An update with no triples still spans one item, so it degrades to a
    /// single retain.
    pub fn update_attributes(&mut self, update: AttributesUpdate) {
        if update.is_empty() {
            self.retain(1);
        } else {
            self.components.push(Component::UpdateAttributes(update));
        }
    }

    /// Empty boundaries are dropped; a boundary adjacent to another composes
    /// into it, with the later declarations winning per key.
    pub fn annotation_boundary(&mut self, boundary: AnnotationBoundary) {
        if boundary.is_empty() {
            return;
        }
        if let Some(Component::AnnotationBoundary(last)) = self.components.last_mut() {
            let composed = last.compose_with(&boundary);
            if composed.is_empty() {
                self.components.pop();
            } else {
                *last = composed;
            }
        } else {
            self.components.push(Component::AnnotationBoundary(boundary));
        }
    }

    pub fn characters(&mut self, chars: impl Into<String>) {
        self.components.push(Component::Characters(chars.into()));
    }

    pub fn delete_characters(&mut self, chars: impl Into<String>) {
        self.components
            .push(Component::DeleteCharacters(chars.into()));
    }

    pub fn element_start(&mut self, tag: impl Into<String>, attributes: Attributes) {
        self.components.push(Component::ElementStart {
            tag: tag.into(),
            attributes,
        });
    }

    pub fn element_end(&mut self) {
        self.components.push(Component::ElementEnd);
    }

    pub fn delete_element_start(&mut self, tag: impl Into<String>, attributes: Attributes) {
        self.components.push(Component::DeleteElementStart {
            tag: tag.into(),
            attributes,
        });
    }

    pub fn delete_element_end(&mut self) {
        self.components.push(Component::DeleteElementEnd);
    }

    /// Yield the completed immutable operation.
    pub fn finish(self) -> DocOp {
        DocOp {
            components: self.components,
        }
    }
}
