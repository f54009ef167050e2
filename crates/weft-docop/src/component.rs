//! Component - the closed set of document-mutation components.

use crate::annotation::AnnotationBoundary;
use crate::attributes::Attributes;
use crate::update::AttributesUpdate;
use serde::{Deserialize, Serialize};

/// One component of a document operation.
///
/// The first four variants are structure-preserving: they change no content
/// and no tree shape. The remaining variants carry content changes and are
/// handled by the general-purpose transformer, not this engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    /// Advance over `n` items of existing content without modification.
    Retain(usize),
    /// Wholesale attribute-set replacement on one item.
    ReplaceAttributes { old: Attributes, new: Attributes },
    /// Incremental attribute update on one item.
    UpdateAttributes(AttributesUpdate),
    /// Annotation-range boundary declarations; consumes no positions.
    AnnotationBoundary(AnnotationBoundary),
    /// Insert characters.
    Characters(String),
    /// Delete characters.
    DeleteCharacters(String),
    /// Open a new element.
    ElementStart { tag: String, attributes: Attributes },
    /// Close the most recently opened element.
    ElementEnd,
    /// Delete an element opening.
    DeleteElementStart { tag: String, attributes: Attributes },
    /// Delete an element closing.
    DeleteElementEnd,
}

impl Component {
    /// Whether this component preserves document structure and content.
    pub fn is_structure_preserving(&self) -> bool {
        matches!(
            self,
            Component::Retain(_)
                | Component::ReplaceAttributes { .. }
                | Component::UpdateAttributes(_)
                | Component::AnnotationBoundary(_)
        )
    }

    /// Positions of the base document this component consumes.
    pub fn span(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::ReplaceAttributes { .. } | Component::UpdateAttributes(_) => 1,
            Component::AnnotationBoundary(_) => 0,
            Component::Characters(_) | Component::ElementStart { .. } | Component::ElementEnd => 0,
            Component::DeleteCharacters(s) => s.chars().count(),
            Component::DeleteElementStart { .. } | Component::DeleteElementEnd => 1,
        }
    }

    /// Component kind name, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Retain(_) => "retain",
            Component::ReplaceAttributes { .. } => "replaceAttributes",
            Component::UpdateAttributes(_) => "updateAttributes",
            Component::AnnotationBoundary(_) => "annotationBoundary",
            Component::Characters(_) => "characters",
            Component::DeleteCharacters(_) => "deleteCharacters",
            Component::ElementStart { .. } => "elementStart",
            Component::ElementEnd => "elementEnd",
            Component::DeleteElementStart { .. } => "deleteElementStart",
            Component::DeleteElementEnd => "deleteElementEnd",
        }
    }
}
