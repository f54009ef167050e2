//! Weft document operation model
//!
//! Value types shared by the transform engine:
//! - [`Attributes`] - immutable sorted key/value map attached to an item
//! - [`AttributesUpdate`] - an ordered diff over an attribute map
//! - [`AnnotationBoundary`] - range-annotation declarations at a cursor position
//! - [`Component`] / [`DocOp`] - mutation components and immutable operations
//! - [`Document`] - a flat attributed-span view that operations apply to
//!
//! Operations are built through [`DocOpBuilder`], which normalizes as it
//! accumulates: adjacent retains coalesce, adjacent annotation boundaries
//! compose, and no-op components are elided.

pub mod annotation;
pub mod attributes;
pub mod component;
pub mod document;
pub mod operation;
pub mod update;

pub use annotation::{AnnotationBoundary, AnnotationChange};
pub use attributes::Attributes;
pub use component::Component;
pub use document::{DocError, Document};
pub use operation::{DocOp, DocOpBuilder};
pub use update::{AttributeTriple, AttributesUpdate};
