//! Weft transform - convergence primitive for concurrent document edits
//!
//! Real-time collaboration lets two peers author operations against the
//! same base document at the same time. Before either edit can be applied
//! on top of the other, the pair must be transformed so that both
//! application orders reach the identical document and annotation state:
//!
//! ```text
//! transform(client, server) -> (client', server')
//! where  apply(apply(base, server), client')
//!     == apply(apply(base, client), server')
//! ```
//!
//! This crate handles the structure-preserving subset: operations made of
//! retain, replaceAttributes, updateAttributes, and annotationBoundary
//! components. A higher-level dispatcher classifies operation pairs and
//! routes anything content-bearing to a general-purpose transformer; this
//! engine doubles as the correctness oracle for that transformer, so it is
//! strictly deterministic and single-threaded with no state shared across
//! calls.

pub mod error;
mod position;
pub mod preservation;

pub use error::{Result, TransformError};
pub use preservation::{transform, OperationPair};
