//! Error types for the transform engine.

use thiserror::Error;

/// Errors that can occur while transforming an operation pair.
///
/// Failure is all-or-nothing: either both transformed operations are
/// returned or neither is. Nothing is retried internally; the caller
/// decides whether to retry with corrected input, drop the operation,
/// or escalate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The operand lengths disagree: one side ran out of components while
    /// the other still had an outstanding positional lead.
    #[error(
        "ran out of {side} components after {consumed} of {total}, \
         with {outstanding} positions outstanding"
    )]
    StructuralMismatch {
        side: &'static str,
        consumed: usize,
        total: usize,
        outstanding: i64,
    },

    /// Two overlapping components could not be reconciled by the
    /// resolution matrix.
    #[error("incompatible components: {incoming} of size {size} against pending {pending}")]
    IncompatibleComponents {
        incoming: &'static str,
        pending: &'static str,
        size: i64,
    },

    /// A non-structure-preserving component was supplied. This is a caller
    /// error: such pairs belong to the general-purpose transformer.
    #[error("content-bearing component {0} passed to the structure-preserving transformer")]
    ContractViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, TransformError>;
