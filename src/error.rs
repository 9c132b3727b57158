//! Error kinds surfaced by the engine.
//!
//! Four kinds are fatal to [`crate::evaluator::Evaluator::validate`] and unwind the
//! call after the guaranteed gate clear (see `evaluator.rs`). A rule's predicate
//! failing is never an `EngineError` — it is captured as a [`crate::report::RuleOutcome`]
//! and the walk continues.

use thiserror::Error;

/// Fatal error raised by catalog lookup, gate checks, source callouts, or
/// missing input. See spec §7 for the propagation contract.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A rule's target attribute, or a key attribute, did not resolve in the
    /// Attribute Catalog, or the catalog itself was built with a duplicate
    /// name/id.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// The incoming Product lacked a required key attribute's value.
    #[error("input error: {0}")]
    Input(String),

    /// The Transaction-State Gate was not confirmed, or an owner-addressed
    /// gate operation referenced an unknown or empty owner id.
    #[error("permission error: {0}")]
    Permission(String),

    /// A caller-supplied record-retrieval or Source callout failed.
    #[error("source error: {0}")]
    Source(String),
}

impl EngineError {
    pub fn metadata(msg: impl Into<String>) -> Self {
        EngineError::Metadata(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        EngineError::Input(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        EngineError::Permission(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        EngineError::Source(msg.into())
    }
}

/// Result alias used throughout the crate's fallible, fatal-error paths.
pub type EngineResult<T> = Result<T, EngineError>;
