//! Core error kinds shared by every engine.
//!
//! Validation and domain errors are deterministic and never retried.
//! `Conflict` is the expected outcome of an optimistic commit race and is
//! retried internally by each engine up to a bounded budget before being
//! surfaced. `StoreUnavailable` is a transport-level failure and is always
//! propagated to the caller.

use thiserror::Error;

/// Errors produced by the engagement core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or malformed input, rejected before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required user, item, or quest does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Points balance below the required amount.
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u64, required: u64 },

    /// No unused instance of the requested item in the user's inventory.
    #[error("item '{0}' not owned or already used")]
    ItemNotOwned(String),

    /// Optimistic transaction could not commit after exhausting retries.
    #[error("transaction conflict: retries exhausted")]
    Conflict,

    /// The document store could not be reached or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    /// Whether the caller may usefully retry this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Conflict | CoreError::StoreUnavailable(_))
    }
}
