//! External collaborators of the analysis core.
//!
//! The contradiction detector and the precedent source are remote and
//! fallible. The `*_or_empty` wrappers bound each call with a timeout and
//! turn every failure into an empty result plus a warning, so callers never
//! see a collaborator error.

mod contradiction;
mod precedent;

pub use contradiction::*;
pub use precedent::*;

use serde::Serialize;

/// A collaborator result that may have been degraded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceOutcome<T> {
    /// The result, or the empty substitute on failure.
    pub value: T,
    /// Why the result was degraded, if it was.
    pub warning: Option<String>,
}

impl<T> ServiceOutcome<T> {
    /// A successful result.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    /// A degraded result.
    pub fn degraded(value: T, warning: impl Into<String>) -> Self {
        Self {
            value,
            warning: Some(warning.into()),
        }
    }

    /// Whether the value is a substitute.
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}
