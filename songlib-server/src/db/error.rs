//! Store error taxonomy

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the song store
///
/// Callers branch on the variant: `NoMatch` means the addressed song does not
/// exist, which is distinct from any backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing matched the (group, name) key
    #[error("no matching result")]
    NoMatch,

    /// A song with the same (group, name) already exists
    #[error("song '{name}' by '{group}' already exists")]
    Conflict { group: String, name: String },

    /// Filter input rejected before reaching the backend
    #[error("bad filter parameters: {0}")]
    MalformedFilter(String),

    /// The operation did not finish within its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Any other backend failure
    #[error("database error during {context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A transaction failed and rolling it back failed as well
    #[error("{original}; rollback also failed: {rollback}")]
    RollbackFailed {
        original: Box<StoreError>,
        rollback: Box<StoreError>,
    },
}

impl StoreError {
    pub(crate) fn backend(context: &'static str, source: sqlx::Error) -> Self {
        StoreError::Backend { context, source }
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, StoreError::NoMatch)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }

    /// True for low-level failures, including compound rollback failures
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            StoreError::Backend { .. } | StoreError::RollbackFailed { .. }
        )
    }
}
