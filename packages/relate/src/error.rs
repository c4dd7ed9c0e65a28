use thiserror::Error;

use crate::hooks::Phase;
use crate::state::StateName;
use crate::store::StoreError;

pub type Result<T, E = RelateError> = std::result::Result<T, E>;

/// Errors surfaced by document type operations.
///
/// A vetoed transition is not an error: it is reported as `Ok(false)`.
/// Transitioning a document that is already flagged is `Ok(true)`.
#[derive(Error, Debug)]
pub enum RelateError {
    #[error("{doc_type} is not configured with the '{state}' state")]
    NotConfigured { doc_type: String, state: StateName },

    /// A hook returned `Err`. Hooks earlier in the same phase already ran.
    #[error("{phase} hook '{hook}' for '{state}' failed: {source}")]
    Hook {
        state: StateName,
        phase: Phase,
        hook: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RelateError {
    /// Whether the mark had already been persisted when this error occurred.
    ///
    /// Only after-hook failures happen post-commit; the transition itself
    /// succeeded and the document is flagged.
    pub fn committed(&self) -> bool {
        matches!(
            self,
            RelateError::Hook {
                phase: Phase::After,
                ..
            }
        )
    }
}
