//! Persistence collaborators.
//!
//! A [`DocumentStore`] performs the one write a transition needs: persisting
//! a [`MarkableState`] for one state of one document, atomically.
//!
//! # The Contract
//!
//! 1. **One write per transition.** `update_mark` is called at most once per
//!    successful transition and never for skipped or vetoed ones.
//! 2. **Conditional.** Stores should refuse to overwrite a state that is
//!    already flagged and answer [`StoreError::Conflict`]. This is what makes
//!    concurrent transitions on the same record safe; the crate itself does
//!    no locking.
//! 3. **No retries.** Errors go back to the caller as they are.

mod memory;

#[cfg(feature = "postgres")]
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::{Markable, MarkableState, StateName};

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::PgDocumentStore;

/// Errors from document storage.
///
/// [`StoreError::Conflict`] is expected under concurrency: another writer
/// recorded the state first. The other variants are system failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document {id} not found")]
    NotFound { id: String },

    #[error("'{state}' is already recorded for document {id}")]
    Conflict { id: String, state: StateName },

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Atomic "update these fields and persist" for markable documents.
#[async_trait]
pub trait DocumentStore<D: Markable>: Send + Sync {
    /// Persists `mark` as the value of `state` on the document `id`.
    async fn update_mark(
        &self,
        doc_type: &str,
        id: &D::Id,
        state: &StateName,
        mark: &MarkableState,
    ) -> Result<(), StoreError>;
}
