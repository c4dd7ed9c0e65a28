use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::trace;

use super::{DocumentStore, StoreError};
use crate::query::Query;
use crate::state::{Markable, MarkableState, StateName};

/// In-memory document store backed by a `HashMap`.
///
/// Useful in tests and for embedding the crate without a database. Documents
/// are keyed by `(document type, id)` and mark writes are conditional, like
/// the Postgres store.
pub struct InMemoryStore<D: Markable> {
    inner: Mutex<Inner<D>>,
}

struct Inner<D: Markable> {
    docs: HashMap<(String, D::Id), D>,
    writes: usize,
}

impl<D: Markable + Clone> InMemoryStore<D> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                docs: HashMap::new(),
                writes: 0,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<D>>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("mutex poisoned: {}", e)))
    }

    /// Inserts or replaces a document.
    ///
    /// States already flagged in the stored copy are kept, so writing back a
    /// stale copy cannot clear a recorded mark.
    pub fn insert(&self, doc_type: &str, mut doc: D) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let key = (doc_type.to_string(), doc.id());
        if let Some(stored) = inner.docs.get(&key) {
            doc.marks_mut().keep_flagged(stored.marks());
        }
        inner.docs.insert(key, doc);
        Ok(())
    }

    pub fn get(&self, doc_type: &str, id: &D::Id) -> Result<Option<D>, StoreError> {
        let key = (doc_type.to_string(), id.clone());
        Ok(self.lock()?.docs.get(&key).cloned())
    }

    /// Stored documents of the query's type matching it, in no particular order.
    pub fn find(&self, query: &Query) -> Result<Vec<D>, StoreError> {
        let inner = self.lock()?;
        let docs = inner
            .docs
            .iter()
            .filter(|((doc_type, _), _)| doc_type == query.doc_type())
            .map(|(_, doc)| doc);
        Ok(query.apply(docs).into_iter().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.docs.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Number of mark writes accepted so far.
    pub fn writes(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.writes)
    }
}

impl<D: Markable + Clone> Default for InMemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Markable + Clone> DocumentStore<D> for InMemoryStore<D> {
    async fn update_mark(
        &self,
        doc_type: &str,
        id: &D::Id,
        state: &StateName,
        mark: &MarkableState,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let key = (doc_type.to_string(), id.clone());
        let doc = inner.docs.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;

        if doc.marks().is_set(state) {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                state: state.clone(),
            });
        }

        doc.marks_mut().record(state.clone(), mark.clone());
        inner.writes += 1;
        trace!(document_type = doc_type, document_id = %id, state = %state, "mark stored");
        Ok(())
    }
}
