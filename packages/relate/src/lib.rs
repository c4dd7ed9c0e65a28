//! # Relate
//!
//! Markable document states with an audit trail and a cancellable hook chain.
//!
//! A document type can be configured with any number of named states
//! (`accepted`, `confirmed`, `ignored`, `rejected`, or your own). Each state
//! adds three fields to the type, two queries, and one transition:
//!
//! - `<state>`: whether the transition happened (defaults to `false`)
//! - `<state>_at`: when it happened
//! - `<state>_by`: which actor caused it, stored as `(kind, id)`
//!
//! ## Transition Contract
//!
//! ```text
//! transition(doc, actor)
//!     │
//!     ├─► already flagged? ──► Ok(true)       (no hooks, no write)
//!     │
//!     ├─► before hooks (in order)
//!     │       └─► any returns false ──► Ok(false)   (no write, no after hooks)
//!     │
//!     ├─► store.update_mark(flag, now, actor)       (exactly one write)
//!     │
//!     ├─► after hooks (in order, results ignored)
//!     │
//!     └─► Ok(true)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use relate::{DocumentType, InMemoryStore, MarkOptions, StateName};
//!
//! let mut posts = DocumentType::<Post>::new("Post");
//! posts.acceptable(
//!     MarkOptions::new()
//!         .before("has_body", |post: &Post| -> anyhow::Result<bool> {
//!             Ok(!post.body.is_empty())
//!         })
//!         .after("notify_author", NotifyAuthor::new(mailer)),
//! );
//!
//! let store = InMemoryStore::new();
//! store.insert("Post", post.clone())?;
//!
//! posts.accept(&mut post, &reviewer_id, &store).await?;
//! let accepted_by_reviewer = store.find(&posts.accepted_by(&reviewer_id)?)?;
//! ```
//!
//! ## Guarantees
//!
//! - A state is recorded at most once per document; repeated transitions are
//!   no-ops that return `true`.
//! - The in-memory document only changes after the store accepted the write.
//! - Errors from hooks and stores propagate to the caller; nothing is retried.
//!
//! There is no locking. Two processes racing on the same record are settled
//! by the store's conditional update, which refuses the second write with
//! [`StoreError::Conflict`].

mod actor;
mod document;
mod error;
mod hooks;
mod query;
mod relations;
mod state;

pub mod id;
pub mod store;

#[cfg(feature = "postgres")]
pub mod config;

pub use actor::{Actor, ActorId, ActorRef, Entity};
pub use document::{Clock, DocumentType, FieldDef, FieldKind};
pub use error::{RelateError, Result};
pub use hooks::{Hook, HookChain, MarkOptions, NamedHook, Phase};
pub use id::Id;
pub use query::{Filter, Query};
pub use relations::Relation;
pub use state::{Markable, MarkableState, Marks, StateName};
pub use store::{DocumentStore, InMemoryStore, StoreError};

#[cfg(feature = "postgres")]
pub use config::StoreConfig;
#[cfg(feature = "postgres")]
pub use store::PgDocumentStore;

// Re-export commonly used external types
pub use async_trait::async_trait;
