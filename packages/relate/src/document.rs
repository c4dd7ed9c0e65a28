//! Document type descriptors and the transition operation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::error::{RelateError, Result};
use crate::hooks::{HookChain, MarkOptions};
use crate::query::{Filter, Query};
use crate::state::{Markable, MarkableState, StateName};
use crate::store::DocumentStore;

/// Time source for `<state>_at`.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Storage type of an installed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Defaults to `false`.
    Boolean,
    Timestamp,
    ActorRef,
}

/// A field a state installed on a document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    fn for_state(state: &StateName) -> [FieldDef; 3] {
        [
            FieldDef {
                name: state.flag_field().to_string(),
                kind: FieldKind::Boolean,
            },
            FieldDef {
                name: state.timestamp_field(),
                kind: FieldKind::Timestamp,
            },
            FieldDef {
                name: state.actor_field(),
                kind: FieldKind::ActorRef,
            },
        ]
    }
}

/// Capability record for one document type.
///
/// Holds which states are installed, the fields they added and their hook
/// chains. Configure it once at startup (`&mut self`), then share it
/// (`Arc<DocumentType<D>>`) for queries and transitions.
pub struct DocumentType<D> {
    name: String,
    fields: Vec<FieldDef>,
    states: BTreeMap<StateName, HookChain<D>>,
    clock: Clock,
}

impl<D: Markable> DocumentType<D> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            states: BTreeMap::new(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the time source used for `<state>_at`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields installed so far, in installation order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn states(&self) -> impl Iterator<Item = &StateName> {
        self.states.keys()
    }

    pub fn hooks(&self, state: &StateName) -> Option<&HookChain<D>> {
        self.states.get(state)
    }

    pub fn is_configured(&self, state: &StateName) -> bool {
        self.states.contains_key(state)
    }

    /// Installs `state` on this type and registers the options' hooks.
    ///
    /// Fields are installed once. Calling again only adds hooks; a hook name
    /// already registered for the same phase is replaced, not duplicated.
    pub fn configure(&mut self, state: StateName, options: MarkOptions<D>) -> &mut Self {
        let before = options.before.len();
        let after = options.after.len();

        if !self.states.contains_key(&state) {
            self.fields.extend(FieldDef::for_state(&state));
            self.states.insert(state.clone(), HookChain::new(state.clone()));
            debug!(document_type = %self.name, state = %state, "installed state fields");
        }
        if let Some(chain) = self.states.get_mut(&state) {
            chain.extend(options);
        }

        if before + after > 0 {
            debug!(
                document_type = %self.name,
                state = %state,
                before,
                after,
                "registered hooks"
            );
        }
        self
    }

    /// Query for documents of this type where `state` is flagged.
    pub fn flagged(&self, state: &StateName) -> Result<Query> {
        self.ensure_configured(state)?;
        Ok(Query::new(self.name.clone()).and(Filter::Flagged(state.clone())))
    }

    /// Query for documents where `state` was flagged by `actor`.
    pub fn flagged_by<A: Actor + ?Sized>(&self, state: &StateName, actor: &A) -> Result<Query> {
        Ok(self.flagged(state)?.and(Filter::RecordedBy {
            state: state.clone(),
            actor: actor.actor_ref(),
        }))
    }

    /// Flags `state` on `doc`, crediting `actor`.
    ///
    /// Returns the flag value after the call: `true` when the document was
    /// already flagged or has just been flagged, `false` when a before hook
    /// vetoed. On success exactly one write goes to `store`, and `doc` is
    /// updated only after that write succeeded.
    ///
    /// # Errors
    ///
    /// - [`RelateError::NotConfigured`] if the type does not have `state`.
    /// - [`RelateError::Hook`] if a hook failed. When an after hook fails the
    ///   mark is already persisted; see [`RelateError::committed`].
    /// - [`RelateError::Store`] if the write failed; `doc` is left unflagged.
    pub async fn transition<A, S>(
        &self,
        state: &StateName,
        doc: &mut D,
        actor: &A,
        store: &S,
    ) -> Result<bool>
    where
        A: Actor + ?Sized,
        S: DocumentStore<D> + ?Sized,
    {
        let chain = self.ensure_configured(state)?;

        if doc.marks().is_set(state) {
            debug!(
                document_type = %self.name,
                state = %state,
                document_id = %doc.id(),
                "already flagged, skipping"
            );
            return Ok(true);
        }

        if !chain.run_before(doc).await? {
            debug!(
                document_type = %self.name,
                state = %state,
                document_id = %doc.id(),
                "transition vetoed"
            );
            return Ok(doc.marks().is_set(state));
        }

        let actor = actor.actor_ref();
        let mark = MarkableState::marked((self.clock)(), actor.clone());
        store
            .update_mark(&self.name, &doc.id(), state, &mark)
            .await?;
        doc.marks_mut().record(state.clone(), mark);

        info!(
            document_type = %self.name,
            state = %state,
            document_id = %doc.id(),
            actor_kind = %actor.kind,
            actor_id = %actor.id,
            "transition recorded"
        );

        if let Err(err) = chain.run_after(doc).await {
            warn!(
                document_type = %self.name,
                state = %state,
                document_id = %doc.id(),
                error = %err,
                "after hook failed, mark already persisted"
            );
            return Err(err);
        }

        Ok(true)
    }

    fn ensure_configured(&self, state: &StateName) -> Result<&HookChain<D>> {
        self.states
            .get(state)
            .ok_or_else(|| RelateError::NotConfigured {
                doc_type: self.name.clone(),
                state: state.clone(),
            })
    }
}

impl<D> fmt::Debug for DocumentType<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentType")
            .field("name", &self.name)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("fields", &self.fields)
            .finish()
    }
}
