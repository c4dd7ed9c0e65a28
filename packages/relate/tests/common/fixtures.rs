//! Test fixtures: a markable document type, actors and stores that fail.

use std::sync::{Arc, Mutex};

use relate::{
    async_trait, Actor, ActorId, DocumentStore, Entity, Id, Markable, MarkableState, Marks,
    StateName, StoreError,
};
use serde::{Deserialize, Serialize};

pub type ProposalId = Id<Proposal>;

/// A document that can be accepted, confirmed, ignored or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    #[serde(default)]
    pub marks: Marks,
}

impl Proposal {
    pub fn new(title: &str) -> Self {
        Self {
            id: ProposalId::new(),
            title: title.to_string(),
            marks: Marks::new(),
        }
    }

    pub fn mark(&self, state: &StateName) -> &MarkableState {
        self.marks.get(state)
    }
}

impl Markable for Proposal {
    type Id = ProposalId;

    fn id(&self) -> ProposalId {
        self.id
    }

    fn marks(&self) -> &Marks {
        &self.marks
    }

    fn marks_mut(&mut self) -> &mut Marks {
        &mut self.marks
    }
}

/// An actor with an integer id, like a row in a users table.
#[derive(Debug, Clone)]
pub struct Accepter {
    pub id: i64,
}

impl Actor for Accepter {
    fn actor_kind(&self) -> &str {
        "Accepter"
    }

    fn actor_id(&self) -> ActorId {
        ActorId::Int(self.id)
    }
}

/// An actor identified by a typed id.
pub struct Reviewer;

impl Entity for Reviewer {
    const KIND: &'static str = "Reviewer";
}

pub type ReviewerId = Id<Reviewer>;

/// Ordered record of hook invocations.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// A hook that appends `name` to `log` and returns `result`.
pub fn recording_hook(
    log: &CallLog,
    name: &'static str,
    result: bool,
) -> impl Fn(&Proposal) -> anyhow::Result<bool> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_proposal: &Proposal| {
        log.lock().unwrap().push(name);
        Ok(result)
    }
}

/// A hook that appends `name` to `log` and then fails.
pub fn failing_hook(
    log: &CallLog,
    name: &'static str,
) -> impl Fn(&Proposal) -> anyhow::Result<bool> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_proposal: &Proposal| {
        log.lock().unwrap().push(name);
        anyhow::bail!("{} exploded", name)
    }
}

/// A store whose writes always fail, as if the database were unreachable.
pub struct UnreachableStore;

#[async_trait]
impl DocumentStore<Proposal> for UnreachableStore {
    async fn update_mark(
        &self,
        _doc_type: &str,
        _id: &ProposalId,
        _state: &StateName,
        _mark: &MarkableState,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
    }
}
