//! Actors: whoever is credited with a transition.
//!
//! A recorded actor is a weak reference `(kind, id)`. The crate never loads
//! or owns the actor; resolving the reference back to a record is the
//! application's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::id::Id;

/// Opaque actor identifier.
///
/// Serialized untagged, so an integer id is a JSON number and a UUID or text
/// id is a JSON string. Text that parses as a UUID is always held as
/// [`ActorId::Uuid`], whether converted from a string or read back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActorId {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Int(id) => write!(f, "{}", id),
            ActorId::Uuid(id) => write!(f, "{}", id),
            ActorId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ActorId {
    fn from(id: i64) -> Self {
        ActorId::Int(id)
    }
}

impl From<Uuid> for ActorId {
    fn from(id: Uuid) -> Self {
        ActorId::Uuid(id)
    }
}

impl From<String> for ActorId {
    /// Text that parses as a UUID becomes [`ActorId::Uuid`], matching what
    /// a stored id deserializes to.
    fn from(id: String) -> Self {
        match Uuid::parse_str(&id) {
            Ok(uuid) => ActorId::Uuid(uuid),
            Err(_) => ActorId::Text(id),
        }
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        ActorId::from(id.to_string())
    }
}

/// Stored reference to an actor: type discriminator plus identifier.
///
/// Two references are equal only if both the kind (exact string match) and
/// the id (value equality) are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub kind: String,
    pub id: ActorId,
}

impl ActorRef {
    pub fn new(kind: impl Into<String>, id: impl Into<ActorId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Anything that can be credited with a transition.
pub trait Actor {
    /// Type discriminator, e.g. `"Reviewer"`.
    fn actor_kind(&self) -> &str;

    fn actor_id(&self) -> ActorId;

    fn actor_ref(&self) -> ActorRef {
        ActorRef::new(self.actor_kind(), self.actor_id())
    }
}

impl Actor for ActorRef {
    fn actor_kind(&self) -> &str {
        &self.kind
    }

    fn actor_id(&self) -> ActorId {
        self.id.clone()
    }

    fn actor_ref(&self) -> ActorRef {
        self.clone()
    }
}

/// Marker for entity types whose [`Id`] can act as an actor.
///
/// ```rust
/// use relate::{Actor, Entity, Id};
///
/// pub struct Reviewer;
///
/// impl Entity for Reviewer {
///     const KIND: &'static str = "Reviewer";
/// }
///
/// let reviewer = Id::<Reviewer>::new();
/// assert_eq!(reviewer.actor_kind(), "Reviewer");
/// ```
pub trait Entity {
    const KIND: &'static str;
}

impl<T: Entity> Actor for Id<T> {
    fn actor_kind(&self) -> &str {
        T::KIND
    }

    fn actor_id(&self) -> ActorId {
        ActorId::Uuid(self.into_uuid())
    }
}
