use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use crate::actor::ActorRef;

/// Name of a markable state, e.g. `accepted`.
///
/// The name namespaces the three fields a state installs on a document
/// type: `<name>`, `<name>_at` and `<name>_by`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(Cow<'static, str>);

impl StateName {
    pub const ACCEPTED: StateName = StateName::from_static("accepted");
    pub const CONFIRMED: StateName = StateName::from_static("confirmed");
    pub const IGNORED: StateName = StateName::from_static("ignored");
    pub const REJECTED: StateName = StateName::from_static("rejected");

    pub const fn from_static(name: &'static str) -> Self {
        StateName(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        StateName(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Boolean flag field, e.g. `accepted`.
    pub fn flag_field(&self) -> &str {
        self.as_str()
    }

    /// Timestamp field, e.g. `accepted_at`.
    pub fn timestamp_field(&self) -> String {
        format!("{}_at", self.0)
    }

    /// Actor reference field, e.g. `accepted_by`.
    pub fn actor_field(&self) -> String {
        format!("{}_by", self.0)
    }
}

impl Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl From<&'static str> for StateName {
    fn from(name: &'static str) -> Self {
        StateName::from_static(name)
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        StateName::new(name)
    }
}

/// The three fields of one state on one document.
///
/// `occurred_at` and `recorded_by` are set exactly when `flag` is true.
/// The only way to get a flagged value is [`MarkableState::marked`], which
/// sets all three together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkableState {
    flag: bool,
    occurred_at: Option<DateTime<Utc>>,
    recorded_by: Option<ActorRef>,
}

static UNMARKED: MarkableState = MarkableState {
    flag: false,
    occurred_at: None,
    recorded_by: None,
};

impl MarkableState {
    pub fn marked(at: DateTime<Utc>, by: ActorRef) -> Self {
        Self {
            flag: true,
            occurred_at: Some(at),
            recorded_by: Some(by),
        }
    }

    pub fn is_set(&self) -> bool {
        self.flag
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    pub fn recorded_by(&self) -> Option<&ActorRef> {
        self.recorded_by.as_ref()
    }
}

/// Every state recorded on one document, keyed by state name.
///
/// A state without an entry reads as unflagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marks(BTreeMap<StateName, MarkableState>);

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &StateName) -> &MarkableState {
        self.0.get(state).unwrap_or(&UNMARKED)
    }

    pub fn is_set(&self, state: &StateName) -> bool {
        self.get(state).is_set()
    }

    pub(crate) fn record(&mut self, state: StateName, mark: MarkableState) {
        self.0.insert(state, mark);
    }

    /// Copies every flagged state of `stored` over this map's entry.
    pub(crate) fn keep_flagged(&mut self, stored: &Marks) {
        for (state, mark) in stored.iter().filter(|(_, mark)| mark.is_set()) {
            self.0.insert(state.clone(), mark.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateName, &MarkableState)> {
        self.0.iter()
    }
}

/// A persisted document that can carry markable states.
///
/// ```rust
/// use relate::{Markable, Marks, Id};
///
/// pub struct Post {
///     id: Id<Post>,
///     marks: Marks,
/// }
///
/// impl Markable for Post {
///     type Id = Id<Post>;
///
///     fn id(&self) -> Self::Id { self.id }
///     fn marks(&self) -> &Marks { &self.marks }
///     fn marks_mut(&mut self) -> &mut Marks { &mut self.marks }
/// }
/// ```
pub trait Markable: Send + Sync + 'static {
    /// Identifier the persistence collaborator uses to locate the record.
    type Id: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    fn marks(&self) -> &Marks;

    fn marks_mut(&mut self) -> &mut Marks;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_namespaced() {
        let state = StateName::ACCEPTED;
        assert_eq!(state.flag_field(), "accepted");
        assert_eq!(state.timestamp_field(), "accepted_at");
        assert_eq!(state.actor_field(), "accepted_by");
    }

    #[test]
    fn test_static_and_owned_names_are_equal() {
        assert_eq!(StateName::REJECTED, StateName::new("rejected"));
        assert_eq!(StateName::from("ignored"), StateName::IGNORED);
    }

    #[test]
    fn test_missing_state_reads_unflagged() {
        let marks = Marks::new();
        let state = marks.get(&StateName::CONFIRMED);
        assert!(!state.is_set());
        assert!(state.occurred_at().is_none());
        assert!(state.recorded_by().is_none());
    }

    #[test]
    fn test_marked_sets_all_fields() {
        let now = Utc::now();
        let mark = MarkableState::marked(now, ActorRef::new("Accepter", 42));
        assert!(mark.is_set());
        assert_eq!(mark.occurred_at(), Some(now));
        assert_eq!(mark.recorded_by(), Some(&ActorRef::new("Accepter", 42)));
    }

    #[test]
    fn test_marks_serialize_as_map() {
        let mut marks = Marks::new();
        marks.record(
            StateName::ACCEPTED,
            MarkableState::marked(Utc::now(), ActorRef::new("Accepter", 42)),
        );

        let json = serde_json::to_value(&marks).unwrap();
        assert_eq!(json["accepted"]["flag"], true);
        assert_eq!(json["accepted"]["recorded_by"]["kind"], "Accepter");

        let back: Marks = serde_json::from_value(json).unwrap();
        assert_eq!(back, marks);
    }
}
