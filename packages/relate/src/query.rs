//! Structured, conjunctive queries over markable states.
//!
//! A [`Query`] is built by a document type (`flagged`, `flagged_by`) and
//! evaluated by whoever holds the documents: in memory via [`Query::apply`],
//! by a document database via [`Query::selector`], or by Postgres JSONB
//! containment via [`Query::containment`].

use serde_json::{json, Map, Value};

use crate::actor::ActorRef;
use crate::state::{Markable, StateName};

/// One equality condition on a state's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `<state> == true`
    Flagged(StateName),
    /// `<state>_by == (kind, id)`
    RecordedBy { state: StateName, actor: ActorRef },
}

impl Filter {
    pub fn matches<D: Markable>(&self, doc: &D) -> bool {
        match self {
            Filter::Flagged(state) => doc.marks().is_set(state),
            Filter::RecordedBy { state, actor } => {
                doc.marks().get(state).recorded_by() == Some(actor)
            }
        }
    }
}

/// Filters over one document type, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    doc_type: String,
    filters: Vec<Filter>,
}

impl Query {
    /// A query matching every document of the type.
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            filters: Vec::new(),
        }
    }

    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn matches<D: Markable>(&self, doc: &D) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// The matching subset of `docs`, in their original order.
    pub fn apply<'a, D, I>(&self, docs: I) -> Vec<&'a D>
    where
        D: Markable,
        I: IntoIterator<Item = &'a D>,
    {
        docs.into_iter().filter(|doc| self.matches(*doc)).collect()
    }

    /// Flat criteria map in document-database form.
    ///
    /// ```text
    /// { "accepted": true, "accepted_by._type": "Accepter", "accepted_by._id": 42 }
    /// ```
    pub fn selector(&self) -> Value {
        let mut selector = Map::new();
        for filter in &self.filters {
            match filter {
                Filter::Flagged(state) => {
                    selector.insert(state.flag_field().to_string(), Value::Bool(true));
                }
                Filter::RecordedBy { state, actor } => {
                    let field = state.actor_field();
                    selector.insert(format!("{}._type", field), json!(actor.kind));
                    selector.insert(format!("{}._id", field), json!(actor.id));
                }
            }
        }
        Value::Object(selector)
    }

    /// Nested document that every matching `marks` value contains.
    ///
    /// ```text
    /// { "accepted": { "flag": true, "recorded_by": { "kind": "Accepter", "id": 42 } } }
    /// ```
    pub fn containment(&self) -> Value {
        let mut marks = Map::new();
        for filter in &self.filters {
            let (state, key, value) = match filter {
                Filter::Flagged(state) => (state, "flag", Value::Bool(true)),
                Filter::RecordedBy { state, actor } => (state, "recorded_by", json!(actor)),
            };
            let entry = marks
                .entry(state.as_str().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(fields) = entry {
                fields.insert(key.to_string(), value);
            }
        }
        Value::Object(marks)
    }
}
