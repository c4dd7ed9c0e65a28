//! The four stock relations: acceptable, confirmable, ignorable, rejectable.
//!
//! Each is the generic markable state under a fixed name, plus named
//! shorthands on [`DocumentType`]:
//!
//! | relation      | configure     | check            | queries                        | transition |
//! |---------------|---------------|------------------|--------------------------------|------------|
//! | `Acceptable`  | `acceptable`  | `is_acceptable`  | `accepted`, `accepted_by`      | `accept`   |
//! | `Confirmable` | `confirmable` | `is_confirmable` | `confirmed`, `confirmed_by`    | `confirm`  |
//! | `Ignorable`   | `ignorable`   | `is_ignorable`   | `ignored`, `ignored_by`        | `ignore`   |
//! | `Rejectable`  | `rejectable`  | `is_rejectable`  | `rejected`, `rejected_by`      | `reject`   |

use std::fmt;
use std::str::FromStr;

use crate::actor::Actor;
use crate::document::DocumentType;
use crate::error::Result;
use crate::hooks::MarkOptions;
use crate::query::Query;
use crate::state::{Markable, StateName};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Acceptable,
    Confirmable,
    Ignorable,
    Rejectable,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Acceptable,
        Relation::Confirmable,
        Relation::Ignorable,
        Relation::Rejectable,
    ];

    pub fn state_name(self) -> StateName {
        match self {
            Relation::Acceptable => StateName::ACCEPTED,
            Relation::Confirmable => StateName::CONFIRMED,
            Relation::Ignorable => StateName::IGNORED,
            Relation::Rejectable => StateName::REJECTED,
        }
    }

    /// Transition verb, e.g. `accept`.
    pub fn verb(self) -> &'static str {
        match self {
            Relation::Acceptable => "accept",
            Relation::Confirmable => "confirm",
            Relation::Ignorable => "ignore",
            Relation::Rejectable => "reject",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Acceptable => write!(f, "acceptable"),
            Relation::Confirmable => write!(f, "confirmable"),
            Relation::Ignorable => write!(f, "ignorable"),
            Relation::Rejectable => write!(f, "rejectable"),
        }
    }
}

impl FromStr for Relation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "acceptable" => Ok(Relation::Acceptable),
            "confirmable" => Ok(Relation::Confirmable),
            "ignorable" => Ok(Relation::Ignorable),
            "rejectable" => Ok(Relation::Rejectable),
            _ => Err(anyhow::anyhow!("Invalid relation: {}", s)),
        }
    }
}

impl<D: Markable> DocumentType<D> {
    /// Installs a stock relation by value, e.g. from configuration.
    pub fn relate(&mut self, relation: Relation, options: MarkOptions<D>) -> &mut Self {
        self.configure(relation.state_name(), options)
    }
}

macro_rules! relation_shorthands {
    ($(
        $state:ident => {
            configure: $configure:ident,
            check: $check:ident,
            flagged: $flagged:ident,
            flagged_by: $flagged_by:ident,
            transition: $transition:ident $(,)?
        }
    )*) => {
        impl<D: Markable> DocumentType<D> {
            $(
                #[doc = concat!("Installs the `", stringify!($flagged), "` state; see [`DocumentType::configure`].")]
                pub fn $configure(&mut self, options: MarkOptions<D>) -> &mut Self {
                    self.configure(StateName::$state, options)
                }

                pub fn $check(&self) -> bool {
                    self.is_configured(&StateName::$state)
                }

                #[doc = concat!("Documents that are `", stringify!($flagged), "`.")]
                pub fn $flagged(&self) -> Result<Query> {
                    self.flagged(&StateName::$state)
                }

                #[doc = concat!("Documents that `actor` has ", stringify!($flagged), ".")]
                pub fn $flagged_by<A: Actor + ?Sized>(&self, actor: &A) -> Result<Query> {
                    self.flagged_by(&StateName::$state, actor)
                }

                #[doc = concat!("Marks `doc` as ", stringify!($flagged), "; see [`DocumentType::transition`].")]
                pub async fn $transition<A, S>(&self, doc: &mut D, actor: &A, store: &S) -> Result<bool>
                where
                    A: Actor + ?Sized,
                    S: DocumentStore<D> + ?Sized,
                {
                    self.transition(&StateName::$state, doc, actor, store).await
                }
            )*
        }
    };
}

relation_shorthands! {
    ACCEPTED => {
        configure: acceptable,
        check: is_acceptable,
        flagged: accepted,
        flagged_by: accepted_by,
        transition: accept,
    }
    CONFIRMED => {
        configure: confirmable,
        check: is_confirmable,
        flagged: confirmed,
        flagged_by: confirmed_by,
        transition: confirm,
    }
    IGNORED => {
        configure: ignorable,
        check: is_ignorable,
        flagged: ignored,
        flagged_by: ignored_by,
        transition: ignore,
    }
    REJECTED => {
        configure: rejectable,
        check: is_rejectable,
        flagged: rejected,
        flagged_by: rejected_by,
        transition: reject,
    }
}
