//! In-memory test harness.
//!
//! Every test gets a fresh store, a fresh hook call log and a fixed clock.
//! Run with `RUST_LOG=relate=debug cargo test -- --nocapture` to see the
//! transition logs.

use chrono::{DateTime, TimeZone, Utc};
use relate::{DocumentType, InMemoryStore};
use std::sync::{Arc, Mutex};
use test_context::AsyncTestContext;

use super::{CallLog, Proposal};

pub struct TestHarness {
    /// Store holding every proposal created through the harness.
    pub store: InMemoryStore<Proposal>,
    /// Hook invocations, in order.
    pub log: CallLog,
    /// Time returned by the clock of every document type built here.
    pub now: DateTime<Utc>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // Store is dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        // Uses try_init() to avoid panicking if already initialized.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            store: InMemoryStore::new(),
            log: Arc::new(Mutex::new(Vec::new())),
            now: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    /// An unconfigured `Proposal` document type using the harness clock.
    pub fn proposals(&self) -> DocumentType<Proposal> {
        let now = self.now;
        DocumentType::new("Proposal").with_clock(move || now)
    }

    /// Creates a proposal and stores it.
    pub fn create_proposal(&self, title: &str) -> Proposal {
        let proposal = Proposal::new(title);
        self.store
            .insert("Proposal", proposal.clone())
            .expect("Failed to insert proposal");
        proposal
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.store.writes().expect("Failed to read write count")
    }
}
