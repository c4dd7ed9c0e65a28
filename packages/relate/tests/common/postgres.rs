//! Postgres test harness with testcontainers.
//!
//! One container is shared by all tests; migrations run once, on first use.

use anyhow::{Context, Result};
use relate::{PgDocumentStore, StoreConfig};
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared test infrastructure that persists across all tests.
struct SharedPostgres {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_POSTGRES: OnceCell<SharedPostgres> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let store = PgDocumentStore::connect(&StoreConfig::new(db_url.clone()))
            .await
            .context("Failed to connect to Postgres for migrations")?;
        store.migrate().await.context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_POSTGRES
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared Postgres")
            })
            .await
    }
}

pub struct PgHarness {
    pub store: PgDocumentStore,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        let shared = SharedPostgres::get().await;
        let store = PgDocumentStore::connect(&StoreConfig::new(shared.db_url.clone()))
            .await
            .expect("Failed to connect to shared Postgres");
        Self { store }
    }

    async fn teardown(self) {
        // Pool is dropped with the harness
    }
}
