//! Test harness with testcontainers for the Postgres store.
//!
//! One shared container for the whole run; migrations run once on first use.
//! Tests using it are `#[ignore]`d because they need Docker:
//! `cargo test -- --ignored`

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use matchday_core::domains::game_events::{CategoryTable, PeriodScheme, PostgresGameEventStore};

struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
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

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh pool and store per test, shared database.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// #[ignore = "needs Docker"]
/// async fn my_test(ctx: &TestHarness) {
///     let events = ctx.store.fetch_events(aggregate).await?;
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub store: PostgresGameEventStore,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;
        let store = PostgresGameEventStore::new(
            db_pool.clone(),
            Arc::new(CategoryTable::current()),
            PeriodScheme::default(),
        );

        Ok(Self { db_pool, store })
    }
}
