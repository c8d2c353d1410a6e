//! Test harness with testcontainers for the MySQL integration tests.
//!
//! One MySQL container is shared by every test. Each test gets its own pair
//! of databases (legacy 2.x and destination 3.x) inside it, so tests never
//! see each other's rows.

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::atomic::{AtomicU32, Ordering};
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::mysql::Mysql;
use tokio::sync::OnceCell;

use super::fixtures::{DESTINATION_SCHEMA, LEGACY_SCHEMA};

/// Shared container that persists across all tests
struct SharedTestInfra {
    server_url: String,
    // Keep the container alive for the entire test run
    _mysql: ContainerAsync<Mysql>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

static NEXT_DATABASE: AtomicU32 = AtomicU32::new(0);

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mysql = Mysql::default()
            .with_tag("8.0")
            .start()
            .await
            .context("Failed to start MySQL container")?;

        let host = mysql.get_host().await?;
        let port = mysql.get_host_port_ipv4(3306).await?;

        Ok(Self {
            server_url: format!("mysql://root@{}:{}", host, port),
            _mysql: mysql,
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

/// A fresh legacy database and a fresh destination database
///
/// # Example using test-context
///
/// ```ignore
/// #[test_context(MysqlHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut MysqlHarness) {
///     let source = MySqlLegacySource::connect(&ctx.legacy_url).await.unwrap();
///     // ... test code
/// }
/// ```
pub struct MysqlHarness {
    pub legacy_url: String,
    pub destination_url: String,
    /// Pool for seeding the legacy tables
    pub legacy_pool: MySqlPool,
    /// Pool for inspecting the migrated rows
    pub destination_pool: MySqlPool,
}

impl AsyncTestContext for MysqlHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.legacy_pool.close().await;
        self.destination_pool.close().await;
    }
}

impl MysqlHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let suffix = format!(
            "{}_{}",
            std::process::id(),
            NEXT_DATABASE.fetch_add(1, Ordering::SeqCst)
        );

        let legacy_url = create_database(infra, &format!("pasteme_v2_{}", suffix)).await?;
        let destination_url = create_database(infra, &format!("pasteme_v3_{}", suffix)).await?;

        let legacy_pool = MySqlPool::connect(&legacy_url)
            .await
            .context("Failed to connect to legacy database")?;
        let destination_pool = MySqlPool::connect(&destination_url)
            .await
            .context("Failed to connect to destination database")?;

        run_statements(&legacy_pool, LEGACY_SCHEMA).await?;
        run_statements(&destination_pool, DESTINATION_SCHEMA).await?;

        Ok(Self {
            legacy_url,
            destination_url,
            legacy_pool,
            destination_pool,
        })
    }
}

async fn create_database(infra: &SharedTestInfra, name: &str) -> Result<String> {
    let admin = MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&format!("{}/test", infra.server_url))
        .await
        .context("Failed to connect to MySQL server")?;

    sqlx::query(&format!(
        "CREATE DATABASE `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
        name
    ))
    .execute(&admin)
    .await
    .with_context(|| format!("Failed to create database {}", name))?;
    admin.close().await;

    Ok(format!("{}/{}", infra.server_url, name))
}

async fn run_statements(pool: &MySqlPool, statements: &[&str]) -> Result<()> {
    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to run: {}", statement))?;
    }
    Ok(())
}
