//! Database Test Utilities
//!
//! Starts a throwaway PostgreSQL container and applies the embedded
//! migrations. Tests using it need Docker and are marked `#[ignore]`.

use std::sync::Arc;
use std::time::Duration;

use infra_db::{run_migrations, DatabaseConfig, DatabasePool};
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "nestmate_test";

/// Tables cleared between tests, children before parents
const TABLES: &[&str] = &[
    "revoked_tokens",
    "reviews",
    "messages",
    "conversation_participants",
    "conversations",
    "group_invitations",
    "group_members",
    "groups",
    "listing_interactions",
    "favorites",
    "listing_pictures",
    "listings",
    "roommate_profiles",
    "users",
];

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A PostgreSQL container with the schema applied
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub url: String,
    pub pool: DatabasePool,
}

impl TestDatabase {
    /// Starts a container, connects and runs the migrations
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_DB)
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            POSTGRES_USER, POSTGRES_PASSWORD, host, port, POSTGRES_DB
        );

        let config = DatabaseConfig::new(url.as_str())
            .max_connections(5)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(30));
        let pool = infra_db::create_pool(config).await?;
        run_migrations(&pool).await?;

        Ok(Self { _container: container, url, pool })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Removes every row while keeping the schema
    pub async fn clear_data(&self) -> TestResult {
        let statement = format!("TRUNCATE TABLE {} CASCADE", TABLES.join(", "));
        sqlx::query(&statement).execute(&self.pool).await?;
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// One container shared by every test in the binary
///
/// # Panics
///
/// Panics if the container cannot be started.
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// A container owned by a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}

/// Declares a Docker-backed test with its own database
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$pool:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires docker"]
        async fn $name() {
            let db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            let $pool = db.pool().clone();
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_users_last() {
        assert_eq!(TABLES.last(), Some(&"users"));
        assert!(TABLES.contains(&"listing_interactions"));
    }
}
