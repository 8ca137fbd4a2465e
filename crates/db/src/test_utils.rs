//! Test utilities for database operations.
//!
//! Each PostgreSQL-backed test gets its own freshly migrated database so
//! tests can run in parallel without sharing rows.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Test database configuration, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "yamdb_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "yamdb_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// URL of a database on the test server.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, database
        )
    }
}

/// A throwaway, migrated database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    config: TestDbConfig,
    name: String,
}

impl TestDatabase {
    /// Create a uniquely named database and run all migrations on it.
    pub async fn create() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("yamdb_test_{}", &suffix[..12]);

        let admin = Database::connect(&config.database_url("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{name}\""),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url(&name)).await?;
        crate::migrations::Migrator::up(&conn, None).await?;

        info!(database = %name, "Created test database");

        Ok(Self { conn, config, name })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Open a separate pool on this database for repositories, which take
    /// the connection behind an `Arc`. `drop_database` terminates it.
    pub async fn connect_shared(&self) -> Result<Arc<DatabaseConnection>, DbErr> {
        Database::connect(&self.config.database_url(&self.name))
            .await
            .map(Arc::new)
    }

    /// Name of the generated database.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop the database. Consumes self to close the connection first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let admin = Database::connect(&self.config.database_url("postgres")).await?;

        // Stray pool connections would block the drop.
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.name
                ),
            ))
            .await
            .ok();

        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.name),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.name, "Dropped test database");
        Ok(())
    }
}
