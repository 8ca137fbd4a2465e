//! Database layer for yamdb-rs.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;
use yamdb_common::error::NON_FIELD_ERRORS;
use yamdb_common::{AppError, Config};

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Convert a write error, turning unique-constraint violations into a
/// client error on the conflicting field.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            let (field, message) = unique_violation_field(&detail);
            AppError::field(field, message)
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Guess the offending field from a Postgres unique-violation message.
///
/// Constraint names follow `<table>_<column>_key` for unique columns and
/// `unique_review` for the (author, title) index.
fn unique_violation_field(detail: &str) -> (&'static str, &'static str) {
    if detail.contains("unique_review") {
        (NON_FIELD_ERRORS, "you have already reviewed this title")
    } else if detail.contains("username") {
        ("username", "a user with that username already exists")
    } else if detail.contains("email") {
        ("email", "a user with that email already exists")
    } else if detail.contains("slug") {
        ("slug", "this slug is already in use")
    } else {
        (NON_FIELD_ERRORS, "the record conflicts with an existing one")
    }
}
