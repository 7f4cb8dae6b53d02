//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and closing the MySQL connection pool
//! - Running database migrations at startup

use crate::config::Config;
use sqlx::{
    MySql, Pool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
};

/// Type alias for the MySQL connection pool.
pub type DbPool = Pool<MySql>;

/// Create the process-wide MySQL connection pool.
///
/// The pool is created once in `main` and handed to the store; nothing else
/// opens connections.
///
/// # Configuration
///
/// - Maximum connections: `MYSQL_CONNECTION_LIMIT` (10 unless overridden)
/// - Callers wait in line for a free connection once the limit is reached
/// - Idle connections are kept alive for reuse
///
/// # Errors
///
/// Returns an error if:
/// - Cannot connect to the MySQL server
/// - Database authentication fails
pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    let options = MySqlConnectOptions::new()
        .host(&config.mysql_host)
        .port(config.mysql_port)
        .username(&config.mysql_user)
        .password(&config.mysql_password)
        .database(&config.mysql_database);

    MySqlPoolOptions::new()
        .max_connections(config.mysql_connection_limit)
        .connect_with(options)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds ./migrations at compile time
    sqlx::migrate!("./migrations").run(pool).await
}

/// Close every pooled connection. Waits for checked-out connections to be returned.
pub async fn close_pool(pool: &DbPool) {
    pool.close().await;
    tracing::info!("Database pool closed");
}
