//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `MYSQL_HOST`, `MYSQL_DATABASE`, `MYSQL_USER` (required): database location and account
/// - `MYSQL_PORT` (optional): defaults to 3306
/// - `MYSQL_PASSWORD` (optional): defaults to an empty password
/// - `MYSQL_CONNECTION_LIMIT` (optional): pool size, defaults to 10
/// - `WORKER_AUTH_TOKEN` (required): secret expected in the `X-Worker-Auth-Token` header
/// - `ALLOWED_BASE_DOMAIN` (required): base hostname accepted as request origin
/// - `ALLOWED_SUBDOMAINS` (optional): comma separated labels under the base domain, defaults to `www,api`
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `RUN_MIGRATIONS` (optional): apply bundled migrations at startup, defaults to true
#[derive(Clone, Deserialize)]
pub struct Config {
    pub mysql_host: String,

    #[serde(default = "default_mysql_port")]
    pub mysql_port: u16,

    pub mysql_database: String,

    pub mysql_user: String,

    #[serde(default)]
    pub mysql_password: String,

    #[serde(default = "default_connection_limit")]
    pub mysql_connection_limit: u32,

    pub worker_auth_token: String,

    pub allowed_base_domain: String,

    #[serde(default = "default_subdomains")]
    pub allowed_subdomains: Vec<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_connection_limit() -> u32 {
    10
}

fn default_subdomains() -> Vec<String> {
    vec!["www".to_string(), "api".to_string()]
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_run_migrations() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., WORKER_AUTH_TOKEN)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are converted automatically: mysql_host -> MYSQL_HOST
        envy::from_env::<Config>()
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mysql_host", &self.mysql_host)
            .field("mysql_port", &self.mysql_port)
            .field("mysql_database", &self.mysql_database)
            .field("mysql_user", &self.mysql_user)
            .field("mysql_password", &"<redacted>")
            .field("mysql_connection_limit", &self.mysql_connection_limit)
            .field("worker_auth_token", &"<redacted>")
            .field("allowed_base_domain", &self.allowed_base_domain)
            .field("allowed_subdomains", &self.allowed_subdomains)
            .field("server_port", &self.server_port)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}
