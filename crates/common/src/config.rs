//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Outgoing email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Superuser created at startup when missing.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Token signing and confirmation code settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used both for JWT signing and confirmation code HMACs.
    pub secret_key: String,
    /// Lifetime of issued access tokens, in seconds.
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime_secs: u64,
    /// How long a confirmation code stays valid, in seconds.
    #[serde(default = "default_confirmation_code_ttl")]
    pub confirmation_code_ttl_secs: u64,
}

/// Outgoing email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Sender address for confirmation mails.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// SMTP relay. When absent, mails are written to the log.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: default_from_address(),
            smtp: None,
        }
    }
}

/// SMTP relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS.
    #[serde(default = "default_true")]
    pub starttls: bool,
}

/// Superuser bootstrap configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Admin username.
    pub admin_username: String,
    /// Admin email.
    pub admin_email: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_access_token_lifetime() -> u64 {
    24 * 60 * 60
}

const fn default_confirmation_code_ttl() -> u64 {
    3 * 24 * 60 * 60
}

fn default_from_address() -> String {
    "admin@yamdb.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `YAMDB_ENV`)
    /// 3. Environment variables with `YAMDB__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("YAMDB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("YAMDB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
