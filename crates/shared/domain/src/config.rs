use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub feed: FeedConfig,
    pub notifications: NotificationsConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials. Not needed for `mem://`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub level: String,
    /// Extra env-filter directives, e.g. `flock_posts=debug,surrealdb=warn`.
    pub filter: Option<String>,
    /// Directory for rolling log files. Console only when absent.
    pub path: Option<PathBuf>,
    /// Write the log file as JSON lines.
    pub json: bool,
    /// `minutely`, `hourly`, `daily`, `weekly` or `never`.
    pub rotation: String,
    /// Rotated files kept in `path`.
    pub max_files: usize,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub accounts: AccountsConfig,
}

/// Credential and token policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub min_password_length: usize,
    pub token_cache_capacity: u64,
    pub token_cache_ttl_seconds: u64,
}

/// Listing limits for posts, comments and feeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub explore_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Broadcast buffer per event type before a slow consumer starts lagging.
    pub event_buffer: usize,
    /// Characters of the target content shown in a notification detail.
    pub preview_length: usize,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 4583, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "flock".to_owned(),
            database: "core".to_owned(),
            credentials: None,
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            path: None,
            json: false,
            rotation: "daily".to_owned(),
            max_files: 10,
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self { min_password_length: 8, token_cache_capacity: 10_000, token_cache_ttl_seconds: 300 }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { default_page_size: 10, max_page_size: 100, explore_limit: 50 }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { default_page_size: 20, max_page_size: 100, event_buffer: 1024, preview_length: 100 }
    }
}
