use serde::{Deserialize, Serialize};

/// Main configuration structure for haikubot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Slack API configuration
    #[serde(default)]
    pub slack: SlackConfig,

    /// Async event worker pool configuration
    #[serde(default)]
    pub events: EventsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    5555
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".haikubot/haikubot.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Slack API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Base URL of the Slack Web API. Overridable for tests against a
    /// mock server.
    #[serde(default = "default_slack_api_base")]
    pub api_base_url: String,

    /// Request timeout in seconds for outbound Slack API calls
    #[serde(default = "default_slack_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}

const fn default_slack_timeout_secs() -> u64 {
    5
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_slack_api_base(),
            timeout_secs: default_slack_timeout_secs(),
        }
    }
}

/// Worker pool for mention-triggered compositions delivered off the
/// synchronous request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventsConfig {
    /// Fixed number of event workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded queue capacity; events submitted beyond this are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

const fn default_workers() -> usize {
    4
}

const fn default_queue_capacity() -> usize {
    64
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}
