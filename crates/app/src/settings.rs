//! Settings for the `tally` binary.
//!
//! Read from `settings.toml` (or the file named by `TALLY_CONFIG`), then
//! overridden by `TALLY__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
    Postgres(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    /// IANA name of the timezone weeks are computed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Queue {
        #[serde(default = "default_queue")]
        name: String,
    },
    Webhook {
        url: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for Channel {
    fn default() -> Self {
        Self::Queue {
            name: default_queue(),
        }
    }
}

fn default_queue() -> String {
    engine::DEFAULT_QUEUE.to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize)]
pub struct Notifications {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub channel: Channel,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            channel: Channel::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub notifications: Notifications,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let path = std::env::var("TALLY_CONFIG").unwrap_or_else(|_| "settings".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
