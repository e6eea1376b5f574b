use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pool: PoolSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// Database URL: `sqlite://path`, `sqlite::memory:` or `sqlite::memory:name`
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "sqlite://userstore.db".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolSettings {
    /// Warm connections kept open for reuse (default: 10)
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,

    /// Extra transient connections allowed under burst load (default: 20)
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,

    /// How long `acquire` waits before giving up (default: 30)
    #[serde(default = "default_acquisition_timeout")]
    pub acquisition_timeout_secs: u64,

    /// Connections older than this are replaced (default: 3600)
    #[serde(default = "default_recycle_age")]
    pub recycle_age_secs: u64,

    /// How long a statement waits on a locked database file (default: 5000)
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_max_pool_size() -> u32 {
    10
}
fn default_max_overflow() -> u32 {
    20
}
fn default_acquisition_timeout() -> u64 {
    30
}
fn default_recycle_age() -> u64 {
    3600
}
fn default_busy_timeout() -> u64 {
    5000
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_pool_size: default_max_pool_size(),
            max_overflow: default_max_overflow(),
            acquisition_timeout_secs: default_acquisition_timeout(),
            recycle_age_secs: default_recycle_age(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}
