mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use userstore_db::config::{DatabaseLocation, PoolConfiguration};

/// Environment variable that overrides `database.url`.
pub const DATABASE_URL_ENV: &str = "USERSTORE_DATABASE_URL";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);

    config
        .pool_configuration()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./userstore.toml",
        "~/.config/userstore/config.toml",
        "/etc/userstore/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    config
        .pool_configuration()
        .context("Invalid default configuration")?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        if !url.is_empty() {
            tracing::debug!(url = %url, "Database URL overridden from environment");
            config.database.url = url;
        }
    }
}

impl Config {
    /// Build the validated pool configuration these settings describe.
    pub fn pool_configuration(&self) -> Result<PoolConfiguration> {
        let location = DatabaseLocation::parse(&self.database.url)
            .with_context(|| format!("Invalid database url: {}", self.database.url))?;

        let config = PoolConfiguration::new(location)
            .with_max_pool_size(self.pool.max_pool_size)
            .with_max_overflow(self.pool.max_overflow)
            .with_acquisition_timeout(Duration::from_secs(self.pool.acquisition_timeout_secs))
            .with_recycle_age(Duration::from_secs(self.pool.recycle_age_secs))
            .with_busy_timeout(Duration::from_millis(self.pool.busy_timeout_ms));

        config.validate().context("Invalid pool settings")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite://userstore.db");
        assert_eq!(config.pool.max_pool_size, 10);
        assert_eq!(config.pool.max_overflow, 20);

        let pool = config.pool_configuration().unwrap();
        assert_eq!(pool.acquisition_timeout(), Duration::from_secs(30));
        assert_eq!(pool.recycle_age(), Duration::from_secs(3600));
        assert_eq!(pool.busy_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[pool]
max_pool_size = 2
"#,
        )
        .unwrap();
        assert_eq!(config.pool.max_pool_size, 2);
        assert_eq!(config.pool.max_overflow, 20);
        assert_eq!(config.database, DatabaseSettings::default());
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let mut config = Config::default();
        config.pool.max_pool_size = 0;
        assert!(config.pool_configuration().is_err());
    }

    #[test]
    fn test_huge_timeout_is_rejected() {
        let config: Config = toml::from_str(
            r#"
[pool]
acquisition_timeout_secs = 9223372036854775807
"#,
        )
        .unwrap();
        let err = config.pool_configuration().unwrap_err();
        assert!(format!("{err:#}").contains("acquisition_timeout"));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let mut config = Config::default();
        config.database.url = "postgres://localhost/users".to_string();
        let err = config.pool_configuration().unwrap_err();
        assert!(format!("{err:#}").contains("postgres://localhost/users"));
    }
}
