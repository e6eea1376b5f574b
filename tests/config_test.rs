//! Integration tests for configuration loading.

use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::tempdir;

use userstore::config::{load_config, load_config_or_default, Config, DATABASE_URL_ENV};
use userstore_db::config::DatabaseLocation;

#[test]
#[serial]
fn load_full_config() {
    std::env::remove_var(DATABASE_URL_ENV);
    let temp = tempdir().unwrap();
    let path = temp.path().join("userstore.toml");
    fs::write(
        &path,
        r#"
[database]
url = "sqlite://data/users.db"

[pool]
max_pool_size = 4
max_overflow = 2
acquisition_timeout_secs = 5
recycle_age_secs = 600
busy_timeout_ms = 250
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    let pool = config.pool_configuration().unwrap();

    assert_eq!(pool.location(), &DatabaseLocation::file("data/users.db"));
    assert_eq!(pool.max_pool_size(), 4);
    assert_eq!(pool.max_overflow(), 2);
    assert_eq!(pool.acquisition_timeout(), Duration::from_secs(5));
    assert_eq!(pool.recycle_age(), Duration::from_secs(600));
    assert_eq!(pool.busy_timeout(), Duration::from_millis(250));
}

#[test]
#[serial]
fn empty_file_gives_defaults() {
    std::env::remove_var(DATABASE_URL_ENV);
    let temp = tempdir().unwrap();
    let path = temp.path().join("userstore.toml");
    fs::write(&path, "").unwrap();

    assert_eq!(load_config(&path).unwrap(), Config::default());
}

#[test]
#[serial]
fn invalid_settings_name_the_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "[pool]\nacquisition_timeout_secs = 0\n").unwrap();

    let err = load_config(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("bad.toml"), "{message}");
    assert!(message.contains("timeout"), "{message}");
}

#[test]
#[serial]
fn malformed_toml_is_reported() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("broken.toml");
    fs::write(&path, "[pool\nmax_pool_size = ").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
#[serial]
fn missing_file_is_reported() {
    let temp = tempdir().unwrap();
    let err = load_config(&temp.path().join("absent.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));
}

#[test]
#[serial]
fn environment_overrides_database_url() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("userstore.toml");
    fs::write(&path, "[database]\nurl = \"sqlite://from-file.db\"\n").unwrap();

    std::env::set_var(DATABASE_URL_ENV, "sqlite::memory:override");
    let from_file = load_config(&path);
    let from_defaults = load_config_or_default(Some(&path));
    std::env::remove_var(DATABASE_URL_ENV);

    assert_eq!(from_file.unwrap().database.url, "sqlite::memory:override");
    assert_eq!(
        from_defaults.unwrap().pool_configuration().unwrap().location(),
        &DatabaseLocation::Memory(Some("override".to_string()))
    );
}

#[test]
#[serial]
fn bad_environment_url_is_rejected() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("userstore.toml");
    fs::write(&path, "").unwrap();

    std::env::set_var(DATABASE_URL_ENV, "mysql://localhost/users");
    let result = load_config(&path);
    std::env::remove_var(DATABASE_URL_ENV);

    assert!(result.is_err());
}
