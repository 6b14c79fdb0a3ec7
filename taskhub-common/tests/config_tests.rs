//! Unit tests for configuration resolution
//!
//! Tests that touch TASKHUB_ROOT_FOLDER are marked #[serial] so they do not
//! race on the process environment.

use serial_test::serial;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use taskhub_common::config::{
    CliOverrides, RootFolderInitializer, RootFolderResolver, ServerConfig, TomlConfig,
    DEFAULT_EVENT_BUFFER, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, ROOT_FOLDER_ENV,
};
use taskhub_common::Error;

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolver = RootFolderResolver::new(
        Some(PathBuf::from("/from/cli")),
        Some(PathBuf::from("/from/toml")),
    );
    assert_eq!(resolver.resolve(), PathBuf::from("/from/cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/from/toml")));
    assert_eq!(resolver.resolve(), PathBuf::from("/from/env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/from/toml")));
    assert_eq!(resolver.resolve(), PathBuf::from("/from/toml"));

    let fallback = RootFolderResolver::new(None, None).resolve();
    assert!(fallback.ends_with("taskhub") || fallback.ends_with("taskhub_data"));
}

#[test]
fn test_toml_config_parses_known_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "root_folder = \"/srv/taskhub\"\nport = 8080\nmax_upload_bytes = 1024\n",
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/taskhub")));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.max_upload_bytes, Some(1024));
    assert_eq!(config.bind_address, None);
}

#[test]
fn test_malformed_toml_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(TomlConfig::load(&path).is_err());
    assert_eq!(TomlConfig::load_or_default(Some(&path)), TomlConfig::default());
}

#[test]
fn test_missing_toml_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert_eq!(TomlConfig::load_or_default(Some(&path)), TomlConfig::default());
}

#[test]
#[serial]
fn test_server_config_merge_order() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        bind_address: Some("127.0.0.1".to_string()),
        port: Some(4000),
        max_upload_bytes: None,
        event_buffer: Some(0),
    };
    let cli = CliOverrides {
        port: Some(5000),
        ..Default::default()
    };

    let config = ServerConfig::resolve(cli, toml);

    assert_eq!(config.root_folder, PathBuf::from("/from/toml"));
    assert_eq!(config.port, 5000);
    assert_eq!(
        config.listen_address().unwrap(),
        "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
    );
    assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    // Zero would make the broadcast channel panic
    assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);

    let defaults = ServerConfig::resolve(CliOverrides::default(), TomlConfig::default());
    assert_eq!(defaults.port, DEFAULT_PORT);
}

#[test]
fn test_listen_address_accepts_ipv6_and_rejects_hostnames() {
    let mut config = ServerConfig::resolve(CliOverrides::default(), TomlConfig::default());
    config.port = 5000;

    config.bind_address = "::".to_string();
    let v6 = config.listen_address().unwrap();
    assert!(v6.is_ipv6());
    assert_eq!(v6.to_string(), "[::]:5000");

    config.bind_address = "::1".to_string();
    assert_eq!(config.listen_address().unwrap().to_string(), "[::1]:5000");

    config.bind_address = "0.0.0.0".to_string();
    assert_eq!(config.listen_address().unwrap().to_string(), "0.0.0.0:5000");

    config.bind_address = "not an address".to_string();
    assert!(matches!(config.listen_address(), Err(Error::Config(_))));
}

#[test]
fn test_initializer_creates_uploads_dir() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();

    assert!(initializer.uploads_path().is_dir());
    assert_eq!(initializer.database_path(), root.join("taskhub.db"));
}
