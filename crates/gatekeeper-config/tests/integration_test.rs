//! Integration tests for gatekeeper-config crate.

use gatekeeper_common::test_utils::config_fixtures;
use gatekeeper_config::{Config, ConfigCache, ConfigLoader, StorageBackend};
use std::io::Write;

#[test]
fn test_default_config_validation() {
    let mut config = Config::default();

    // Local use needs no token, the chat adapter does
    assert!(config.validate().is_ok());
    assert!(config.validate_for_chat().is_err());

    config.bot.token = "test_token".to_string();
    assert!(config.validate_for_chat().is_ok());
}

#[test]
fn test_minimal_fixture_parses() {
    let config = ConfigLoader::parse(config_fixtures::minimal_config_yaml()).unwrap();

    assert_eq!(config.bot.token, "test_token");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_fixture_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config_fixtures::full_config_yaml().as_bytes())
        .unwrap();

    let config = ConfigLoader::parse(&std::fs::read_to_string(file.path()).unwrap()).unwrap();

    assert_eq!(config.auth.demo_password, "hunter2");
    assert_eq!(config.downloads.tick_interval_ms, 250);
    assert_eq!(config.downloads.single_step_delay_ms, 1500);
    assert_eq!(config.bot.typing_delay_ms, 0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_cache() {
    let config = Config::default();
    let cache = ConfigCache::new(config.clone());

    let cached_config = cache.get();
    assert_eq!(cached_config.bot.prefix, config.bot.prefix);

    let mut new_config = config.clone();
    new_config.bot.prefix = "!".to_string();
    cache.update(new_config).unwrap();
    assert_eq!(cache.get().bot.prefix, "!");

    // Invalid updates are rejected and the previous value stays
    let mut broken = config;
    broken.downloads.max_step = 0;
    assert!(cache.update(broken).is_err());
    assert_eq!(cache.get().bot.prefix, "!");
}
