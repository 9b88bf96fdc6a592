//! Config environment variable tests
//!
//! These tests verify that Config::from_env() reads and applies environment
//! variable overrides. Every test sets LANGBASE_API_KEY itself so nothing
//! depends on a local .env file.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use bsi_read_analysis::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

fn with_api_key() {
    env::set_var("LANGBASE_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    with_api_key();
    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.api_key, "test-key");
}

#[test]
#[serial]
fn test_config_from_env_custom_base_url() {
    with_api_key();
    env::set_var("LANGBASE_BASE_URL", "https://custom.api.com");

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.base_url, "https://custom.api.com");

    env::remove_var("LANGBASE_BASE_URL");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    with_api_key();
    env::set_var("DATABASE_PATH", "/custom/reads.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/reads.db");
    assert_eq!(config.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    with_api_key();
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_from_env_custom_request() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "5000");
    env::set_var("MAX_RETRIES", "1");
    env::set_var("RETRY_DELAY_MS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 5000);
    assert_eq!(config.request.max_retries, 1);
    assert_eq!(config.request.retry_delay_ms, 10);

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("RETRY_DELAY_MS");
}

#[test]
#[serial]
fn test_config_from_env_custom_pipes() {
    with_api_key();
    env::set_var("PIPE_CONTRADICTION", "contra-v2");
    env::set_var("PIPE_PRECEDENT", "history-v2");
    env::set_var("DETECTOR_TIMEOUT_MS", "750");

    let config = Config::from_env().unwrap();
    assert_eq!(config.pipes.contradiction, "contra-v2");
    assert_eq!(config.pipes.precedent, "history-v2");
    assert_eq!(config.pipes.detector_timeout_ms, 750);

    env::remove_var("PIPE_CONTRADICTION");
    env::remove_var("PIPE_PRECEDENT");
    env::remove_var("DETECTOR_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    with_api_key();
    env::set_var("DETECTOR_TIMEOUT_MS", "soon");

    let config = Config::from_env().unwrap();
    assert_eq!(config.pipes.detector_timeout_ms, 127000);

    env::remove_var("DETECTOR_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_detector_timeout_follows_request_budget() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "5000");
    env::set_var("MAX_RETRIES", "1");
    env::set_var("RETRY_DELAY_MS", "10");

    let config = Config::from_env().unwrap();
    // Two 5s attempts and one 10ms backoff
    assert_eq!(config.pipes.detector_timeout_ms, 10010);
    assert!(config.pipes.detector_timeout_ms >= config.request.call_budget_ms());

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("RETRY_DELAY_MS");
}

#[test]
#[serial]
fn test_config_from_env_log_level() {
    with_api_key();
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "debug");

    env::remove_var("LOG_LEVEL");
}
