//! Tests for configuration validation

use std::collections::HashMap;

use lookahead_pool::config::toolkit::{ENV_POLL_INTERVAL_MS, ENV_POOL_LIMIT, ENV_QUEUE_CAPACITY};
use lookahead_pool::{ConfigError, PoolConfig, ProducerConfig, ToolkitConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = ToolkitConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.producer.queue_capacity, 65_536);
    assert_eq!(config.producer.poll_interval_ms, 250);
    assert_eq!(config.pool.limit, 128);
}

#[test]
fn test_producer_config_invalid_capacity() {
    let invalid = ProducerConfig::new().with_queue_capacity(0);
    assert_eq!(invalid.validate(), Err(ConfigError::InvalidQueueCapacity));
}

#[test]
fn test_producer_config_invalid_poll_interval() {
    let invalid = ProducerConfig {
        poll_interval_ms: 0,
        ..ProducerConfig::default()
    };
    assert_eq!(invalid.validate(), Err(ConfigError::InvalidPollInterval));
}

#[test]
fn test_pool_config_invalid_limit() {
    assert_eq!(PoolConfig::with_limit(0).validate(), Err(ConfigError::InvalidLimit));
    assert!(PoolConfig::with_limit(1).validate().is_ok());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "producer": {
            "queueCapacity": 16,
            "poll_interval_ms": 100
        },
        "pool": {
            "limit": 8
        }
    }"#;

    let config = ToolkitConfig::from_json_str(json).expect("valid json");
    assert_eq!(config.producer.queue_capacity, 16);
    assert_eq!(config.producer.poll_interval_ms, 100);
    assert_eq!(config.producer.thread_name, "lookahead-producer");
    assert_eq!(config.pool.limit, 8);
}

#[test]
fn test_config_from_json_rejects_invalid_values() {
    let err = ToolkitConfig::from_json_str(r#"{"pool": {"limit": 0}}"#).unwrap_err();
    assert_eq!(err, ConfigError::InvalidLimit);

    let err = ToolkitConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_from_lookup() {
    let config = ToolkitConfig::from_lookup(lookup(&[
        (ENV_QUEUE_CAPACITY, "32"),
        (ENV_POLL_INTERVAL_MS, " 75 "),
        (ENV_POOL_LIMIT, "4"),
    ]))
    .expect("valid environment");

    assert_eq!(config.producer.queue_capacity, 32);
    assert_eq!(config.producer.poll_interval_ms, 75);
    assert_eq!(config.pool.limit, 4);
}

#[test]
fn test_config_from_lookup_bad_value() {
    let err = ToolkitConfig::from_lookup(lookup(&[(ENV_POOL_LIMIT, "lots")])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Env {
            key: ENV_POOL_LIMIT.to_string(),
            value: "lots".to_string(),
        }
    );
}

#[test]
fn test_config_from_lookup_without_overrides() {
    let config = ToolkitConfig::from_lookup(|_| None).expect("defaults are valid");
    assert_eq!(config, ToolkitConfig::default());
}
