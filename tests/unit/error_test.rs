//! Tests for error types

use std::time::Duration;

use lookahead_pool::{AppResult, ConfigError, PoolError, ProducerError, WorkUnit};

#[test]
fn test_missing_routine_error() {
    let err = ConfigError::MissingRoutine;
    assert_eq!(format!("{}", err), "no routine for the lookahead producer to run");
}

#[test]
fn test_invalid_chunk_size_error() {
    let err = ConfigError::InvalidChunkSize;
    assert_eq!(format!("{}", err), "chunk size must be greater than 0");
}

#[test]
fn test_env_error() {
    let err = ConfigError::Env {
        key: "POOL_LIMIT".to_string(),
        value: "many".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "environment variable `POOL_LIMIT` has invalid value \"many\""
    );
}

#[test]
fn test_pool_errors() {
    let err = PoolError::AtCapacity {
        limit: 4,
        unit: WorkUnit::new(|| {}),
    };
    assert_eq!(format!("{}", err), "pool is at capacity (4 running units)");

    let err = PoolError::Timeout {
        waited: Duration::from_millis(250),
        unit: WorkUnit::empty(),
    };
    assert_eq!(format!("{}", err), "no pool slot freed within 250ms");

    let err = PoolError::InvalidUnit("unit has no body to run".to_string());
    assert_eq!(format!("{}", err), "cannot admit unit: unit has no body to run");
    assert!(err.into_unit().is_none());
}

#[test]
fn test_producer_errors() {
    let err = ProducerError::RoutineFailed("disk gone".to_string());
    assert_eq!(format!("{}", err), "producer routine failed: disk gone");
    assert_eq!(format!("{}", ProducerError::Panicked), "producer thread panicked");
}

#[test]
fn test_errors_convert_into_app_result() {
    fn fails() -> AppResult<()> {
        Err(PoolError::InvalidUnit("x".to_string()))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<PoolError>().is_some());
}
