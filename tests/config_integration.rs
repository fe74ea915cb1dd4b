//! Integration tests for declarative retry configuration

#![cfg(feature = "serde")]

use std::time::Duration;

use tidewater::config::{Backoff, ConfigError, JitterConfig, RetryConfig};
use tidewater::prelude::*;
use tidewater::testing::RecordingSleeper;

fn ms(n: u64) -> PositiveDuration {
    PositiveDuration::from_millis(n)
}

#[test]
fn json_round_trip_preserves_config() {
    let config = RetryConfig::new(Backoff::Linear {
        seed_ms: 20,
        factor: 0.5,
    })
    .with_max_retries(4)
    .with_max_delay_ms(40)
    .with_jitter(JitterConfig::Between {
        min_ms: 0,
        max_ms: 5,
    })
    .with_seed(9);

    let json = serde_json::to_string(&config).unwrap();
    let parsed: RetryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let first: Vec<_> = parsed.build().unwrap().delays().collect();
    let second: Vec<_> = config.build().unwrap().delays().collect();
    assert_eq!(first, second);
}

#[test]
fn unset_options_are_not_serialized() {
    let config = RetryConfig::new(Backoff::Fibonacci { seed_ms: 5 }).with_max_retries(2);
    let value = serde_json::to_value(&config).unwrap();

    assert_eq!(
        value,
        serde_json::json!({
            "backoff": { "kind": "fibonacci", "seed_ms": 5 },
            "max_retries": 2,
            "no_delay_on_first_retry": false
        })
    );
}

#[test]
fn config_from_file_drives_a_run() {
    let json = r#"{
        "backoff": { "kind": "exponential", "seed_ms": 10 },
        "max_retries": 3,
        "max_delay_ms": 25,
        "no_delay_on_first_retry": true
    }"#;
    let schedule = serde_json::from_str::<RetryConfig>(json)
        .unwrap()
        .build()
        .unwrap();

    let expected: Vec<PositiveDuration> = exponential(ms(10), 2.0)
        .max_delay(ms(25))
        .no_delay_on_first_retry()
        .union(recurs(3))
        .delays()
        .collect();

    let sleeper = RecordingSleeper::new();
    let result = Runner::new()
        .with_sleeper(sleeper.clone())
        .retry(&schedule, || Err::<(), _>("offline"));

    assert_eq!(result, Err(RunError::Failed("offline")));
    assert_eq!(
        sleeper.recorded(),
        expected.iter().map(|d| d.as_duration()).collect::<Vec<_>>()
    );
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::ZERO,
            Duration::from_millis(20),
            Duration::from_millis(25)
        ]
    );
}

#[test]
fn unknown_backoff_kind_is_rejected() {
    let err = serde_json::from_str::<RetryConfig>(
        r#"{ "backoff": { "kind": "quadratic", "seed_ms": 1 }, "max_retries": 1 }"#,
    );
    assert!(err.is_err());
}

#[test]
fn unbounded_file_config_fails_to_build() {
    let config: RetryConfig =
        serde_json::from_str(r#"{ "backoff": { "kind": "spaced", "delay_ms": 100 } }"#).unwrap();
    assert_eq!(config.build().err(), Some(ConfigError::Unbounded));
}
