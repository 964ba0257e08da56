// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use moodcam::Config;
use moodcam::app::TriggerPolicy;
use moodcam::app::expression_overlay::VideoContentFit;
use moodcam::errors::ConfigError;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert!(
        config.overlay.mirrored,
        "Mirrored overlay should be enabled by default"
    );
    assert_eq!(config.trigger.policy, TriggerPolicy::Sequence);
    assert_eq!(config.overlay.content_fit, VideoContentFit::Contain);
    assert_eq!(
        config.session.inference_interval(),
        Duration::from_millis(100),
        "Inference should be throttled to 100ms"
    );
}

#[test]
fn test_config_default_validates() {
    assert_eq!(Config::default().validate(), Ok(()));
}

#[test]
fn test_empty_document_is_default() {
    let config = Config::from_json("{}").expect("empty object should parse");
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_section_keeps_other_fields() {
    let config = Config::from_json(r#"{ "smoothing": { "alpha": 0.5 } }"#)
        .expect("partial smoothing section should parse");
    assert_eq!(config.smoothing.alpha, 0.5);
    assert_eq!(config.smoothing.boost, 1.25);
    assert_eq!(config.smoothing.neutral_damping, 0.6);
}

#[test]
fn test_round_trip_through_pretty_json() {
    let mut config = Config::default();
    config.trigger.policy = TriggerPolicy::Combo;
    config.trigger.seed = Some(99);

    let json = config.to_json_pretty().expect("config should serialize");
    assert!(json.contains("\"combo\""));
    assert_eq!(Config::from_json(&json), Ok(config));
}

#[test]
fn test_invalid_alpha_is_rejected() {
    let err = Config::from_json(r#"{ "smoothing": { "alpha": 1.5 } }"#).unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidValue { field: "smoothing.alpha", .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_zero_interval_is_rejected() {
    let err = Config::from_json(r#"{ "session": { "inference_interval_ms": 0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "session", .. }));
}

#[test]
fn test_unknown_policy_is_a_parse_error() {
    let err = Config::from_json(r#"{ "trigger": { "policy": "lottery" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_explicit_file_is_a_read_error() {
    let err = Config::load(Some(Path::new("/nonexistent/moodcam/config.json"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
}
