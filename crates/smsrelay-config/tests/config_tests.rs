// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the smsrelay configuration system.

use std::path::Path;

use smsrelay_config::diagnostic::{ConfigError, suggest_key};
use smsrelay_config::model::SmsRelayConfig;
use smsrelay_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every known field deserializes.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[service]
name = "relay-test"
log_level = "debug"

[storage]
database_path = "/tmp/relay.db"
wal_mode = false
busy_timeout_ms = 250

[gateway]
host = "0.0.0.0"
port = 8080
api_prefix = "/api/sms"
subscriber_buffer = 8
permissive_cors = false

[query]
default_limit = 25
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "relay-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/relay.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 250);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.api_prefix, "/api/sms");
    assert_eq!(config.gateway.subscriber_buffer, 8);
    assert!(!config.gateway.permissive_cors);
    assert_eq!(config.query.default_limit, 25);
}

/// An empty file yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert_eq!(config, SmsRelayConfig::default());
    assert_eq!(config.gateway.port, 3515);
    assert_eq!(config.gateway.api_prefix, "/v1/sms");
    assert_eq!(config.query.default_limit, 10);
}

/// A partial section keeps defaults for the keys it omits.
#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[gateway]\nport = 9000\n").unwrap();
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.subscriber_buffer, 64);
}

#[test]
fn unknown_field_is_rejected() {
    let err = load_config_from_str("[gateway]\nprot = 1\n").expect_err("should reject unknown key");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_section_is_rejected() {
    assert!(load_config_from_str("[auth]\ntoken = \"x\"\n").is_err());
}

/// The diagnostic for a typo carries a suggestion and a source span.
#[test]
fn typo_produces_unknown_key_with_suggestion() {
    let errors = load_and_validate_str("[gateway]\nprot = 1\n").expect_err("typo should fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "prot");
            assert_eq!(suggestion.as_deref(), Some("port"));
            assert!(span.is_some(), "inline source should be located");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    assert!(
        matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.contains("port")),
        "got {errors:?}"
    );
}

#[test]
fn validation_runs_after_deserialization() {
    let errors = load_and_validate_str("[query]\ndefault_limit = 0\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { .. }));
}

#[test]
fn suggest_key_matches_section_names() {
    let sections = &["service", "storage", "gateway", "query"];
    assert_eq!(suggest_key("gatway", sections), Some("gateway".to_string()));
    assert_eq!(suggest_key("storge", sections), Some("storage".to_string()));
}

/// Environment variables override file values.
#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("relay.toml", "[gateway]\nport = 4000\napi_prefix = \"/file\"\n")?;
        jail.set_env("SMSRELAY_GATEWAY_PORT", "5000");
        jail.set_env("SMSRELAY_GATEWAY_API_PREFIX", "/from-env");
        jail.set_env("SMSRELAY_QUERY_DEFAULT_LIMIT", "3");

        let config = load_and_validate_path(Path::new("relay.toml"))
            .map_err(|errs| format!("{errs:?}"))?;
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.gateway.api_prefix, "/from-env");
        assert_eq!(config.query.default_limit, 3);
        Ok(())
    });
}

#[test]
fn env_override_is_validated() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("relay.toml", "")?;
        jail.set_env("SMSRELAY_GATEWAY_SUBSCRIBER_BUFFER", "0");

        let result = load_and_validate_path(Path::new("relay.toml"));
        assert!(result.is_err());
        Ok(())
    });
}

#[test]
fn explicit_path_must_exist() {
    let errors = load_and_validate_path(Path::new("/nonexistent/smsrelay.toml")).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("does not exist"));
}
