// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Checks constraints serde cannot express. All problems are collected
//! rather than failing on the first.

use crate::diagnostic::ConfigError;
use crate::model::SmsRelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &SmsRelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.service.name.trim().is_empty() {
        fail("service.name must not be empty".to_string());
    }

    let level = config.service.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "service.log_level `{}` is not one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let prefix = &config.gateway.api_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        fail(format!(
            "gateway.api_prefix `{prefix}` must start with `/`, not end with `/`, and not be the root"
        ));
    }

    if config.gateway.subscriber_buffer == 0 {
        fail("gateway.subscriber_buffer must be at least 1".to_string());
    }

    if config.query.default_limit == 0 {
        fail("query.default_limit must be at least 1".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&SmsRelayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let mut config = SmsRelayConfig::default();
        config.gateway.host = String::new();
        config.gateway.subscriber_buffer = 0;
        config.query.default_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_bad_prefix() {
        for prefix in ["v1/sms", "/", "/v1/sms/"] {
            let mut config = SmsRelayConfig::default();
            config.gateway.api_prefix = prefix.to_string();
            assert!(validate_config(&config).is_err(), "prefix {prefix} should fail");
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = SmsRelayConfig::default();
        config.service.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("loud"));
    }

    #[test]
    fn rejects_host_with_spaces() {
        let mut config = SmsRelayConfig::default();
        config.gateway.host = "not a host".to_string();
        assert!(validate_config(&config).is_err());
    }
}
