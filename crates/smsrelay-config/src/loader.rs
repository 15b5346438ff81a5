// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./smsrelay.toml` > `~/.config/smsrelay/smsrelay.toml` >
//! `/etc/smsrelay/smsrelay.toml`, with `SMSRELAY_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SmsRelayConfig;

/// Local config file name, also used inside the XDG and system directories.
pub const CONFIG_FILE: &str = "smsrelay.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/smsrelay/smsrelay.toml";

/// Sections recognised by the environment mapper.
const ENV_SECTIONS: &[&str] = &["service", "storage", "gateway", "query"];

/// Per-user config file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("smsrelay").join(CONFIG_FILE))
}

/// Load configuration from the standard hierarchy.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/smsrelay/smsrelay.toml`
/// 3. `~/.config/smsrelay/smsrelay.toml`
/// 4. `./smsrelay.toml`
/// 5. `SMSRELAY_*` environment variables
pub fn load_config() -> Result<SmsRelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SmsRelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsRelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<SmsRelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsRelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(SmsRelayConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(CONFIG_FILE)).merge(env_provider())
}

/// Environment provider mapping `SMSRELAY_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `SMSRELAY_GATEWAY_API_PREFIX` maps to `gateway.api_prefix`.
fn env_provider() -> Env {
    Env::prefixed("SMSRELAY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("gateway_api_prefix"), "gateway.api_prefix");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
        assert_eq!(map_env_key("GATEWAY_PORT"), "gateway.port");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
