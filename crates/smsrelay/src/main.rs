// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! smsrelay - outbound SMS relay service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smsrelay_config::SmsRelayConfig;

/// smsrelay - outbound SMS relay service.
#[derive(Parser, Debug)]
#[command(name = "smsrelay", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket service.
    Serve,
    /// Print the effective configuration as TOML.
    Config,
    /// Connect to a running service and print lifecycle events.
    Watch {
        /// WebSocket URL; defaults to the configured gateway address.
        #[arg(long)]
        url: Option<String>,
        /// Print raw JSON frames.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => smsrelay_config::load_and_validate_path(path),
        None => smsrelay_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            smsrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Watch { url, json }) => {
            let url = url.unwrap_or_else(|| default_watch_url(&config));
            watch::run_watch(&url, json).await
        }
        None => {
            println!("smsrelay: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("smsrelay: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &SmsRelayConfig) -> Result<(), smsrelay_core::SmsRelayError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| smsrelay_core::SmsRelayError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

fn default_watch_url(config: &SmsRelayConfig) -> String {
    format!("ws://{}:{}/ws", config.gateway.host, config.gateway.port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_accepts_url_and_json() {
        let cli = Cli::try_parse_from([
            "smsrelay",
            "watch",
            "--url",
            "ws://10.0.0.5:3515/ws",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Watch { url, json }) => {
                assert_eq!(url.as_deref(), Some("ws://10.0.0.5:3515/ws"));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["smsrelay", "serve", "--config", "relay.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("relay.toml")));
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn default_watch_url_follows_gateway_config() {
        let config = smsrelay_config::load_and_validate_str("[gateway]\nport = 4000\n").unwrap();
        assert_eq!(default_watch_url(&config), "ws://127.0.0.1:4000/ws");
    }

    #[test]
    fn effective_config_renders_as_toml() {
        let config = SmsRelayConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[gateway]"));
        assert!(rendered.contains("api_prefix = \"/v1/sms\""));
    }
}
