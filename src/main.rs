// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use haproxy_sync::activate::HaproxyController;
use haproxy_sync::constants::{
    HAPROXY_BINARY, HAPROXY_CONFIG_PATH, HAPROXY_SERVICE, RULES_ENV_VAR, SERVICE_BINARY,
    SZRADM_BINARY,
};
use haproxy_sync::errors::{RuleSetError, SyncError};
use haproxy_sync::inventory::SzradmInventory;
use haproxy_sync::pipeline::{PassOutcome, Pipeline, Settings};
use haproxy_sync::rules::parse_rules;

/// Reconcile declared proxy rules against live upstream inventory and
/// regenerate the HAProxy configuration.
#[derive(Parser, Debug)]
#[command(name = "haproxy-sync", version, about)]
struct Cli {
    /// Canonical HAProxy configuration path
    #[arg(long, default_value = HAPROXY_CONFIG_PATH)]
    config_path: PathBuf,

    /// Environment variable holding the declared rule set (JSON)
    #[arg(long, default_value = RULES_ENV_VAR)]
    rules_env: String,

    /// Binary queried for the live role inventory
    #[arg(long, default_value = SZRADM_BINARY)]
    szradm: PathBuf,

    /// Binary used to syntax-check the rendered configuration
    #[arg(long, default_value = HAPROXY_BINARY)]
    haproxy: PathBuf,

    /// Service-manager binary used for lifecycle transitions
    #[arg(long, default_value = SERVICE_BINARY)]
    service: PathBuf,

    /// Service unit to start or reload
    #[arg(long, default_value = HAPROXY_SERVICE)]
    unit: String,
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(outcome) => {
            info!(
                resolved = outcome.resolved,
                skipped = outcome.skipped,
                disposition = ?outcome.disposition,
                "pass complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// Load the declared rule set and run one reconciliation pass.
fn run(cli: &Cli) -> Result<PassOutcome, SyncError> {
    let raw = env::var(&cli.rules_env).map_err(|e| match e {
        env::VarError::NotPresent => RuleSetError::Missing {
            variable: cli.rules_env.clone(),
        },
        env::VarError::NotUnicode(_) => RuleSetError::Malformed {
            reason: format!("${} is not valid UTF-8", cli.rules_env),
        },
    })?;
    let rules = parse_rules(&raw)?;
    info!(rules = rules.len(), "loaded declared rule set");

    let settings = Settings {
        config_path: cli.config_path.clone(),
        ..Settings::default()
    };
    let pipeline = Pipeline::new(
        settings,
        SzradmInventory::new(&cli.szradm),
        HaproxyController::new(&cli.haproxy, &cli.service, cli.unit.clone()),
    );
    pipeline.run(&rules)
}

/// Initialize logging.
///
/// Respects the `RUST_LOG` environment variable if set, otherwise defaults
/// to INFO level. `RUST_LOG_FORMAT=json` switches to JSON output.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}
