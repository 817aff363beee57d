// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resticara - restic backup runner and systemd timer generator.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resticara_config::{load_config, paths::locate_config, LoggingConfig, ResticaraConfig};

mod commands;
mod version;

/// Resticara - scheduled restic backups with notifications
#[derive(Parser, Debug)]
#[command(name = "resticara", version, about, long_about = None)]
struct Cli {
	/// Path to the configuration file
	#[arg(short, long, env = "RESTICARA_CONFIG")]
	config: Option<PathBuf>,

	/// Path to the notification template
	#[arg(long, env = "RESTICARA_MAIL_TEMPLATE")]
	mail_template: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Run every job, or only the named one, and send the report
	Run {
		/// Job key such as `dir:home` or `mysql:orders`
		job: Option<String>,
	},
	/// Prune every repository (`all`) or a single repository
	Prune {
		/// `all` or a repository locator used by at least one job
		target: String,
	},
	/// Reconcile systemd services and timers with the configured jobs
	Gentimer,
	/// Print version information
	Version,
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&logging.level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	// stdout carries the run summary; logs go to stderr.
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn load(cli: &Cli) -> Result<ResticaraConfig> {
	let path = locate_config(cli.config.as_deref()).context("failed to locate configuration")?;
	let config = load_config(&path)
		.with_context(|| format!("failed to load configuration from {}", path.display()))?;
	init_tracing(&config.logging);
	debug!(path = %path.display(), "configuration loaded");
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let cli = Cli::parse();

	if cli.command == Command::Version {
		println!("{}", version::format_version_info());
		return Ok(ExitCode::SUCCESS);
	}

	let config = load(&cli)?;
	info!(host_id = %config.general.host_id, jobs = config.jobs.len(), "starting resticara");

	match cli.command {
		Command::Run { job } => {
			commands::run::execute(&config, cli.mail_template.as_deref(), job).await
		}
		Command::Prune { target } => commands::prune::execute(&config, &target).await,
		Command::Gentimer => commands::gentimer::execute(&config).await,
		Command::Version => Ok(ExitCode::SUCCESS),
	}
}
