// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for Resticara.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of job tables into an ordered [`JobSet`]
//! - Consistent environment variable naming (`RESTICARA_*`)
//! - Lookup of the config file and the mail template
//!
//! # Usage
//!
//! ```ignore
//! use resticara_config::{load_config, paths::locate_config};
//!
//! let config = load_config(&locate_config(None)?)?;
//! println!("{} jobs on {}", config.jobs.len(), config.general.host_id);
//! ```

pub mod error;
pub mod layer;
pub mod paths;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ResticaraConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::Path;

use resticara_core::{JobSet, ToolPaths};
use tracing::{debug, info, warn};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ResticaraConfig {
	pub general: GeneralConfig,
	pub logging: LoggingConfig,
	pub tools: ToolPaths,
	pub systemd: SystemdConfig,
	pub smtp: Option<SmtpConfig>,
	pub telegram: Option<TelegramConfig>,
	pub matrix: Option<MatrixConfig>,
	pub syslog: SyslogConfig,
	pub jobs: JobSet,
}

/// Load configuration from the given file with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`RESTICARA_*`)
/// 2. Config file
/// 3. Built-in defaults
pub fn load_config(config_path: &Path) -> Result<ResticaraConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ResticaraConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ResticaraConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ResticaraConfigLayer) -> Result<ResticaraConfig, ConfigError> {
	let general = layer.general.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let tools = layer.tools.unwrap_or_default().finalize();
	let systemd = layer.systemd.unwrap_or_default().finalize();
	let syslog = layer.syslog.unwrap_or_default().finalize();

	let smtp = layer.smtp.unwrap_or_default().finalize()?;
	let telegram = layer.telegram.unwrap_or_default().finalize()?;
	let matrix = layer.matrix.unwrap_or_default().finalize()?;

	let jobs = build_job_set(layer.jobs.unwrap_or_default())?;
	if jobs.is_empty() {
		warn!("no jobs configured");
	}

	info!(
		host_id = %general.host_id,
		jobs = jobs.len(),
		smtp_configured = smtp.is_some(),
		telegram_configured = telegram.is_some(),
		matrix_configured = matrix.is_some(),
		syslog_enabled = syslog.enabled,
		"configuration loaded"
	);

	Ok(ResticaraConfig {
		general,
		logging,
		tools,
		systemd,
		smtp,
		telegram,
		matrix,
		syslog,
		jobs,
	})
}
