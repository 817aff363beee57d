// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, the TOML file and environment
//! variables.

use std::path::PathBuf;

use resticara_common_secret::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ResticaraConfigLayer;
use crate::sections::{
	GeneralConfigLayer, LoggingConfigLayer, MatrixConfigLayer, SmtpConfigLayer, SyslogConfigLayer,
	SystemdConfigLayer, TelegramConfigLayer, ToolsConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ResticaraConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ResticaraConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ResticaraConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ResticaraConfigLayer, ConfigError> {
		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ResticaraConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: RESTICARA_<SECTION>_<FIELD>. Jobs are file-only.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ResticaraConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_env(&Env(|name: &str| std::env::var(name).ok()))
	}
}

/// Variable lookup, so the mapping can be exercised without touching the
/// process environment.
pub(crate) struct Env<F: Fn(&str) -> Option<String>>(pub(crate) F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn secret(&self, name: &str) -> Option<SecretString> {
		self.var(name).map(SecretString::new)
	}

	fn parse<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

pub(crate) fn layer_from_env<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<ResticaraConfigLayer, ConfigError> {
	Ok(ResticaraConfigLayer {
		general: Some(GeneralConfigLayer {
			host_id: env.var("RESTICARA_HOST_ID"),
			retention_prune: env.parse("RESTICARA_RETENTION_PRUNE", "integer")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("RESTICARA_LOG_LEVEL"),
		}),
		tools: Some(ToolsConfigLayer {
			restic: env.var("RESTICARA_RESTIC_BIN"),
			mysqldump: env.var("RESTICARA_MYSQLDUMP_BIN"),
		}),
		systemd: Some(SystemdConfigLayer {
			exec_path: env.var("RESTICARA_EXEC_PATH").map(PathBuf::from),
			unit_dir: env.var("RESTICARA_UNIT_DIR").map(PathBuf::from),
		}),
		smtp: Some(SmtpConfigLayer {
			enabled: env.bool("RESTICARA_SMTP_ENABLED"),
			server: env.var("RESTICARA_SMTP_SERVER"),
			port: env.parse("RESTICARA_SMTP_PORT", "u16")?,
			username: env.var("RESTICARA_SMTP_USERNAME"),
			password: env.secret("RESTICARA_SMTP_PASSWORD"),
			from: env.var("RESTICARA_SMTP_FROM"),
			to: env.var("RESTICARA_SMTP_TO"),
			use_tls: None,
		}),
		telegram: Some(TelegramConfigLayer {
			enabled: None,
			bot_token: env.secret("RESTICARA_TELEGRAM_BOT_TOKEN"),
			chat_id: env.parse("RESTICARA_TELEGRAM_CHAT_ID", "integer")?,
		}),
		matrix: Some(MatrixConfigLayer {
			password: env.secret("RESTICARA_MATRIX_PASSWORD"),
			..Default::default()
		}),
		syslog: Some(SyslogConfigLayer {
			enabled: env.bool("RESTICARA_SYSLOG_ENABLED"),
		}),
		jobs: None,
	})
}
