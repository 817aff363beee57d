// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! General and logging configuration sections.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// `host_id` value that resolves to the OS hostname.
pub const HOSTNAME_SENTINEL: &str = "hostname";

/// Host id used when the OS hostname cannot be read.
pub const UNKNOWN_HOST: &str = "Unknown";

pub const DEFAULT_RETENTION_PRUNE_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfigLayer {
	pub host_id: Option<String>,
	pub retention_prune: Option<i64>,
}

impl GeneralConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.host_id.is_some() {
			self.host_id = other.host_id;
		}
		if other.retention_prune.is_some() {
			self.retention_prune = other.retention_prune;
		}
	}

	pub fn finalize(self) -> Result<GeneralConfig, ConfigError> {
		let retention_prune = match self.retention_prune {
			None => DEFAULT_RETENTION_PRUNE_DAYS,
			Some(days) if days > 0 && days <= i64::from(u32::MAX) => days as u32,
			Some(days) => {
				return Err(ConfigError::InvalidValue {
					key: "general.retention_prune".to_string(),
					message: format!("must be a positive number of days, got {days}"),
				})
			}
		};

		let configured = self.host_id.unwrap_or_else(|| HOSTNAME_SENTINEL.to_string());
		let host_id = resolve_host_id(&configured);

		Ok(GeneralConfig {
			host_id,
			retention_prune,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralConfig {
	/// Host identity shown in reports.
	pub host_id: String,
	/// Default prune interval in days for jobs that set none.
	pub retention_prune: u32,
}

/// Returns `configured`, or the OS hostname when it is empty or `"hostname"`.
pub fn resolve_host_id(configured: &str) -> String {
	host_id_or(configured, hostname::get())
}

fn host_id_or(configured: &str, os_hostname: std::io::Result<std::ffi::OsString>) -> String {
	let configured = configured.trim();
	if !configured.is_empty() && configured != HOSTNAME_SENTINEL {
		return configured.to_string();
	}

	match os_hostname {
		Ok(host) => {
			let host = host.to_string_lossy().into_owned();
			debug!(host = %host, "resolved host id from hostname");
			host
		}
		Err(e) => {
			warn!(error = %e, "failed to read hostname, using {UNKNOWN_HOST}");
			UNKNOWN_HOST.to_string()
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	/// `EnvFilter` directive used when `RUST_LOG` is unset.
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_explicit_host_id_is_kept() {
		let layer = GeneralConfigLayer {
			host_id: Some("backup-01".to_string()),
			retention_prune: None,
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.host_id, "backup-01");
		assert_eq!(config.retention_prune, DEFAULT_RETENTION_PRUNE_DAYS);
	}

	#[test]
	fn test_hostname_sentinel_resolves() {
		let host = resolve_host_id(HOSTNAME_SENTINEL);
		assert!(!host.is_empty());
	}

	#[test]
	fn test_unreadable_hostname_falls_back_to_unknown() {
		let unreadable = || Err(std::io::Error::other("no uts"));
		assert_eq!(host_id_or(HOSTNAME_SENTINEL, unreadable()), UNKNOWN_HOST);
		assert_eq!(host_id_or("", unreadable()), UNKNOWN_HOST);
		assert_eq!(host_id_or("backup-01", unreadable()), "backup-01");
	}

	#[test]
	fn test_retention_prune_must_be_positive() {
		for bad in [0, -3] {
			let layer = GeneralConfigLayer {
				host_id: Some("h".to_string()),
				retention_prune: Some(bad),
			};
			let err = layer.finalize().unwrap_err();
			assert!(err.to_string().contains("general.retention_prune"));
		}
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = GeneralConfigLayer {
			host_id: Some("a".to_string()),
			retention_prune: Some(30),
		};
		base.merge(GeneralConfigLayer {
			host_id: None,
			retention_prune: Some(7),
		});
		assert_eq!(base.host_id.as_deref(), Some("a"));
		assert_eq!(base.retention_prune, Some(7));
	}

	#[test]
	fn test_logging_default_level() {
		assert_eq!(LoggingConfigLayer::default().finalize().level, "info");
		let layer: LoggingConfigLayer = toml::from_str("level = \"debug\"").unwrap();
		assert_eq!(layer.finalize().level, "debug");
	}
}
