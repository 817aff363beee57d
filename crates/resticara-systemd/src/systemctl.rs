// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::error::{Result, SystemdError};
use crate::manager::ServiceManager;

/// [`ServiceManager`] backed by the `systemctl` binary.
#[derive(Debug, Clone)]
pub struct SystemctlClient {
	program: String,
}

impl SystemctlClient {
	pub fn new() -> Self {
		Self {
			program: "systemctl".to_string(),
		}
	}

	/// Use a different `systemctl` executable, e.g. a wrapper script.
	pub fn with_program(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
		}
	}

	async fn run_systemctl(&self, args: &[&str]) -> Result<String> {
		let mut cmd = Command::new(&self.program);
		cmd.args(args);

		trace!(cmd = %format!("{} {}", self.program, args.join(" ")), "running systemctl command");

		let output = cmd.output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!("systemctl not found in PATH");
				SystemdError::SystemctlNotInstalled
			} else {
				SystemdError::Io(e)
			}
		})?;

		if output.status.success() {
			Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
		} else {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			Err(SystemdError::CommandFailed {
				args: args.join(" "),
				stderr,
			})
		}
	}
}

impl Default for SystemctlClient {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ServiceManager for SystemctlClient {
	async fn unit_search_path(&self) -> Result<Vec<PathBuf>> {
		let output = self.run_systemctl(&["show", "--property=UnitPath"]).await?;
		let paths = parse_unit_path(&output);
		debug!(count = paths.len(), "unit search path resolved");
		Ok(paths)
	}

	async fn disable_now(&self, unit: &str) -> Result<()> {
		self.run_systemctl(&["disable", "--now", unit]).await.map(|_| ())
	}

	async fn daemon_reload(&self) -> Result<()> {
		self.run_systemctl(&["daemon-reload"]).await.map(|_| ())
	}

	async fn enable(&self, unit: &str) -> Result<()> {
		self.run_systemctl(&["enable", unit]).await.map(|_| ())
	}

	async fn restart(&self, unit: &str) -> Result<()> {
		self.run_systemctl(&["restart", unit]).await.map(|_| ())
	}
}

/// Parses `systemctl show --property=UnitPath` output into directories.
///
/// The value is space separated; colons are accepted as well.
fn parse_unit_path(output: &str) -> Vec<PathBuf> {
	let value = output
		.lines()
		.find_map(|line| line.trim().strip_prefix("UnitPath="))
		.unwrap_or("");

	value
		.split(|c: char| c == ':' || c.is_whitespace())
		.filter(|p| !p.is_empty())
		.map(PathBuf::from)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_space_separated_unit_path() {
		let output = "UnitPath=/etc/systemd/system.control /run/systemd/transient /etc/systemd/system /usr/lib/systemd/system";
		let paths = parse_unit_path(output);
		assert_eq!(
			paths,
			vec![
				PathBuf::from("/etc/systemd/system.control"),
				PathBuf::from("/run/systemd/transient"),
				PathBuf::from("/etc/systemd/system"),
				PathBuf::from("/usr/lib/systemd/system"),
			]
		);
	}

	#[test]
	fn parse_colon_separated_unit_path() {
		let paths = parse_unit_path("UnitPath=/etc/systemd/system:/lib/systemd/system\n");
		assert_eq!(
			paths,
			vec![PathBuf::from("/etc/systemd/system"), PathBuf::from("/lib/systemd/system")]
		);
	}

	#[test]
	fn parse_missing_property_is_empty() {
		assert!(parse_unit_path("").is_empty());
		assert!(parse_unit_path("UnitPath=").is_empty());
		assert!(parse_unit_path("Names=foo.service").is_empty());
	}

	/// Test: a missing systemctl binary maps to a dedicated error.
	#[tokio::test]
	async fn missing_binary_is_reported() {
		let client = SystemctlClient::with_program("/nonexistent/resticara-systemctl");
		let err = client.daemon_reload().await.unwrap_err();
		assert!(matches!(err, SystemdError::SystemctlNotInstalled));
	}

	/// Test: a non-zero exit carries the arguments and stderr.
	#[tokio::test]
	async fn failed_command_carries_stderr() {
		let client = SystemctlClient::with_program("false");
		let err = client.enable("resticara-dir-home.timer").await.unwrap_err();
		match err {
			SystemdError::CommandFailed { args, .. } => {
				assert_eq!(args, "enable resticara-dir-home.timer");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
