// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External tool and systemd sections.

use std::path::PathBuf;

use resticara_core::ToolPaths;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXEC_PATH: &str = "/usr/local/bin/resticara";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfigLayer {
	pub restic: Option<String>,
	pub mysqldump: Option<String>,
}

impl ToolsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.restic.is_some() {
			self.restic = other.restic;
		}
		if other.mysqldump.is_some() {
			self.mysqldump = other.mysqldump;
		}
	}

	pub fn finalize(self) -> ToolPaths {
		let defaults = ToolPaths::default();
		ToolPaths {
			restic: self.restic.unwrap_or(defaults.restic),
			mysqldump: self.mysqldump.unwrap_or(defaults.mysqldump),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemdConfigLayer {
	pub exec_path: Option<PathBuf>,
	pub unit_dir: Option<PathBuf>,
}

impl SystemdConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.exec_path.is_some() {
			self.exec_path = other.exec_path;
		}
		if other.unit_dir.is_some() {
			self.unit_dir = other.unit_dir;
		}
	}

	pub fn finalize(self) -> SystemdConfig {
		SystemdConfig {
			exec_path: self
				.exec_path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_EXEC_PATH)),
			unit_dir: self.unit_dir,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemdConfig {
	/// Binary written into every `ExecStart`.
	pub exec_path: PathBuf,
	/// Overrides the directory lookup through the service manager.
	pub unit_dir: Option<PathBuf>,
}

impl Default for SystemdConfig {
	fn default() -> Self {
		SystemdConfigLayer::default().finalize()
	}
}
