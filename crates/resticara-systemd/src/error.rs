// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SystemdError>;

#[derive(Debug, Error)]
pub enum SystemdError {
	#[error("systemctl not found in PATH")]
	SystemctlNotInstalled,

	#[error("systemctl {args} failed: {stderr}")]
	CommandFailed { args: String, stderr: String },

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("could not determine systemd unit directory from UnitPath: {0}")]
	UnitDirNotFound(String),

	#[error("failed to scan unit directory {path}: {source}")]
	ScanUnitDir {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write unit {unit}: {source}")]
	WriteUnit {
		unit: String,
		#[source]
		source: std::io::Error,
	},

	#[error("jobs {first} and {second} both map to unit {unit}")]
	NameCollision {
		unit: String,
		first: String,
		second: String,
	},

	#[error("failed to reload systemd daemon: {0}")]
	DaemonReload(#[source] Box<SystemdError>),
}
