// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the job model.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
	#[error("job {0} not found in config")]
	UnknownJob(String),

	#[error("repository {0} not found in config")]
	UnknownRepository(String),

	#[error("invalid job key '{key}': {reason}")]
	InvalidJobKey { key: String, reason: String },

	#[error("duplicate job key '{0}'")]
	DuplicateJob(String),
}

impl CoreError {
	pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidJobKey {
			key: key.into(),
			reason: reason.into(),
		}
	}
}
