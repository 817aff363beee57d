// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use resticara_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that stop a run before any command is executed.
///
/// Command failures are never errors here; they are recorded in the report.
#[derive(Debug, Error)]
pub enum RunError {
	#[error(transparent)]
	Selection(#[from] CoreError),
}
