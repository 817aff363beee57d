// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use resticara_core::{CommandResult, CommandSpec};

/// Runs one command and reports how it went.
///
/// Implementations must not return early on failure: a process that could
/// not be started or exited non-zero is a `CommandResult` with
/// `succeeded == false` and whatever output was captured.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
	async fn execute(&self, spec: &CommandSpec) -> CommandResult;
}
