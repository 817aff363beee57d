// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

/// Trait abstracting the service manager for testability.
#[async_trait]
pub trait ServiceManager: Send + Sync {
	/// Directories the manager loads unit files from, in its own order.
	async fn unit_search_path(&self) -> Result<Vec<PathBuf>>;

	/// Stop and disable a unit (`disable --now`).
	async fn disable_now(&self, unit: &str) -> Result<()>;

	/// Re-read all unit files.
	async fn daemon_reload(&self) -> Result<()>;

	async fn enable(&self, unit: &str) -> Result<()>;

	async fn restart(&self, unit: &str) -> Result<()>;
}
