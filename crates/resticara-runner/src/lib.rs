// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command execution engine for Resticara.
//!
//! [`ProcessExecutor`] runs a [`CommandSpec`](resticara_core::CommandSpec),
//! either a single process or a producer piped into a consumer, and never
//! fails: spawn errors and non-zero exits become a failed
//! [`CommandResult`](resticara_core::CommandResult). [`BackupRunner`] and
//! [`PruneRunner`] drive an executor over the configured jobs.

pub mod aggregate;
pub mod error;
pub mod executor;
pub mod process;
pub mod prune;

pub use aggregate::BackupRunner;
pub use error::{Result, RunError};
pub use executor::CommandExecutor;
pub use process::ProcessExecutor;
pub use prune::{PruneOutcome, PruneRunner, PruneTarget};
