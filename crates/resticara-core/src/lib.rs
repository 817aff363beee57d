// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Resticara.
//!
//! This crate holds everything that does not touch a process or the
//! filesystem:
//! - the validated, key-ordered job model ([`JobSet`], [`JobSpec`])
//! - the pure mapping from a job to its restic/mysqldump invocations
//!   ([`CommandBuilder`])
//! - the per-run report types ([`CommandResult`], [`JobResult`], [`RunReport`])

pub mod command;
pub mod error;
pub mod job;
pub mod report;

pub use command::{CommandBuilder, CommandSpec, Invocation, JobCommands, ToolPaths};
pub use error::{CoreError, Result};
pub use job::{JobKind, JobSelection, JobSet, JobSpec, JobTarget, Retention};
pub use report::{CommandResult, JobResult, RunReport, RunStatus};
