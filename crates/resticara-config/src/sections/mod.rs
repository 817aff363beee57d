// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod general;
mod jobs;
mod matrix;
mod smtp;
mod syslog;
mod telegram;
mod tools;

pub use general::{
	resolve_host_id, GeneralConfig, GeneralConfigLayer, LoggingConfig, LoggingConfigLayer,
	DEFAULT_RETENTION_PRUNE_DAYS, HOSTNAME_SENTINEL,
};
pub use jobs::{build_job_set, JobConfigLayer};
pub use matrix::{MatrixConfig, MatrixConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer};
pub use syslog::{SyslogConfig, SyslogConfigLayer};
pub use telegram::{TelegramConfig, TelegramConfigLayer};
pub use tools::{SystemdConfig, SystemdConfigLayer, ToolsConfigLayer, DEFAULT_EXEC_PATH};
