// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
	pub command_text: String,
	/// True iff every process in the command exited with status zero.
	pub succeeded: bool,
	pub stdout: String,
	pub stderr: String,
}

impl CommandResult {
	pub fn success(command_text: impl Into<String>, stdout: String, stderr: String) -> Self {
		Self {
			command_text: command_text.into(),
			succeeded: true,
			stdout,
			stderr,
		}
	}

	pub fn failure(command_text: impl Into<String>, stdout: String, stderr: String) -> Self {
		Self {
			command_text: command_text.into(),
			succeeded: false,
			stdout,
			stderr,
		}
	}

	/// Combined output in the form shown in reports.
	pub fn output(&self) -> String {
		format!("{}\nStderr: {}", self.stdout, self.stderr)
	}
}

/// Backup and retention outcomes of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
	pub job_key: String,
	pub backup: CommandResult,
	pub retention: CommandResult,
}

impl JobResult {
	pub fn is_success(&self) -> bool {
		self.backup.succeeded && self.retention.succeeded
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	Success,
	Failed,
}

impl RunStatus {
	pub fn message(&self) -> &'static str {
		match self {
			RunStatus::Success => "Backup successful",
			RunStatus::Failed => "BACKUP FAILED! See output above.",
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, RunStatus::Success)
	}
}

/// Everything one `run` invocation produced.
///
/// `status` is `Success` iff every pushed job result succeeded. Results are
/// only added through [`RunReport::push`], which folds each job into the
/// status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
	pub host_id: String,
	pub timestamp: DateTime<Utc>,
	job_results: Vec<JobResult>,
	status: RunStatus,
}

impl RunReport {
	/// An empty report. With no jobs the run counts as successful.
	pub fn new(host_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
		Self {
			host_id: host_id.into(),
			timestamp,
			job_results: Vec::new(),
			status: RunStatus::Success,
		}
	}

	pub fn push(&mut self, result: JobResult) {
		if !result.is_success() {
			self.status = RunStatus::Failed;
		}
		self.job_results.push(result);
	}

	pub fn job_results(&self) -> &[JobResult] {
		&self.job_results
	}

	pub fn status(&self) -> RunStatus {
		self.status
	}

	pub fn status_message(&self) -> &'static str {
		self.status.message()
	}

	/// RFC 1123 style date used in summaries and subjects.
	pub fn formatted_date(&self) -> String {
		self.timestamp.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
	}

	/// Notification subject: `"<status message>---<date>"`.
	pub fn subject(&self) -> String {
		format!("{}---{}", self.status_message(), self.formatted_date())
	}
}
