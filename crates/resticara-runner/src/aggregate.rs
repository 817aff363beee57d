// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use chrono::{DateTime, Utc};
use resticara_core::{CommandBuilder, JobResult, JobSelection, JobSet, JobSpec, RunReport};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::executor::CommandExecutor;

/// Runs backup and retention for the selected jobs and folds the outcomes
/// into a [`RunReport`].
pub struct BackupRunner {
	executor: Arc<dyn CommandExecutor>,
	builder: CommandBuilder,
}

impl BackupRunner {
	pub fn new(executor: Arc<dyn CommandExecutor>, builder: CommandBuilder) -> Self {
		Self { executor, builder }
	}

	/// Jobs run one at a time in key order. The selection is resolved before
	/// anything is executed, so an unknown key leaves the host untouched.
	#[instrument(skip(self, jobs, timestamp), fields(job_count = jobs.len()))]
	pub async fn run(
		&self,
		jobs: &JobSet,
		selection: &JobSelection,
		host_id: &str,
		timestamp: DateTime<Utc>,
	) -> Result<RunReport> {
		let selected = jobs.select(selection)?;

		let mut report = RunReport::new(host_id, timestamp);
		for job in selected {
			let result = self.run_job(job).await;
			report.push(result);
		}

		info!(
			status = ?report.status(),
			jobs = report.job_results().len(),
			"backup run finished"
		);
		Ok(report)
	}

	/// Backup then retention. Retention runs even when the backup failed.
	pub async fn run_job(&self, job: &JobSpec) -> JobResult {
		info!(job = %job.key, "executing job");
		let commands = self.builder.build(job);

		let backup = self.executor.execute(&commands.backup).await;
		if !backup.succeeded {
			warn!(job = %job.key, cmd = %backup.command_text, "backup failed");
		}

		let retention = self.executor.execute(&commands.retention).await;
		if !retention.succeeded {
			warn!(job = %job.key, cmd = %retention.command_text, "retention failed");
		}

		JobResult {
			job_key: job.key.clone(),
			backup,
			retention,
		}
	}
}
