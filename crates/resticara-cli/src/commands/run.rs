// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use resticara_config::{paths::locate_mail_template, ResticaraConfig};
use resticara_core::{CommandBuilder, JobSelection, RunReport};
use resticara_notify::{
	log_summary, write_summary, Message, NotifierSet, SyslogWriter, DEFAULT_MAIL_TEMPLATE,
	DEFAULT_SYSLOG_SOCKET,
};
use resticara_runner::{BackupRunner, ProcessExecutor};
use tracing::{debug, warn};

/// `resticara run [job]`. Exits non-zero when any job failed.
pub async fn execute(
	config: &ResticaraConfig,
	template_path: Option<&Path>,
	job: Option<String>,
) -> Result<ExitCode> {
	// Resolved before any job runs so a bad template path changes nothing.
	let template = load_template(template_path)?;

	let runner = BackupRunner::new(
		Arc::new(ProcessExecutor::new()),
		CommandBuilder::new(config.tools.clone()),
	);
	let report = runner
		.run(
			&config.jobs,
			&JobSelection::from_arg(job),
			&config.general.host_id,
			Utc::now(),
		)
		.await
		.context("backup run aborted")?;

	write_summary(&mut std::io::stdout().lock(), &report).context("failed to print summary")?;
	log_summary(&report);

	if config.syslog.enabled {
		write_syslog(&report).await;
	}

	notify(config, &Message::for_report(&report, &template)).await;

	Ok(if report.status().is_success() {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	})
}

fn load_template(explicit: Option<&Path>) -> Result<String> {
	match locate_mail_template(explicit).context("failed to locate mail template")? {
		Some(path) => {
			debug!(path = %path.display(), "using mail template");
			std::fs::read_to_string(&path)
				.with_context(|| format!("failed to read mail template {}", path.display()))
		}
		None => Ok(DEFAULT_MAIL_TEMPLATE.to_string()),
	}
}

async fn write_syslog(report: &RunReport) {
	let result = match SyslogWriter::connect(DEFAULT_SYSLOG_SOCKET) {
		Ok(writer) => writer.write_report(report).await,
		Err(e) => Err(e),
	};
	if let Err(e) = result {
		warn!(error = %e, "failed to write report to syslog");
	}
}

async fn notify(config: &ResticaraConfig, message: &Message) {
	let notifiers = match NotifierSet::from_config(config) {
		Ok(set) => set,
		Err(e) => {
			warn!(error = %e, "failed to set up notifications");
			eprintln!("Notifications disabled: {e}");
			return;
		}
	};
	if notifiers.is_empty() {
		debug!("no notification channels configured");
		return;
	}

	for outcome in notifiers.dispatch(message).await {
		if let Some(error) = &outcome.error {
			eprintln!("Failed to send {} notification: {error}", outcome.channel);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn explicit_template_is_read() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("mail.txt");
		fs::write(&path, "Host {host_id}\n{jobs}").unwrap();

		assert_eq!(load_template(Some(&path)).unwrap(), "Host {host_id}\n{jobs}");
	}

	#[test]
	fn missing_explicit_template_is_fatal() {
		let dir = TempDir::new().unwrap();
		let err = load_template(Some(&dir.path().join("absent.txt"))).unwrap_err();
		assert!(err.to_string().contains("mail template"));
	}
}
