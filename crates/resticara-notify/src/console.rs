// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Human-readable run summary on the terminal and in the log.

use std::io::{self, Write};

use colored::Colorize;
use resticara_core::RunReport;
use tracing::{info, warn};

const RULE: &str = "---------------";

/// Writes the coloured `Backup Summary:` block.
pub fn write_summary<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
	let status = report.status_message();
	let status = if report.status().is_success() {
		status.green()
	} else {
		status.red()
	};

	writeln!(out, "{}", "Backup Summary:".bold())?;
	writeln!(out, "{RULE}")?;
	writeln!(out, "{} {}", "Host ID:".bold(), report.host_id)?;
	writeln!(out, "{} {}", "Date:".bold(), report.formatted_date())?;
	writeln!(out, "{} {}", "Status:".bold(), status)?;
	for result in report.job_results() {
		writeln!(out, "{} {}", "Command Key:".bold(), result.job_key)?;
		writeln!(out, "  {} {}", "Backup Command:".bold(), result.backup.command_text)?;
		writeln!(out, "  {} {}", "Backup Output:".bold(), result.backup.output().trim())?;
		writeln!(out, "  {} {}", "Forget Command:".bold(), result.retention.command_text)?;
		writeln!(out, "  {} {}", "Forget Output:".bold(), result.retention.output().trim())?;
	}
	writeln!(out, "{RULE}")?;
	out.flush()
}

/// Emits the summary as structured log events.
pub fn log_summary(report: &RunReport) {
	info!(
		host_id = %report.host_id,
		date = %report.formatted_date(),
		status = %report.status_message(),
		"backup summary"
	);
	for result in report.job_results() {
		if result.is_success() {
			info!(
				job = %result.job_key,
				backup_cmd = %result.backup.command_text,
				forget_cmd = %result.retention.command_text,
				"job succeeded"
			);
		} else {
			warn!(
				job = %result.job_key,
				backup_ok = result.backup.succeeded,
				backup_cmd = %result.backup.command_text,
				backup_output = %result.backup.output().trim(),
				forget_ok = result.retention.succeeded,
				forget_cmd = %result.retention.command_text,
				forget_output = %result.retention.output().trim(),
				"job failed"
			);
		}
	}
}
