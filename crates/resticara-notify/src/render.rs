// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject and body rendering for run reports.

use resticara_core::{JobResult, RunReport};

/// Used when no `mail_template.txt` is found.
pub const DEFAULT_MAIL_TEMPLATE: &str = "\
Resticara backup report

Host ID: {host_id}
Date: {date}
Status: {status}

{jobs}";

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
	pub subject: String,
	pub body: String,
}

impl Message {
	pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			subject: subject.into(),
			body: body.into(),
		}
	}

	pub fn for_report(report: &RunReport, template: &str) -> Self {
		Self {
			subject: report.subject(),
			body: render_template(template, report),
		}
	}

	/// Subject and body as one text, for chat channels without a subject.
	pub fn as_text(&self) -> String {
		format!("{}\n\n{}", self.subject, self.body)
	}
}

/// Replaces `{host_id}`, `{date}`, `{status}` and `{jobs}`.
///
/// Substituted values are never scanned again, so command output containing
/// braces is inserted verbatim. Unknown placeholders are left as they are.
pub fn render_template(template: &str, report: &RunReport) -> String {
	let mut out = String::with_capacity(template.len() + 256);
	let mut rest = template;

	while let Some(open) = rest.find('{') {
		out.push_str(&rest[..open]);
		let after = &rest[open + 1..];
		let value = after
			.find('}')
			.and_then(|close| placeholder(&after[..close], report).map(|v| (close, v)));

		match value {
			Some((close, value)) => {
				out.push_str(&value);
				rest = &after[close + 1..];
			}
			None => {
				out.push('{');
				rest = after;
			}
		}
	}
	out.push_str(rest);
	out
}

fn placeholder(name: &str, report: &RunReport) -> Option<String> {
	match name {
		"host_id" => Some(report.host_id.clone()),
		"date" => Some(report.formatted_date()),
		"status" => Some(report.status_message().to_string()),
		"jobs" => Some(jobs_block(report)),
		_ => None,
	}
}

/// Per-job section listing both commands and their trimmed output.
pub fn jobs_block(report: &RunReport) -> String {
	report
		.job_results()
		.iter()
		.map(job_block)
		.collect::<Vec<_>>()
		.join("\n")
}

fn job_block(result: &JobResult) -> String {
	format!(
		"Command Key: {}\n  Backup Command: {}\n  Backup Output: {}\n  Forget Command: {}\n  Forget Output: {}\n",
		result.job_key,
		result.backup.command_text,
		result.backup.output().trim(),
		result.retention.command_text,
		result.retention.output().trim(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use proptest::prelude::*;
	use resticara_core::CommandResult;

	fn report(ok: bool) -> RunReport {
		let mut report = RunReport::new("nas-01", Utc.with_ymd_and_hms(2024, 3, 5, 4, 0, 0).unwrap());
		report.push(JobResult {
			job_key: "dir:home".to_string(),
			backup: CommandResult::success(
				"restic -r /repo backup /home",
				"snapshot 1a2b saved\n".to_string(),
				String::new(),
			),
			retention: if ok {
				CommandResult::success("restic -r /repo forget", "ok".to_string(), String::new())
			} else {
				CommandResult::failure("restic -r /repo forget", String::new(), "locked".to_string())
			},
		});
		report
	}

	#[test]
	fn renders_known_placeholders() {
		let body = render_template("{host_id} | {date} | {status}", &report(true));
		assert_eq!(body, "nas-01 | Tue, 05 Mar 2024 04:00:00 UTC | Backup successful");
	}

	#[test]
	fn unknown_placeholders_are_kept() {
		let body = render_template("{hostname} {status} {", &report(false));
		assert_eq!(body, "{hostname} BACKUP FAILED! See output above. {");
	}

	#[test]
	fn jobs_block_lists_commands_and_output() {
		let block = jobs_block(&report(false));
		assert!(block.starts_with("Command Key: dir:home\n"));
		assert!(block.contains("  Backup Command: restic -r /repo backup /home\n"));
		assert!(block.contains("  Backup Output: snapshot 1a2b saved\n\nStderr:\n"));
		assert!(block.contains("  Forget Output: Stderr: locked\n"));
	}

	/// Test: braces in command output are not treated as placeholders.
	#[test]
	fn substituted_values_are_not_rescanned() {
		let mut report = RunReport::new("{date}", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
		report.push(JobResult {
			job_key: "dir:x".to_string(),
			backup: CommandResult::success("b", "{status}".to_string(), String::new()),
			retention: CommandResult::success("f", String::new(), String::new()),
		});
		let body = render_template("{host_id} {jobs}", &report);
		assert!(body.starts_with("{date} Command Key: dir:x"));
		assert!(body.contains("Backup Output: {status}"));
	}

	#[test]
	fn message_for_report() {
		let message = Message::for_report(&report(true), DEFAULT_MAIL_TEMPLATE);
		assert_eq!(message.subject, "Backup successful---Tue, 05 Mar 2024 04:00:00 UTC");
		assert!(message.body.contains("Host ID: nas-01\n"));
		assert!(message.body.contains("Command Key: dir:home"));
		assert!(message.as_text().starts_with("Backup successful---"));
	}

	proptest! {
		#[test]
		fn text_without_braces_is_unchanged(text in "[^{}]{0,64}") {
			prop_assert_eq!(render_template(&text, &report(true)), text);
		}
	}
}
