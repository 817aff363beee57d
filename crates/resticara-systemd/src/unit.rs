// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Unit naming and rendering.

use std::path::Path;

use resticara_core::JobSpec;

/// Every unit Resticara manages starts with this prefix.
pub const UNIT_PREFIX: &str = "resticara-";

const PRUNE_SUFFIX: &str = "-prune";

/// Replaces `:`, `/` and space with `-`.
///
/// `mysql:orders` becomes `mysql-orders`, `dir:my backup` becomes
/// `dir-my-backup`.
pub fn sanitize_name(key: &str) -> String {
	key
		.chars()
		.map(|c| match c {
			':' | '/' | ' ' => '-',
			c => c,
		})
		.collect()
}

/// Base name (no suffix) of a job's backup units.
pub fn backup_unit_base(key: &str) -> String {
	format!("{UNIT_PREFIX}{}", sanitize_name(key))
}

/// Base name (no suffix) of a job's prune units.
pub fn prune_unit_base(key: &str) -> String {
	format!("{}{PRUNE_SUFFIX}", backup_unit_base(key))
}

/// One rendered unit file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
	pub file_name: String,
	pub contents: String,
}

/// The four units belonging to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
	pub job_key: String,
	pub sanitized_name: String,
	pub prune_interval_days: u32,
	pub backup_service: UnitFile,
	pub backup_timer: UnitFile,
	pub prune_service: UnitFile,
	pub prune_timer: UnitFile,
}

impl UnitDescriptor {
	pub fn render(job: &JobSpec, exec_path: &Path, default_prune_days: u32) -> Self {
		let backup_base = backup_unit_base(&job.key);
		let prune_base = prune_unit_base(&job.key);
		let prune_interval_days = job.prune_interval_or(default_prune_days);
		let exec = exec_path.to_string_lossy();
		let description_key = escape_specifiers(&job.key);

		let backup_service = UnitFile {
			file_name: format!("{backup_base}.service"),
			contents: format!(
				"[Unit]\n\
				 Description=Resticara backup for {description_key}\n\
				 \n\
				 [Service]\n\
				 Type=oneshot\n\
				 ExecStart={}\n\
				 \n\
				 [Install]\n\
				 WantedBy=multi-user.target\n",
				exec_line(&[&exec, "run", &job.key])
			),
		};

		let backup_timer = UnitFile {
			file_name: format!("{backup_base}.timer"),
			contents: format!(
				"[Unit]\n\
				 Description=Resticara backup timer for {description_key}\n\
				 \n\
				 [Timer]\n\
				 OnCalendar=daily\n\
				 Persistent=true\n\
				 \n\
				 [Install]\n\
				 WantedBy=timers.target\n"
			),
		};

		let prune_service = UnitFile {
			file_name: format!("{prune_base}.service"),
			contents: format!(
				"[Unit]\n\
				 Description=Resticara prune for {description_key}\n\
				 \n\
				 [Service]\n\
				 Type=oneshot\n\
				 ExecStart={}\n\
				 \n\
				 [Install]\n\
				 WantedBy=multi-user.target\n",
				exec_line(&[&exec, "prune", &job.repository])
			),
		};

		let prune_timer = UnitFile {
			file_name: format!("{prune_base}.timer"),
			contents: format!(
				"[Unit]\n\
				 Description=Resticara prune timer for {description_key}\n\
				 \n\
				 [Timer]\n\
				 OnActiveSec={prune_interval_days}d\n\
				 OnUnitActiveSec={prune_interval_days}d\n\
				 Persistent=true\n\
				 \n\
				 [Install]\n\
				 WantedBy=timers.target\n"
			),
		};

		Self {
			job_key: job.key.clone(),
			sanitized_name: sanitize_name(&job.key),
			prune_interval_days,
			backup_service,
			backup_timer,
			prune_service,
			prune_timer,
		}
	}

	/// Base unit names, backup first.
	pub fn unit_bases(&self) -> [String; 2] {
		[backup_unit_base(&self.job_key), prune_unit_base(&self.job_key)]
	}

	/// Files in write order.
	pub fn files(&self) -> [&UnitFile; 4] {
		[
			&self.backup_service,
			&self.backup_timer,
			&self.prune_service,
			&self.prune_timer,
		]
	}

	/// Timer unit names in activation order.
	pub fn timers(&self) -> [&str; 2] {
		[
			self.backup_timer.file_name.as_str(),
			self.prune_timer.file_name.as_str(),
		]
	}
}

fn exec_line(words: &[&str]) -> String {
	words
		.iter()
		.map(|w| quote_exec_arg(w))
		.collect::<Vec<_>>()
		.join(" ")
}

/// Quotes one `ExecStart` word following systemd's command line rules.
///
/// `%` and `$` are doubled so specifiers and environment expansion never
/// apply to job keys or repository locators.
fn quote_exec_arg(word: &str) -> String {
	let escaped = escape_specifiers(word).replace('$', "$$");
	let needs_quotes = escaped.is_empty()
		|| escaped
			.chars()
			.any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\' || c == ';');
	if needs_quotes {
		let inner = escaped.replace('\\', "\\\\").replace('"', "\\\"");
		format!("\"{inner}\"")
	} else {
		escaped
	}
}

fn escape_specifiers(value: &str) -> String {
	value.replace('%', "%%")
}
