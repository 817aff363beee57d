// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Construction of the external commands a job runs.
//!
//! Commands are assembled as structured argument lists. The `Display` form
//! is for reports and logs only and is never split back into arguments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::{JobSpec, JobTarget, Retention};

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
	pub program: String,
	pub args: Vec<String>,
}

impl Invocation {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}
}

impl fmt::Display for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&quote_for_display(&self.program))?;
		for arg in &self.args {
			write!(f, " {}", quote_for_display(arg))?;
		}
		Ok(())
	}
}

fn quote_for_display(word: &str) -> String {
	if word.is_empty() || word.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
		format!("'{}'", word.replace('\'', r"'\''"))
	} else {
		word.to_string()
	}
}

/// Either one process, or two processes where the first one's stdout feeds
/// the second one's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CommandSpec {
	Single(Invocation),
	Piped {
		producer: Invocation,
		consumer: Invocation,
	},
}

impl fmt::Display for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CommandSpec::Single(inv) => write!(f, "{inv}"),
			CommandSpec::Piped { producer, consumer } => write!(f, "{producer} | {consumer}"),
		}
	}
}

/// Paths (or `PATH` names) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
	pub restic: String,
	pub mysqldump: String,
}

impl Default for ToolPaths {
	fn default() -> Self {
		Self {
			restic: "restic".to_string(),
			mysqldump: "mysqldump".to_string(),
		}
	}
}

/// The two commands every job runs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommands {
	pub backup: CommandSpec,
	pub retention: CommandSpec,
}

/// Pure mapping from a job to its commands.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
	tools: ToolPaths,
}

impl CommandBuilder {
	pub fn new(tools: ToolPaths) -> Self {
		Self { tools }
	}

	pub fn tools(&self) -> &ToolPaths {
		&self.tools
	}

	pub fn build(&self, job: &JobSpec) -> JobCommands {
		JobCommands {
			backup: self.backup(job),
			retention: self.retention(&job.repository, &job.retention),
		}
	}

	fn backup(&self, job: &JobSpec) -> CommandSpec {
		match &job.target {
			JobTarget::Directory { path } => CommandSpec::Single(
				self
					.restic(&job.repository)
					.arg("backup")
					.arg(path.to_string_lossy()),
			),
			JobTarget::MySqlDatabase { database } => CommandSpec::Piped {
				producer: Invocation::new(&self.tools.mysqldump).arg(database),
				consumer: self.restic(&job.repository).args([
					"backup".to_string(),
					"--stdin".to_string(),
					"--stdin-filename".to_string(),
					format!("{database}.sql"),
				]),
			},
		}
	}

	fn retention(&self, repository: &str, retention: &Retention) -> CommandSpec {
		CommandSpec::Single(self.restic(repository).args([
			"forget".to_string(),
			"--keep-daily".to_string(),
			retention.daily.to_string(),
			"--keep-weekly".to_string(),
			retention.weekly.to_string(),
			"--keep-monthly".to_string(),
			retention.monthly.to_string(),
		]))
	}

	/// Repository-wide compaction, run by `resticara prune`.
	pub fn prune(&self, repository: &str) -> CommandSpec {
		CommandSpec::Single(self.restic(repository).arg("prune"))
	}

	fn restic(&self, repository: &str) -> Invocation {
		Invocation::new(&self.tools.restic).arg("-r").arg(repository)
	}
}
