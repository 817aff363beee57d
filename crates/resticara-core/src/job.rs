// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job definitions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The kind of data a job backs up. The kind is the part of the job key
/// before the first `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
	Directory,
	MySqlDatabase,
}

impl JobKind {
	/// Key prefix used in configuration: `dir` or `mysql`.
	pub fn prefix(&self) -> &'static str {
		match self {
			JobKind::Directory => "dir",
			JobKind::MySqlDatabase => "mysql",
		}
	}

	pub fn from_prefix(prefix: &str) -> Option<Self> {
		match prefix {
			"dir" => Some(JobKind::Directory),
			"mysql" => Some(JobKind::MySqlDatabase),
			_ => None,
		}
	}

	/// Splits `"<kind>:<name>"` into its kind and name.
	pub fn parse_key(key: &str) -> Result<(Self, &str)> {
		let (prefix, name) = key
			.split_once(':')
			.ok_or_else(|| CoreError::invalid_key(key, "expected <kind>:<name>"))?;

		let kind = Self::from_prefix(prefix).ok_or_else(|| {
			CoreError::invalid_key(key, format!("unknown kind '{prefix}', expected 'dir' or 'mysql'"))
		})?;

		if name.is_empty() {
			return Err(CoreError::invalid_key(key, "name must not be empty"));
		}

		Ok((kind, name))
	}
}

impl fmt::Display for JobKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.prefix())
	}
}

/// What a job backs up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobTarget {
	Directory { path: PathBuf },
	MySqlDatabase { database: String },
}

impl JobTarget {
	pub fn kind(&self) -> JobKind {
		match self {
			JobTarget::Directory { .. } => JobKind::Directory,
			JobTarget::MySqlDatabase { .. } => JobKind::MySqlDatabase,
		}
	}
}

/// Snapshot keep-counts passed to `restic forget`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
	pub daily: u32,
	pub weekly: u32,
	pub monthly: u32,
}

/// One configured backup target plus its retention policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
	/// Unique `"<kind>:<name>"` key.
	pub key: String,
	pub target: JobTarget,
	/// Opaque restic repository locator (`-r` argument).
	pub repository: String,
	pub retention: Retention,
	/// Days between prune runs; `None` means the process-wide default.
	pub prune_interval_days: Option<u32>,
}

impl JobSpec {
	pub fn kind(&self) -> JobKind {
		self.target.kind()
	}

	pub fn prune_interval_or(&self, default_days: u32) -> u32 {
		self.prune_interval_days.unwrap_or(default_days)
	}
}

/// Which jobs a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSelection {
	All,
	Job(String),
}

impl JobSelection {
	pub fn from_arg(arg: Option<String>) -> Self {
		match arg {
			Some(key) => JobSelection::Job(key),
			None => JobSelection::All,
		}
	}
}

/// Validated jobs, ordered by key.
///
/// Run order, report order and unit order all follow key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSet {
	jobs: BTreeMap<String, JobSpec>,
}

impl JobSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, spec: JobSpec) -> Result<()> {
		if self.jobs.contains_key(&spec.key) {
			return Err(CoreError::DuplicateJob(spec.key));
		}
		self.jobs.insert(spec.key.clone(), spec);
		Ok(())
	}

	pub fn get(&self, key: &str) -> Option<&JobSpec> {
		self.jobs.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<JobSpec> {
		self.jobs.remove(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = &JobSpec> {
		self.jobs.values()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.jobs.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}

	/// Resolves a selection to the jobs it covers. An unknown key is an
	/// error so callers can stop before running anything.
	pub fn select(&self, selection: &JobSelection) -> Result<Vec<&JobSpec>> {
		match selection {
			JobSelection::All => Ok(self.jobs.values().collect()),
			JobSelection::Job(key) => self
				.jobs
				.get(key)
				.map(|spec| vec![spec])
				.ok_or_else(|| CoreError::UnknownJob(key.clone())),
		}
	}

	/// Unique repository locators across all jobs, sorted.
	pub fn repositories(&self) -> BTreeSet<&str> {
		self.jobs.values().map(|j| j.repository.as_str()).collect()
	}
}

impl<'a> IntoIterator for &'a JobSet {
	type Item = &'a JobSpec;
	type IntoIter = std::collections::btree_map::Values<'a, String, JobSpec>;

	fn into_iter(self) -> Self::IntoIter {
		self.jobs.values()
	}
}
