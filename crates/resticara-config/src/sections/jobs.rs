// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job tables (`[jobs."dir:home"]`) and their validation into a [`JobSet`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use resticara_core::{JobKind, JobSet, JobSpec, JobTarget, Retention};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobConfigLayer {
	/// Repository locator passed to `restic -r`.
	pub bucket: Option<String>,
	pub directory: Option<PathBuf>,
	pub database: Option<String>,
	pub retention_daily: Option<i64>,
	pub retention_weekly: Option<i64>,
	pub retention_monthly: Option<i64>,
	/// Prune interval in days; falls back to `general.retention_prune`.
	pub retention_prune: Option<i64>,
}

impl JobConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.bucket.is_some() {
			self.bucket = other.bucket;
		}
		if other.directory.is_some() {
			self.directory = other.directory;
		}
		if other.database.is_some() {
			self.database = other.database;
		}
		if other.retention_daily.is_some() {
			self.retention_daily = other.retention_daily;
		}
		if other.retention_weekly.is_some() {
			self.retention_weekly = other.retention_weekly;
		}
		if other.retention_monthly.is_some() {
			self.retention_monthly = other.retention_monthly;
		}
		if other.retention_prune.is_some() {
			self.retention_prune = other.retention_prune;
		}
	}

	pub fn into_spec(self, key: &str) -> Result<JobSpec, ConfigError> {
		let (kind, _name) =
			JobKind::parse_key(key).map_err(|e| ConfigError::job(key, e.to_string()))?;

		let repository = self
			.bucket
			.filter(|b| !b.trim().is_empty())
			.ok_or_else(|| ConfigError::job(key, "bucket is required"))?;

		let target = match kind {
			JobKind::Directory => JobTarget::Directory {
				path: self
					.directory
					.filter(|d| !d.as_os_str().is_empty())
					.ok_or_else(|| ConfigError::job(key, "directory is required for dir jobs"))?,
			},
			JobKind::MySqlDatabase => JobTarget::MySqlDatabase {
				database: self
					.database
					.filter(|d| !d.trim().is_empty())
					.ok_or_else(|| ConfigError::job(key, "database is required for mysql jobs"))?,
			},
		};

		let retention = Retention {
			daily: keep_count(key, "retention_daily", self.retention_daily)?,
			weekly: keep_count(key, "retention_weekly", self.retention_weekly)?,
			monthly: keep_count(key, "retention_monthly", self.retention_monthly)?,
		};

		let prune_interval_days = match self.retention_prune {
			None => None,
			Some(days) if days > 0 && days <= i64::from(u32::MAX) => Some(days as u32),
			Some(days) => {
				return Err(ConfigError::job(
					key,
					format!("retention_prune must be a positive number of days, got {days}"),
				))
			}
		};

		Ok(JobSpec {
			key: key.to_string(),
			target,
			repository,
			retention,
			prune_interval_days,
		})
	}
}

fn keep_count(key: &str, field: &str, value: Option<i64>) -> Result<u32, ConfigError> {
	let value = value.ok_or_else(|| ConfigError::job(key, format!("{field} is required")))?;
	u32::try_from(value)
		.map_err(|_| ConfigError::job(key, format!("{field} must be a non-negative integer, got {value}")))
}

/// Validates every job table and collects them in key order.
pub fn build_job_set(layers: BTreeMap<String, JobConfigLayer>) -> Result<JobSet, ConfigError> {
	let mut jobs = JobSet::new();
	for (key, layer) in layers {
		let spec = layer.into_spec(&key)?;
		jobs
			.insert(spec)
			.map_err(|e| ConfigError::job(&key, e.to_string()))?;
	}
	Ok(jobs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn dir_layer() -> JobConfigLayer {
		JobConfigLayer {
			bucket: Some("s3:host/bucket".to_string()),
			directory: Some(PathBuf::from("/home")),
			retention_daily: Some(7),
			retention_weekly: Some(4),
			retention_monthly: Some(6),
			..Default::default()
		}
	}

	#[test]
	fn test_directory_job() {
		let spec = dir_layer().into_spec("dir:home").unwrap();
		assert_eq!(spec.key, "dir:home");
		assert_eq!(spec.repository, "s3:host/bucket");
		assert_eq!(
			spec.target,
			JobTarget::Directory {
				path: PathBuf::from("/home")
			}
		);
		assert_eq!(spec.retention.monthly, 6);
		assert_eq!(spec.prune_interval_days, None);
	}

	#[test]
	fn test_mysql_job_from_toml() {
		let layer: JobConfigLayer = toml::from_str(
			r#"
bucket = "/srv/restic/db"
database = "orders"
retention_daily = 7
retention_weekly = 4
retention_monthly = 12
retention_prune = 14
"#,
		)
		.unwrap();
		let spec = layer.into_spec("mysql:orders").unwrap();
		assert_eq!(
			spec.target,
			JobTarget::MySqlDatabase {
				database: "orders".to_string()
			}
		);
		assert_eq!(spec.prune_interval_days, Some(14));
	}

	#[test]
	fn test_unknown_kind_is_rejected() {
		let err = dir_layer().into_spec("ftp:home").unwrap_err();
		assert!(err.to_string().contains("ftp:home"));
	}

	#[test]
	fn test_missing_bucket_names_job() {
		let layer = JobConfigLayer {
			bucket: None,
			..dir_layer()
		};
		let err = layer.into_spec("dir:home").unwrap_err();
		assert_eq!(err.to_string(), "job dir:home: bucket is required");
	}

	#[test]
	fn test_dir_job_requires_directory() {
		let layer = JobConfigLayer {
			directory: None,
			database: Some("orders".to_string()),
			..dir_layer()
		};
		let err = layer.into_spec("dir:home").unwrap_err();
		assert!(err.to_string().contains("directory is required"));
	}

	#[test]
	fn test_missing_retention_field() {
		let layer = JobConfigLayer {
			retention_weekly: None,
			..dir_layer()
		};
		let err = layer.into_spec("dir:home").unwrap_err();
		assert!(err.to_string().contains("retention_weekly is required"));
	}

	#[test]
	fn test_negative_retention_is_rejected() {
		let layer = JobConfigLayer {
			retention_daily: Some(-1),
			..dir_layer()
		};
		let err = layer.into_spec("dir:home").unwrap_err();
		assert!(err.to_string().contains("non-negative"));
	}

	#[test]
	fn test_zero_prune_interval_is_rejected() {
		let layer = JobConfigLayer {
			retention_prune: Some(0),
			..dir_layer()
		};
		assert!(layer.into_spec("dir:home").is_err());
	}

	#[test]
	fn test_build_job_set_orders_by_key() {
		let mut layers = BTreeMap::new();
		layers.insert("dir:zeta".to_string(), dir_layer());
		layers.insert("dir:alpha".to_string(), dir_layer());
		let jobs = build_job_set(layers).unwrap();
		let keys: Vec<&str> = jobs.keys().collect();
		assert_eq!(keys, vec!["dir:alpha", "dir:zeta"]);
	}

	proptest! {
		#[test]
		fn keep_counts_accept_any_u32(d in 0u32..=u32::MAX, w in 0u32..1000, m in 0u32..1000) {
			let layer = JobConfigLayer {
				retention_daily: Some(i64::from(d)),
				retention_weekly: Some(i64::from(w)),
				retention_monthly: Some(i64::from(m)),
				..dir_layer()
			};
			let spec = layer.into_spec("dir:x").unwrap();
			prop_assert_eq!(spec.retention, Retention { daily: d, weekly: w, monthly: m });
		}
	}
}
