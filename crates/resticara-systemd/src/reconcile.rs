// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Converges the unit directory and service-manager state with the job list.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use resticara_core::JobSet;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SystemdError};
use crate::manager::ServiceManager;
use crate::unit::{UnitDescriptor, UNIT_PREFIX};

/// Directory used when the service manager lists it and it is writable.
pub const PREFERRED_UNIT_DIR: &str = "/etc/systemd/system";

const UNIT_SUFFIXES: [&str; 2] = [".service", ".timer"];

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
	/// Binary referenced by every `ExecStart`.
	pub exec_path: PathBuf,
	pub default_prune_days: u32,
	/// Explicit unit directory; skips the search path lookup.
	pub unit_dir: Option<PathBuf>,
	pub preferred_unit_dir: PathBuf,
}

impl Default for ReconcileSettings {
	fn default() -> Self {
		Self {
			exec_path: PathBuf::from("/usr/local/bin/resticara"),
			default_prune_days: 30,
			unit_dir: None,
			preferred_unit_dir: PathBuf::from(PREFERRED_UNIT_DIR),
		}
	}
}

/// What one pass will do, computed before anything is touched.
#[derive(Debug, Clone)]
pub struct ReconciliationPlan {
	pub unit_dir: PathBuf,
	pub expected: BTreeSet<String>,
	pub existing: BTreeSet<String>,
	pub stale: BTreeSet<String>,
	/// Rendered units in job key order. Always rewritten.
	pub to_write: Vec<UnitDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
	pub unit: String,
	pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
	pub unit_dir: PathBuf,
	/// Stale base names whose units were cleaned up.
	pub removed: Vec<String>,
	pub written: Vec<PathBuf>,
	pub activated: Vec<String>,
	pub cleanup_failures: Vec<UnitFailure>,
	pub activation_failures: Vec<UnitFailure>,
}

impl ReconcileOutcome {
	pub fn has_activation_failures(&self) -> bool {
		!self.activation_failures.is_empty()
	}
}

pub struct UnitReconciler {
	manager: Arc<dyn ServiceManager>,
	settings: ReconcileSettings,
}

impl UnitReconciler {
	pub fn new(manager: Arc<dyn ServiceManager>, settings: ReconcileSettings) -> Self {
		Self { manager, settings }
	}

	pub fn settings(&self) -> &ReconcileSettings {
		&self.settings
	}

	/// Picks the directory unit files are written to.
	pub async fn resolve_unit_dir(&self) -> Result<PathBuf> {
		if let Some(dir) = &self.settings.unit_dir {
			return if is_dir(dir).await {
				Ok(dir.clone())
			} else {
				Err(SystemdError::UnitDirNotFound(dir.display().to_string()))
			};
		}

		let paths = self.manager.unit_search_path().await?;

		if paths.contains(&self.settings.preferred_unit_dir)
			&& is_dir(&self.settings.preferred_unit_dir).await
			&& is_writable(&self.settings.preferred_unit_dir).await
		{
			return Ok(self.settings.preferred_unit_dir.clone());
		}

		for path in &paths {
			if is_dir(path).await {
				return Ok(path.clone());
			}
		}

		let listed = paths
			.iter()
			.map(|p| p.display().to_string())
			.collect::<Vec<_>>()
			.join(" ");
		Err(SystemdError::UnitDirNotFound(listed))
	}

	/// Resolves the directory, renders every job and diffs against what is on
	/// disk. Does not mutate anything.
	pub async fn plan(&self, jobs: &JobSet) -> Result<ReconciliationPlan> {
		let unit_dir = self.resolve_unit_dir().await?;

		let mut owners: BTreeMap<String, String> = BTreeMap::new();
		let mut to_write = Vec::with_capacity(jobs.len());
		for job in jobs {
			let unit = UnitDescriptor::render(
				job,
				&self.settings.exec_path,
				self.settings.default_prune_days,
			);
			for base in unit.unit_bases() {
				if let Some(first) = owners.insert(base.clone(), job.key.clone()) {
					return Err(SystemdError::NameCollision {
						unit: base,
						first,
						second: job.key.clone(),
					});
				}
			}
			to_write.push(unit);
		}

		let expected: BTreeSet<String> = owners.into_keys().collect();
		let existing = scan_unit_dir(&unit_dir).await?;
		let stale = existing.difference(&expected).cloned().collect();

		Ok(ReconciliationPlan {
			unit_dir,
			expected,
			existing,
			stale,
			to_write,
		})
	}

	/// Runs one full pass: stale cleanup, writes, reload, timer activation.
	#[instrument(skip(self, jobs), fields(job_count = jobs.len()))]
	pub async fn reconcile(&self, jobs: &JobSet) -> Result<ReconcileOutcome> {
		let plan = self.plan(jobs).await?;
		info!(
			unit_dir = %plan.unit_dir.display(),
			expected = plan.expected.len(),
			stale = plan.stale.len(),
			"reconciling systemd units"
		);

		let mut outcome = ReconcileOutcome {
			unit_dir: plan.unit_dir.clone(),
			..Default::default()
		};

		for base in &plan.stale {
			self.remove_stale(&plan.unit_dir, base, &mut outcome).await;
		}

		for unit in &plan.to_write {
			for file in unit.files() {
				let path = plan.unit_dir.join(&file.file_name);
				tokio::fs::write(&path, &file.contents)
					.await
					.map_err(|source| SystemdError::WriteUnit {
						unit: file.file_name.clone(),
						source,
					})?;
				debug!(unit = %file.file_name, "unit written");
				outcome.written.push(path);
			}
		}

		self
			.manager
			.daemon_reload()
			.await
			.map_err(|e| SystemdError::DaemonReload(Box::new(e)))?;

		for unit in &plan.to_write {
			for timer in unit.timers() {
				match self.activate(timer).await {
					Ok(()) => {
						info!(unit = %timer, "timer activated");
						outcome.activated.push(timer.to_string());
					}
					Err(e) => {
						warn!(unit = %timer, error = %e, "failed to activate timer");
						outcome.activation_failures.push(UnitFailure {
							unit: timer.to_string(),
							error: e.to_string(),
						});
					}
				}
			}
		}

		Ok(outcome)
	}

	async fn activate(&self, timer: &str) -> Result<()> {
		self.manager.enable(timer).await?;
		self.manager.restart(timer).await
	}

	async fn remove_stale(&self, unit_dir: &Path, base: &str, outcome: &mut ReconcileOutcome) {
		info!(unit = %base, "removing stale units");

		for suffix in [".timer", ".service"] {
			let unit = format!("{base}{suffix}");
			if let Err(e) = self.manager.disable_now(&unit).await {
				warn!(unit = %unit, error = %e, "failed to disable stale unit");
				outcome.cleanup_failures.push(UnitFailure {
					unit,
					error: e.to_string(),
				});
			}
		}

		for suffix in UNIT_SUFFIXES {
			let file_name = format!("{base}{suffix}");
			match tokio::fs::remove_file(unit_dir.join(&file_name)).await {
				Ok(()) => debug!(unit = %file_name, "stale unit file removed"),
				Err(e) if e.kind() == ErrorKind::NotFound => {}
				Err(e) => {
					warn!(unit = %file_name, error = %e, "failed to remove stale unit file");
					outcome.cleanup_failures.push(UnitFailure {
						unit: file_name,
						error: e.to_string(),
					});
				}
			}
		}

		outcome.removed.push(base.to_string());
	}
}

/// Base names of every `resticara-*.service` and `resticara-*.timer` file.
async fn scan_unit_dir(dir: &Path) -> Result<BTreeSet<String>> {
	let scan_err = |source| SystemdError::ScanUnitDir {
		path: dir.to_path_buf(),
		source,
	};

	let mut names = BTreeSet::new();
	let mut entries = tokio::fs::read_dir(dir).await.map_err(scan_err)?;
	while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
		let file_name = entry.file_name();
		let Some(name) = file_name.to_str() else {
			continue;
		};
		if !name.starts_with(UNIT_PREFIX) {
			continue;
		}
		if let Some(base) = UNIT_SUFFIXES
			.iter()
			.find_map(|suffix| name.strip_suffix(suffix))
		{
			names.insert(base.to_string());
		}
	}
	Ok(names)
}

async fn is_dir(path: &Path) -> bool {
	tokio::fs::metadata(path)
		.await
		.map(|m| m.is_dir())
		.unwrap_or(false)
}

/// Whether this process can create files in `path`. Permission bits alone
/// do not say so for a directory owned by another user, so a marker file is
/// created and removed.
async fn is_writable(path: &Path) -> bool {
	let marker = path.join(format!(".resticara-write-check-{}", std::process::id()));
	let created = tokio::fs::OpenOptions::new()
		.write(true)
		.create_new(true)
		.open(&marker)
		.await;
	match created {
		Ok(file) => {
			drop(file);
			if let Err(e) = tokio::fs::remove_file(&marker).await {
				warn!(path = %marker.display(), error = %e, "failed to remove write check file");
			}
			true
		}
		Err(e) => {
			debug!(dir = %path.display(), error = %e, "unit directory is not writable");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use resticara_core::{JobSpec, JobTarget, Retention};
	use tempfile::TempDir;
	use tokio::sync::Mutex;

	/// Records every call; fails the units (or reload) it is told to.
	#[derive(Default)]
	struct FakeManager {
		search_path: Vec<PathBuf>,
		failing_units: Vec<String>,
		fail_reload: bool,
		calls: Mutex<Vec<String>>,
	}

	impl FakeManager {
		fn with_path(dir: &Path) -> Self {
			Self {
				search_path: vec![dir.to_path_buf()],
				..Default::default()
			}
		}

		async fn calls(&self) -> Vec<String> {
			self.calls.lock().await.clone()
		}

		async fn record(&self, call: String, unit: &str) -> Result<()> {
			self.calls.lock().await.push(call);
			if self.failing_units.iter().any(|u| u == unit) {
				Err(SystemdError::CommandFailed {
					args: unit.to_string(),
					stderr: "scripted failure".to_string(),
				})
			} else {
				Ok(())
			}
		}
	}

	#[async_trait]
	impl ServiceManager for FakeManager {
		async fn unit_search_path(&self) -> Result<Vec<PathBuf>> {
			Ok(self.search_path.clone())
		}

		async fn disable_now(&self, unit: &str) -> Result<()> {
			self.record(format!("disable --now {unit}"), unit).await
		}

		async fn daemon_reload(&self) -> Result<()> {
			self.calls.lock().await.push("daemon-reload".to_string());
			if self.fail_reload {
				Err(SystemdError::CommandFailed {
					args: "daemon-reload".to_string(),
					stderr: "scripted failure".to_string(),
				})
			} else {
				Ok(())
			}
		}

		async fn enable(&self, unit: &str) -> Result<()> {
			self.record(format!("enable {unit}"), unit).await
		}

		async fn restart(&self, unit: &str) -> Result<()> {
			self.record(format!("restart {unit}"), unit).await
		}
	}

	fn job(key: &str, repository: &str) -> JobSpec {
		JobSpec {
			key: key.to_string(),
			target: JobTarget::Directory {
				path: PathBuf::from("/data"),
			},
			repository: repository.to_string(),
			retention: Retention {
				daily: 7,
				weekly: 4,
				monthly: 6,
			},
			prune_interval_days: None,
		}
	}

	fn jobs(keys: &[&str]) -> JobSet {
		let mut set = JobSet::new();
		for key in keys {
			set.insert(job(key, "/repo")).unwrap();
		}
		set
	}

	fn reconciler(manager: Arc<FakeManager>) -> UnitReconciler {
		UnitReconciler::new(manager, ReconcileSettings::default())
	}

	fn dir_listing(dir: &Path) -> BTreeMap<String, String> {
		std::fs::read_dir(dir)
			.unwrap()
			.map(|e| {
				let e = e.unwrap();
				(
					e.file_name().to_string_lossy().into_owned(),
					std::fs::read_to_string(e.path()).unwrap(),
				)
			})
			.collect()
	}

	/// Test: one pass writes four files per job, reloads once and activates
	/// every timer in order.
	#[tokio::test]
	async fn writes_units_and_activates_timers() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));

		let outcome = reconciler(manager.clone())
			.reconcile(&jobs(&["dir:home", "mysql:orders"]))
			.await
			.unwrap();

		assert_eq!(outcome.written.len(), 8);
		assert_eq!(dir_listing(dir.path()).len(), 8);
		assert!(outcome.removed.is_empty());
		assert_eq!(
			manager.calls().await,
			vec![
				"daemon-reload",
				"enable resticara-dir-home.timer",
				"restart resticara-dir-home.timer",
				"enable resticara-dir-home-prune.timer",
				"restart resticara-dir-home-prune.timer",
				"enable resticara-mysql-orders.timer",
				"restart resticara-mysql-orders.timer",
				"enable resticara-mysql-orders-prune.timer",
				"restart resticara-mysql-orders-prune.timer",
			]
		);
		assert_eq!(outcome.activated.len(), 4);
	}

	/// Test: reconciling twice with unchanged jobs leaves byte-identical files
	/// and removes nothing on the second pass.
	#[tokio::test]
	async fn reconcile_is_idempotent() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));
		let reconciler = reconciler(manager.clone());
		let set = jobs(&["dir:home", "dir:my backup"]);

		reconciler.reconcile(&set).await.unwrap();
		let first = dir_listing(dir.path());

		let second_outcome = reconciler.reconcile(&set).await.unwrap();
		let second = dir_listing(dir.path());

		assert_eq!(first, second);
		assert!(second_outcome.removed.is_empty());
		assert!(!manager.calls().await.iter().any(|c| c.starts_with("disable")));
	}

	/// Test: removing a job deletes exactly its four files and disables its
	/// timers and services; other units are untouched.
	#[tokio::test]
	async fn removed_job_converges() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));
		let reconciler = reconciler(manager.clone());

		reconciler
			.reconcile(&jobs(&["dir:home", "mysql:orders"]))
			.await
			.unwrap();
		let before = dir_listing(dir.path());

		let outcome = reconciler.reconcile(&jobs(&["dir:home"])).await.unwrap();
		let after = dir_listing(dir.path());

		assert_eq!(
			outcome.removed,
			vec!["resticara-mysql-orders", "resticara-mysql-orders-prune"]
		);
		let deleted: BTreeSet<&String> = before.keys().filter(|k| !after.contains_key(*k)).collect();
		assert_eq!(deleted.len(), 4);
		assert!(deleted.iter().all(|name| name.starts_with("resticara-mysql-orders")));
		for (name, contents) in &after {
			assert_eq!(before.get(name), Some(contents));
		}

		let calls = manager.calls().await;
		assert!(calls.contains(&"disable --now resticara-mysql-orders.timer".to_string()));
		assert!(calls.contains(&"disable --now resticara-mysql-orders.service".to_string()));
		let timer_pos = calls
			.iter()
			.position(|c| c == "disable --now resticara-mysql-orders.timer");
		let service_pos = calls
			.iter()
			.position(|c| c == "disable --now resticara-mysql-orders.service");
		assert!(timer_pos < service_pos);
	}

	#[tokio::test]
	async fn unrelated_files_are_ignored() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("sshd.service"), "x").unwrap();
		std::fs::write(dir.path().join("resticara-notes.txt"), "x").unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));

		let plan = reconciler(manager).plan(&jobs(&["dir:home"])).await.unwrap();
		assert!(plan.stale.is_empty());
		assert!(dir.path().join("sshd.service").exists());
	}

	/// Test: a failing timer activation is recorded and the remaining timers
	/// are still activated.
	#[tokio::test]
	async fn activation_failure_is_not_fatal() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager {
			search_path: vec![dir.path().to_path_buf()],
			failing_units: vec!["resticara-dir-a.timer".to_string()],
			..Default::default()
		});

		let outcome = reconciler(manager.clone())
			.reconcile(&jobs(&["dir:a", "dir:b"]))
			.await
			.unwrap();

		assert!(outcome.has_activation_failures());
		assert_eq!(outcome.activation_failures.len(), 1);
		assert_eq!(outcome.activation_failures[0].unit, "resticara-dir-a.timer");
		assert_eq!(outcome.activated.len(), 3);
		assert!(!manager
			.calls()
			.await
			.contains(&"restart resticara-dir-a.timer".to_string()));
	}

	#[tokio::test]
	async fn stale_cleanup_failure_is_not_fatal() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("resticara-dir-old.service"), "x").unwrap();
		std::fs::write(dir.path().join("resticara-dir-old.timer"), "x").unwrap();
		let manager = Arc::new(FakeManager {
			search_path: vec![dir.path().to_path_buf()],
			failing_units: vec!["resticara-dir-old.timer".to_string()],
			..Default::default()
		});

		let outcome = reconciler(manager).reconcile(&jobs(&["dir:a"])).await.unwrap();

		assert_eq!(outcome.removed, vec!["resticara-dir-old"]);
		assert_eq!(outcome.cleanup_failures.len(), 1);
		assert!(!dir.path().join("resticara-dir-old.service").exists());
		assert!(!dir.path().join("resticara-dir-old.timer").exists());
	}

	/// Test: a write failure aborts the pass naming the unit, before reload.
	#[tokio::test]
	async fn write_failure_names_unit() {
		let dir = TempDir::new().unwrap();
		std::fs::create_dir(dir.path().join("resticara-dir-a.timer")).unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));

		let err = reconciler(manager.clone())
			.reconcile(&jobs(&["dir:a"]))
			.await
			.unwrap_err();

		match err {
			SystemdError::WriteUnit { unit, .. } => assert_eq!(unit, "resticara-dir-a.timer"),
			other => panic!("unexpected error: {other:?}"),
		}
		assert!(!manager.calls().await.contains(&"daemon-reload".to_string()));
	}

	/// Test: a failed daemon-reload aborts before any timer is touched.
	#[tokio::test]
	async fn reload_failure_aborts_activation() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager {
			search_path: vec![dir.path().to_path_buf()],
			fail_reload: true,
			..Default::default()
		});

		let err = reconciler(manager.clone())
			.reconcile(&jobs(&["dir:a"]))
			.await
			.unwrap_err();

		assert!(matches!(err, SystemdError::DaemonReload(_)));
		assert_eq!(manager.calls().await, vec!["daemon-reload"]);
		assert_eq!(dir_listing(dir.path()).len(), 4);
	}

	#[tokio::test]
	async fn colliding_unit_names_are_rejected() {
		let dir = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager::with_path(dir.path()));

		let err = reconciler(manager)
			.plan(&jobs(&["dir:a b", "dir:a/b"]))
			.await
			.unwrap_err();
		assert!(matches!(err, SystemdError::NameCollision { .. }));
	}

	#[tokio::test]
	async fn prefers_preferred_dir_when_listed() {
		let first = TempDir::new().unwrap();
		let preferred = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager {
			search_path: vec![
				PathBuf::from("/nonexistent/resticara-units"),
				first.path().to_path_buf(),
				preferred.path().to_path_buf(),
			],
			..Default::default()
		});
		let reconciler = UnitReconciler::new(
			manager,
			ReconcileSettings {
				preferred_unit_dir: preferred.path().to_path_buf(),
				..Default::default()
			},
		);

		assert_eq!(reconciler.resolve_unit_dir().await.unwrap(), preferred.path());
	}

	#[tokio::test]
	async fn falls_back_to_first_existing_dir() {
		let existing = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager {
			search_path: vec![
				PathBuf::from("/nonexistent/resticara-units"),
				existing.path().to_path_buf(),
			],
			..Default::default()
		});

		let dir = reconciler(manager).resolve_unit_dir().await.unwrap();
		assert_eq!(dir, existing.path());
	}

	#[tokio::test]
	async fn writability_is_checked_by_creating_a_file() {
		let dir = TempDir::new().unwrap();
		assert!(is_writable(dir.path()).await);
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

		assert!(!is_writable(Path::new("/nonexistent/resticara-units")).await);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn read_only_preferred_dir_falls_back() {
		use std::os::unix::fs::PermissionsExt;

		let listed = TempDir::new().unwrap();
		let preferred = TempDir::new().unwrap();
		std::fs::set_permissions(preferred.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
		// Superusers bypass directory permissions.
		let can_write = std::fs::write(preferred.path().join("check"), "").is_ok();

		let manager = Arc::new(FakeManager {
			search_path: vec![listed.path().to_path_buf(), preferred.path().to_path_buf()],
			..Default::default()
		});
		let reconciler = UnitReconciler::new(
			manager,
			ReconcileSettings {
				preferred_unit_dir: preferred.path().to_path_buf(),
				..Default::default()
			},
		);
		let resolved = reconciler.resolve_unit_dir().await.unwrap();

		std::fs::set_permissions(preferred.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
		let expected = if can_write { preferred.path() } else { listed.path() };
		assert_eq!(resolved, expected);
	}

	#[tokio::test]
	async fn no_existing_dir_is_fatal() {
		let manager = Arc::new(FakeManager {
			search_path: vec![PathBuf::from("/nonexistent/resticara-units")],
			..Default::default()
		});

		let err = reconciler(manager).resolve_unit_dir().await.unwrap_err();
		assert!(matches!(err, SystemdError::UnitDirNotFound(_)));
	}

	#[tokio::test]
	async fn explicit_unit_dir_wins() {
		let listed = TempDir::new().unwrap();
		let explicit = TempDir::new().unwrap();
		let manager = Arc::new(FakeManager::with_path(listed.path()));
		let reconciler = UnitReconciler::new(
			manager,
			ReconcileSettings {
				unit_dir: Some(explicit.path().to_path_buf()),
				..Default::default()
			},
		);

		assert_eq!(reconciler.resolve_unit_dir().await.unwrap(), explicit.path());
	}
}
