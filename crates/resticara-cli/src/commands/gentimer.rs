// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use resticara_config::ResticaraConfig;
use resticara_systemd::{
	ReconcileOutcome, ReconcileSettings, SystemctlClient, UnitReconciler, PREFERRED_UNIT_DIR,
};

pub fn settings(config: &ResticaraConfig) -> ReconcileSettings {
	ReconcileSettings {
		exec_path: config.systemd.exec_path.clone(),
		default_prune_days: config.general.retention_prune,
		unit_dir: config.systemd.unit_dir.clone(),
		preferred_unit_dir: PathBuf::from(PREFERRED_UNIT_DIR),
	}
}

/// `resticara gentimer`. Exits non-zero when any timer failed to activate.
pub async fn execute(config: &ResticaraConfig) -> Result<ExitCode> {
	let reconciler = UnitReconciler::new(Arc::new(SystemctlClient::new()), settings(config));
	let outcome = reconciler
		.reconcile(&config.jobs)
		.await
		.context("failed to reconcile systemd units")?;

	print_outcome(&outcome);

	Ok(if outcome.has_activation_failures() {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	})
}

fn print_outcome(outcome: &ReconcileOutcome) {
	println!("Unit directory: {}", outcome.unit_dir.display());
	for base in &outcome.removed {
		println!("  {} {base}", "removed".yellow());
	}
	for path in &outcome.written {
		println!("  {} {}", "wrote".green(), path.display());
	}
	for timer in &outcome.activated {
		println!("  {} {timer}", "enabled".green());
	}
	for failure in &outcome.cleanup_failures {
		println!("  {} {}: {}", "cleanup failed".yellow(), failure.unit, failure.error);
	}
	for failure in &outcome.activation_failures {
		println!("  {} {}: {}", "FAILED".red().bold(), failure.unit, failure.error);
	}
}
