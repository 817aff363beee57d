// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use resticara_config::ResticaraConfig;
use resticara_core::CommandBuilder;
use resticara_runner::{ProcessExecutor, PruneOutcome, PruneRunner, PruneTarget};

/// `resticara prune <all|repository>`. Exits non-zero if any prune failed.
pub async fn execute(config: &ResticaraConfig, target: &str) -> Result<ExitCode> {
	let runner = PruneRunner::new(
		Arc::new(ProcessExecutor::new()),
		CommandBuilder::new(config.tools.clone()),
	);
	let outcomes = runner
		.run(&config.jobs, &PruneTarget::from_arg(target))
		.await
		.context("prune aborted")?;

	for outcome in &outcomes {
		print_outcome(outcome);
	}

	Ok(if outcomes.iter().all(|o| o.result.succeeded) {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	})
}

fn print_outcome(outcome: &PruneOutcome) {
	let status = if outcome.result.succeeded {
		"ok".green()
	} else {
		"FAILED".red().bold()
	};
	println!("Prune {}: {status}", outcome.repository.bold());
	println!("  Command: {}", outcome.result.command_text);
	println!("  Output: {}", outcome.result.output().trim());
}
