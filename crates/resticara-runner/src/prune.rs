// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use resticara_core::{CommandBuilder, CommandResult, CoreError, JobSet};
use tracing::{info, warn};

use crate::error::Result;
use crate::executor::CommandExecutor;

/// Which repositories `resticara prune` compacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneTarget {
	All,
	Repository(String),
}

impl PruneTarget {
	/// `"all"` selects every repository; anything else names one.
	pub fn from_arg(arg: &str) -> Self {
		if arg == "all" {
			PruneTarget::All
		} else {
			PruneTarget::Repository(arg.to_string())
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
	pub repository: String,
	pub result: CommandResult,
}

/// Runs `restic prune` once per unique repository referenced by a job.
pub struct PruneRunner {
	executor: Arc<dyn CommandExecutor>,
	builder: CommandBuilder,
}

impl PruneRunner {
	pub fn new(executor: Arc<dyn CommandExecutor>, builder: CommandBuilder) -> Self {
		Self { executor, builder }
	}

	pub async fn run(&self, jobs: &JobSet, target: &PruneTarget) -> Result<Vec<PruneOutcome>> {
		let repositories = jobs.repositories();

		let selected: Vec<&str> = match target {
			PruneTarget::All => repositories.into_iter().collect(),
			PruneTarget::Repository(repo) => {
				if !repositories.contains(repo.as_str()) {
					return Err(CoreError::UnknownRepository(repo.clone()).into());
				}
				vec![repo.as_str()]
			}
		};

		let mut outcomes = Vec::with_capacity(selected.len());
		for repository in selected {
			info!(repository = %repository, "pruning repository");
			let result = self.executor.execute(&self.builder.prune(repository)).await;
			if !result.succeeded {
				warn!(repository = %repository, "prune failed");
			}
			outcomes.push(PruneOutcome {
				repository: repository.to_string(),
				result,
			});
		}

		Ok(outcomes)
	}
}
