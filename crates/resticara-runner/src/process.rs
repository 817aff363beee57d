// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::{Output, Stdio};

use async_trait::async_trait;
use resticara_core::{CommandResult, CommandSpec, Invocation};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::executor::CommandExecutor;

/// Executor that spawns real processes with `tokio::process`.
pub struct ProcessExecutor;

impl ProcessExecutor {
	pub fn new() -> Self {
		Self
	}
}

impl Default for ProcessExecutor {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
	async fn execute(&self, spec: &CommandSpec) -> CommandResult {
		let command_text = spec.to_string();
		trace!(cmd = %command_text, "running command");

		match spec {
			CommandSpec::Single(invocation) => run_single(invocation, command_text).await,
			CommandSpec::Piped { producer, consumer } => {
				run_piped(producer, consumer, command_text).await
			}
		}
	}
}

fn command_for(invocation: &Invocation) -> Command {
	let mut cmd = Command::new(&invocation.program);
	cmd.args(&invocation.args);
	cmd
}

async fn run_single(invocation: &Invocation, command_text: String) -> CommandResult {
	let mut cmd = command_for(invocation);
	cmd
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped());

	let output = match cmd.output().await {
		Ok(output) => output,
		Err(e) => return start_failure(command_text, &invocation.program, e),
	};

	let stdout = lossy(&output.stdout);
	let stderr = lossy(&output.stderr);

	if output.status.success() {
		debug!(cmd = %command_text, "command succeeded");
		CommandResult::success(command_text, stdout, stderr)
	} else {
		warn!(cmd = %command_text, status = %output.status, "command failed");
		CommandResult::failure(command_text, stdout, stderr)
	}
}

/// Runs `producer | consumer`.
///
/// The producer's exit, the byte pump into the consumer's stdin and the
/// consumer's exit are three spawned tasks; all of them are joined before the
/// result is formed. The consumer's stdin is closed once the producer's
/// stdout reaches end-of-file.
async fn run_piped(producer: &Invocation, consumer: &Invocation, command_text: String) -> CommandResult {
	let mut producer_cmd = command_for(producer);
	producer_cmd
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped());

	let mut producer_child = match producer_cmd.spawn() {
		Ok(child) => child,
		Err(e) => return start_failure(command_text, &producer.program, e),
	};

	let mut consumer_cmd = command_for(consumer);
	consumer_cmd
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped());

	let mut consumer_child = match consumer_cmd.spawn() {
		Ok(child) => child,
		Err(e) => {
			if let Err(kill_err) = producer_child.kill().await {
				warn!(program = %producer.program, error = %kill_err, "failed to stop producer");
			}
			return start_failure(command_text, &consumer.program, e);
		}
	};

	let (Some(mut producer_stdout), Some(mut consumer_stdin)) =
		(producer_child.stdout.take(), consumer_child.stdin.take())
	else {
		let _ = producer_child.kill().await;
		let _ = consumer_child.kill().await;
		return CommandResult::failure(
			command_text,
			String::new(),
			"pipe between processes was not created".to_string(),
		);
	};

	let pump = tokio::spawn(async move {
		let copied = match tokio::io::copy(&mut producer_stdout, &mut consumer_stdin).await {
			Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
				// The consumer stopped reading; its exit status decides. Drain the
				// rest so the producer is not left blocked on a full pipe.
				drop(consumer_stdin);
				debug!("consumer closed its input early");
				return tokio::io::copy(&mut producer_stdout, &mut tokio::io::sink()).await;
			}
			copied => copied,
		};
		let closed = consumer_stdin.shutdown().await;
		drop(consumer_stdin);
		match (copied, closed) {
			(Err(e), _) => Err(e),
			// The consumer may already have exited after reading everything.
			(Ok(_), Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
			(Ok(bytes), _) => Ok(bytes),
		}
	});
	let producer_task = tokio::spawn(producer_child.wait_with_output());
	let consumer_task = tokio::spawn(consumer_child.wait_with_output());

	let (pump, producer_exit, consumer_exit) = tokio::join!(pump, producer_task, consumer_task);

	let mut first_failure: Option<String> = None;
	let mut record = |reason: String| {
		if first_failure.is_none() {
			first_failure = Some(reason);
		}
	};

	match producer_exit {
		Ok(Ok(output)) if output.status.success() => {}
		Ok(Ok(output)) => {
			let stderr = lossy(&output.stderr);
			warn!(
				program = %producer.program,
				status = %output.status,
				stderr = %stderr.trim(),
				"producer failed"
			);
			record(format!("{} exited with {}", producer.program, output.status));
		}
		Ok(Err(e)) => record(format!("waiting for {} failed: {e}", producer.program)),
		Err(e) => record(format!("producer task failed: {e}")),
	}

	match pump {
		Ok(Ok(bytes)) => trace!(bytes, "pipe drained"),
		Ok(Err(e)) => record(format!("piping {} into {} failed: {e}", producer.program, consumer.program)),
		Err(e) => record(format!("pipe task failed: {e}")),
	}

	let (stdout, stderr) = match consumer_exit {
		Ok(Ok(output)) => {
			if !output.status.success() {
				record(format!("{} exited with {}", consumer.program, output.status));
			}
			consumer_streams(&output)
		}
		Ok(Err(e)) => {
			let reason = format!("waiting for {} failed: {e}", consumer.program);
			record(reason.clone());
			(String::new(), reason)
		}
		Err(e) => {
			let reason = format!("consumer task failed: {e}");
			record(reason.clone());
			(String::new(), reason)
		}
	};

	match first_failure {
		None => {
			debug!(cmd = %command_text, "pipeline succeeded");
			CommandResult::success(command_text, stdout, stderr)
		}
		Some(reason) => {
			warn!(cmd = %command_text, reason = %reason, "pipeline failed");
			CommandResult::failure(command_text, stdout, append_reason(stderr, &reason))
		}
	}
}

/// Adds the pipeline failure reason after the consumer's own stderr so the
/// report shows which side failed.
fn append_reason(mut stderr: String, reason: &str) -> String {
	if !stderr.is_empty() && !stderr.ends_with('\n') {
		stderr.push('\n');
	}
	stderr.push_str(reason);
	stderr
}

fn consumer_streams(output: &Output) -> (String, String) {
	(lossy(&output.stdout), lossy(&output.stderr))
}

fn start_failure(command_text: String, program: &str, e: std::io::Error) -> CommandResult {
	let message = if e.kind() == std::io::ErrorKind::NotFound {
		warn!(program = %program, "executable not found");
		format!("failed to start {program}: executable not found")
	} else {
		warn!(program = %program, error = %e, "failed to start process");
		format!("failed to start {program}: {e}")
	};
	CommandResult::failure(command_text, String::new(), message)
}

fn lossy(bytes: &[u8]) -> String {
	String::from_utf8_lossy(bytes).into_owned()
}
