// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RFC 5424 notices to the local syslog socket.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use resticara_core::RunReport;
use tokio::net::UnixDatagram;
use tracing::debug;

use crate::error::{NotifyError, Result};

pub const DEFAULT_SYSLOG_SOCKET: &str = "/dev/log";

const APP_NAME: &str = "resticara";
const FACILITY_USER: u8 = 1;
const SEVERITY_NOTICE: u8 = 5;

pub struct SyslogWriter {
	socket: UnixDatagram,
	path: PathBuf,
	hostname: String,
}

impl SyslogWriter {
	pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let socket = UnixDatagram::unbound().map_err(NotifyError::Syslog)?;
		socket.connect(&path).map_err(NotifyError::Syslog)?;

		let hostname = hostname::get()
			.map(|h| h.to_string_lossy().into_owned())
			.unwrap_or_else(|_| "-".to_string());

		debug!(path = %path.display(), "connected to syslog socket");
		Ok(Self {
			socket,
			path,
			hostname,
		})
	}

	pub async fn notice(&self, message: &str) -> Result<()> {
		let line = format_rfc5424(
			FACILITY_USER,
			SEVERITY_NOTICE,
			Utc::now(),
			&self.hostname,
			message,
		);
		self
			.socket
			.send(line.as_bytes())
			.await
			.map_err(NotifyError::Syslog)?;
		Ok(())
	}

	/// One notice per summary line.
	pub async fn write_report(&self, report: &RunReport) -> Result<()> {
		for line in summary_lines(report) {
			self.notice(&line).await?;
		}
		debug!(path = %self.path.display(), "report written to syslog");
		Ok(())
	}
}

pub fn summary_lines(report: &RunReport) -> Vec<String> {
	let mut lines = vec![
		format!("Host ID: {}", report.host_id),
		format!("Date: {}", report.formatted_date()),
		format!("Status: {}", report.status_message()),
	];
	for result in report.job_results() {
		lines.push(format!("Command Key: {}", result.job_key));
		lines.push(format!("Backup Command: {}", result.backup.command_text));
		lines.push(format!("Backup Output: {}", result.backup.output().trim()));
		lines.push(format!("Forget Command: {}", result.retention.command_text));
		lines.push(format!("Forget Output: {}", result.retention.output().trim()));
	}
	lines
}

pub fn format_rfc5424(
	facility: u8,
	severity: u8,
	timestamp: DateTime<Utc>,
	hostname: &str,
	message: &str,
) -> String {
	let pri = (facility * 8) + severity;
	let timestamp = timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ");
	let procid = std::process::id();
	format!("<{pri}>1 {timestamp} {hostname} {APP_NAME} {procid} - - {message}")
}
