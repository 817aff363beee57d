// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP notification section.

use resticara_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SmtpConfigLayer {
	pub enabled: Option<bool>,
	pub server: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub from: Option<String>,
	/// Comma-separated recipient list.
	pub to: Option<String>,
	pub use_tls: Option<bool>,
}

impl SmtpConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.server.is_some() {
			self.server = other.server;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.from.is_some() {
			self.from = other.from;
		}
		if other.to.is_some() {
			self.to = other.to;
		}
		if other.use_tls.is_some() {
			self.use_tls = other.use_tls;
		}
	}

	fn is_unset(&self) -> bool {
		self == &Self::default()
	}

	/// `None` when SMTP is disabled. A section with any field set counts as
	/// enabled unless `enabled = false`.
	pub fn finalize(self) -> Result<Option<SmtpConfig>, ConfigError> {
		let enabled = self.enabled.unwrap_or(!self.is_unset());
		if !enabled {
			return Ok(None);
		}

		let server = required("smtp.server", self.server)?;
		let from = required("smtp.from", self.from)?;
		let to: Vec<String> = required("smtp.to", self.to)?
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect();
		if to.is_empty() {
			return Err(ConfigError::Validation("smtp.to has no recipients".to_string()));
		}

		Ok(Some(SmtpConfig {
			server,
			port: self.port.unwrap_or(DEFAULT_SMTP_PORT),
			username: self.username.filter(|u| !u.is_empty()),
			password: self.password.filter(|p| !p.is_empty()),
			from,
			to,
			use_tls: self.use_tls.unwrap_or(true),
		}))
	}
}

pub(crate) fn required(key: &str, value: Option<String>) -> Result<String, ConfigError> {
	value
		.filter(|v| !v.trim().is_empty())
		.ok_or_else(|| ConfigError::Validation(format!("{key} is required when enabled")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
	pub server: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub from: String,
	pub to: Vec<String>,
	/// STARTTLS when true, plaintext otherwise.
	pub use_tls: bool,
}
