// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Matrix notification section.

use resticara_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use super::smtp::required;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatrixConfigLayer {
	pub enabled: Option<bool>,
	pub homeserver: Option<String>,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub room_id: Option<String>,
}

impl MatrixConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.homeserver.is_some() {
			self.homeserver = other.homeserver;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.room_id.is_some() {
			self.room_id = other.room_id;
		}
	}

	pub fn finalize(self) -> Result<Option<MatrixConfig>, ConfigError> {
		let enabled = self.enabled.unwrap_or(self != Self::default());
		if !enabled {
			return Ok(None);
		}

		let homeserver = required("matrix.homeserver", self.homeserver)?;
		let username = required("matrix.username", self.username)?;
		let room_id = required("matrix.room_id", self.room_id)?;
		let password = self
			.password
			.filter(|p| !p.is_empty())
			.ok_or_else(|| ConfigError::Validation("matrix.password is required when enabled".to_string()))?;

		Ok(Some(MatrixConfig {
			homeserver: homeserver.trim_end_matches('/').to_string(),
			username,
			password,
			room_id,
		}))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
	/// Base URL without a trailing slash.
	pub homeserver: String,
	pub username: String,
	pub password: SecretString,
	pub room_id: String,
}
