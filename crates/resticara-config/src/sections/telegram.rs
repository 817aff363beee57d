// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram notification section.

use resticara_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelegramConfigLayer {
	pub enabled: Option<bool>,
	pub bot_token: Option<SecretString>,
	pub chat_id: Option<i64>,
}

impl TelegramConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.bot_token.is_some() {
			self.bot_token = other.bot_token;
		}
		if other.chat_id.is_some() {
			self.chat_id = other.chat_id;
		}
	}

	pub fn finalize(self) -> Result<Option<TelegramConfig>, ConfigError> {
		let enabled = self.enabled.unwrap_or(self != Self::default());
		if !enabled {
			return Ok(None);
		}

		let bot_token = self
			.bot_token
			.filter(|t| !t.is_empty())
			.ok_or_else(|| ConfigError::Validation("telegram.bot_token is required when enabled".to_string()))?;
		let chat_id = self
			.chat_id
			.ok_or_else(|| ConfigError::Validation("telegram.chat_id is required when enabled".to_string()))?;

		Ok(Some(TelegramConfig { bot_token, chat_id }))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
	pub bot_token: SecretString,
	pub chat_id: i64,
}
