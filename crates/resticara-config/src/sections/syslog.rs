// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Syslog section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyslogConfigLayer {
	pub enabled: Option<bool>,
}

impl SyslogConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
	}

	pub fn finalize(self) -> SyslogConfig {
		SyslogConfig {
			enabled: self.enabled.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyslogConfig {
	/// Send run summaries to the local syslog socket.
	pub enabled: bool,
}
