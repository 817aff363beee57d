// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The mergeable, all-optional form of the configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sections::{
	GeneralConfigLayer, JobConfigLayer, LoggingConfigLayer, MatrixConfigLayer, SmtpConfigLayer,
	SyslogConfigLayer, SystemdConfigLayer, TelegramConfigLayer, ToolsConfigLayer,
};

/// One configuration source's contribution. Later layers override earlier
/// ones field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResticaraConfigLayer {
	pub general: Option<GeneralConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
	pub tools: Option<ToolsConfigLayer>,
	pub systemd: Option<SystemdConfigLayer>,
	pub smtp: Option<SmtpConfigLayer>,
	pub telegram: Option<TelegramConfigLayer>,
	pub matrix: Option<MatrixConfigLayer>,
	pub syslog: Option<SyslogConfigLayer>,
	/// Keyed by `"<kind>:<name>"`.
	pub jobs: Option<BTreeMap<String, JobConfigLayer>>,
}

macro_rules! merge_section {
	($self:ident, $other:ident, $field:ident) => {
		if let Some(other) = $other.$field {
			match &mut $self.$field {
				Some(existing) => existing.merge(other),
				None => $self.$field = Some(other),
			}
		}
	};
}

impl ResticaraConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_section!(self, other, general);
		merge_section!(self, other, logging);
		merge_section!(self, other, tools);
		merge_section!(self, other, systemd);
		merge_section!(self, other, smtp);
		merge_section!(self, other, telegram);
		merge_section!(self, other, matrix);
		merge_section!(self, other, syslog);

		if let Some(other_jobs) = other.jobs {
			let jobs = self.jobs.get_or_insert_with(BTreeMap::new);
			for (key, layer) in other_jobs {
				match jobs.get_mut(&key) {
					Some(existing) => existing.merge(layer),
					None => {
						jobs.insert(key, layer);
					}
				}
			}
		}
	}
}
