// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use resticara_config::ResticaraConfig;
use tracing::{info, warn};

use crate::email::EmailNotifier;
use crate::error::Result;
use crate::http::new_client;
use crate::matrix::MatrixNotifier;
use crate::render::Message;
use crate::telegram::TelegramNotifier;

/// A channel a rendered report can be delivered to.
#[async_trait]
pub trait Notifier: Send + Sync {
	fn channel(&self) -> &'static str;

	async fn send(&self, message: &Message) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
	pub channel: &'static str,
	pub error: Option<String>,
}

impl DeliveryOutcome {
	pub fn is_delivered(&self) -> bool {
		self.error.is_none()
	}
}

/// Every enabled channel.
#[derive(Default)]
pub struct NotifierSet {
	notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, notifier: Box<dyn Notifier>) {
		self.notifiers.push(notifier);
	}

	pub fn is_empty(&self) -> bool {
		self.notifiers.is_empty()
	}

	pub fn len(&self) -> usize {
		self.notifiers.len()
	}

	/// Builds one notifier per enabled section: email, Telegram, Matrix.
	pub fn from_config(config: &ResticaraConfig) -> Result<Self> {
		let mut set = Self::new();

		if let Some(smtp) = &config.smtp {
			set.push(Box::new(EmailNotifier::new(smtp)?));
		}

		if config.telegram.is_some() || config.matrix.is_some() {
			let http = new_client()?;
			if let Some(telegram) = &config.telegram {
				set.push(Box::new(TelegramNotifier::new(telegram, http.clone())));
			}
			if let Some(matrix) = &config.matrix {
				set.push(Box::new(MatrixNotifier::new(matrix, http)?));
			}
		}

		Ok(set)
	}

	/// Sends to every channel in order. A failing channel is logged and
	/// recorded; the remaining channels are still attempted.
	pub async fn dispatch(&self, message: &Message) -> Vec<DeliveryOutcome> {
		let mut outcomes = Vec::with_capacity(self.notifiers.len());
		for notifier in &self.notifiers {
			let channel = notifier.channel();
			let error = match notifier.send(message).await {
				Ok(()) => {
					info!(channel, "notification sent");
					None
				}
				Err(e) => {
					warn!(channel, error = %e, "notification failed");
					Some(e.to_string())
				}
			};
			outcomes.push(DeliveryOutcome { channel, error });
		}
		outcomes
	}
}
