// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram Bot API `sendMessage`.

use async_trait::async_trait;
use reqwest::Client;
use resticara_common_secret::SecretString;
use resticara_config::TelegramConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{NotifyError, Result};
use crate::http::{check_status, redact};
use crate::notifier::Notifier;
use crate::render::Message;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects longer texts.
const MAX_MESSAGE_CHARS: usize = 4096;

pub struct TelegramNotifier {
	http: Client,
	base_url: String,
	bot_token: SecretString,
	chat_id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
	chat_id: i64,
	text: &'a str,
	parse_mode: &'static str,
	disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
	ok: bool,
	#[serde(default)]
	description: Option<String>,
}

impl TelegramNotifier {
	pub fn new(config: &TelegramConfig, http: Client) -> Self {
		Self {
			http,
			base_url: TELEGRAM_API_BASE.to_string(),
			bot_token: config.bot_token.clone(),
			chat_id: config.chat_id,
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	fn send_message_url(&self) -> String {
		format!("{}/bot{}/sendMessage", self.base_url, self.bot_token.expose())
	}
}

#[async_trait]
impl Notifier for TelegramNotifier {
	fn channel(&self) -> &'static str {
		"telegram"
	}

	#[instrument(name = "telegram_send", skip(self, message), fields(chat_id = self.chat_id))]
	async fn send(&self, message: &Message) -> Result<()> {
		let text = escape_html_truncated(&message.as_text(), MAX_MESSAGE_CHARS);
		let request = SendMessageRequest {
			chat_id: self.chat_id,
			text: &text,
			parse_mode: "HTML",
			disable_web_page_preview: true,
		};

		let response = self
			.http
			.post(self.send_message_url())
			.json(&request)
			.send()
			.await
			.map_err(redact)?;
		let response = check_status("telegram", response).await?;
		let status = response.status().as_u16();
		let body: ApiResponse = response.json().await.map_err(redact)?;

		if !body.ok {
			return Err(NotifyError::Api {
				service: "telegram",
				status,
				message: body.description.unwrap_or_default(),
			});
		}

		debug!("telegram message accepted");
		Ok(())
	}
}

/// Escapes `&`, `<` and `>` for HTML parse mode, stopping before the escaped
/// text would exceed `max_chars`.
fn escape_html_truncated(text: &str, max_chars: usize) -> String {
	let mut out = String::with_capacity(text.len().min(max_chars));
	let mut count = 0;
	for c in text.chars() {
		let piece = match c {
			'&' => "&amp;",
			'<' => "&lt;",
			'>' => "&gt;",
			_ => {
				if count + 1 > max_chars {
					break;
				}
				out.push(c);
				count += 1;
				continue;
			}
		};
		if count + piece.len() > max_chars {
			break;
		}
		out.push_str(piece);
		count += piece.len();
	}
	out
}
