// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client for the chat channels.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::{NotifyError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `resticara/{version}`
pub fn user_agent() -> String {
	format!("resticara/{}", env!("CARGO_PKG_VERSION"))
}

pub fn new_client() -> Result<Client> {
	Client::builder()
		.user_agent(user_agent())
		.timeout(REQUEST_TIMEOUT)
		.build()
		.map_err(NotifyError::Http)
}

/// Strips the request URL from transport errors; Telegram URLs embed the
/// bot token.
pub(crate) fn redact(err: reqwest::Error) -> NotifyError {
	NotifyError::Http(err.without_url())
}

/// Turns a non-2xx response into [`NotifyError::Api`] carrying the body.
pub(crate) async fn check_status(service: &'static str, response: Response) -> Result<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let message = response.text().await.unwrap_or_default();
	Err(NotifyError::Api {
		service,
		status: status.as_u16(),
		message,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_version() {
		let ua = user_agent();
		assert!(ua.starts_with("resticara/"));
		assert_eq!(ua.split('/').count(), 2);
	}
}
