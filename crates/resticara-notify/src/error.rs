// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("{service} returned {status}: {message}")]
	Api {
		service: &'static str,
		status: u16,
		message: String,
	},

	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	#[error("invalid email address: {0}")]
	Address(String),

	#[error("failed to build email: {0}")]
	Build(String),

	#[error("SMTP error: {0}")]
	Smtp(String),

	#[error("syslog write failed: {0}")]
	Syslog(#[source] std::io::Error),
}
