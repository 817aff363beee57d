// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Report output for Resticara.
//!
//! A finished [`RunReport`](resticara_core::RunReport) is printed to the
//! console, optionally written to the local syslog, rendered into a
//! [`Message`] and handed to every enabled [`Notifier`]: email over SMTP,
//! Telegram and Matrix.

pub mod console;
pub mod email;
pub mod error;
pub mod http;
pub mod matrix;
pub mod notifier;
pub mod render;
pub mod syslog;
pub mod telegram;

pub use console::{log_summary, write_summary};
pub use email::EmailNotifier;
pub use error::{NotifyError, Result};
pub use matrix::MatrixNotifier;
pub use notifier::{DeliveryOutcome, Notifier, NotifierSet};
pub use render::{render_template, Message, DEFAULT_MAIL_TEMPLATE};
pub use syslog::{SyslogWriter, DEFAULT_SYSLOG_SOCKET};
pub use telegram::TelegramNotifier;
