// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Report delivery over SMTP.

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use resticara_config::SmtpConfig;

use crate::error::{NotifyError, Result};
use crate::notifier::Notifier;
use crate::render::Message;

pub struct EmailNotifier {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
	to: Vec<Mailbox>,
}

impl EmailNotifier {
	/// Builds the transport; the connection is made lazily on send.
	#[tracing::instrument(
        name = "smtp_client_new",
        skip(config),
        fields(server = %config.server, port = config.port, use_tls = config.use_tls)
    )]
	pub fn new(config: &SmtpConfig) -> Result<Self> {
		let from: Mailbox = config
			.from
			.parse()
			.map_err(|e| NotifyError::Address(format!("{}: {e}", config.from)))?;

		let to = config
			.to
			.iter()
			.map(|addr| {
				addr
					.parse::<Mailbox>()
					.map_err(|e| NotifyError::Address(format!("{addr}: {e}")))
			})
			.collect::<Result<Vec<_>>>()?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
				.map_err(|e| NotifyError::Smtp(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
		};

		let mut builder = builder.port(config.port);

		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			let credentials = Credentials::new(username.clone(), password.clone().into_inner());
			builder = builder.credentials(credentials);
		}

		tracing::debug!("SMTP transport initialized");

		Ok(Self {
			transport: builder.build(),
			from,
			to,
		})
	}

	pub fn build_email(&self, message: &Message) -> Result<lettre::Message> {
		let mut builder = lettre::Message::builder()
			.from(self.from.clone())
			.subject(&message.subject)
			.header(ContentType::TEXT_PLAIN);
		for recipient in &self.to {
			builder = builder.to(recipient.clone());
		}
		builder
			.body(message.body.clone())
			.map_err(|e| NotifyError::Build(format!("{e}")))
	}
}

#[async_trait]
impl Notifier for EmailNotifier {
	fn channel(&self) -> &'static str {
		"email"
	}

	#[tracing::instrument(name = "smtp_send_email", skip(self, message), fields(subject = %message.subject))]
	async fn send(&self, message: &Message) -> Result<()> {
		let email = self.build_email(message)?;
		self
			.transport
			.send(email)
			.await
			.map_err(|e| NotifyError::Smtp(format!("{e}")))?;
		tracing::info!(recipients = self.to.len(), "email sent");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use resticara_common_secret::SecretString;

	fn config() -> SmtpConfig {
		SmtpConfig {
			server: "smtp.example.com".to_string(),
			port: 587,
			username: Some("backup".to_string()),
			password: Some(SecretString::from("hunter2")),
			from: "Resticara <backup@example.com>".to_string(),
			to: vec!["ops@example.com".to_string(), "dev@example.com".to_string()],
			use_tls: true,
		}
	}

	#[tokio::test]
	async fn builds_plain_text_email_for_every_recipient() {
		let notifier = EmailNotifier::new(&config()).unwrap();
		let email = notifier
			.build_email(&Message::new("Backup successful---Tue, 05 Mar 2024", "Host ID: nas-01"))
			.unwrap();

		let raw = String::from_utf8(email.formatted()).unwrap();
		assert!(raw.contains("Subject: Backup successful---Tue, 05 Mar 2024"));
		assert!(raw.contains("ops@example.com"));
		assert!(raw.contains("dev@example.com"));
		assert!(raw.contains("Content-Type: text/plain"));
		assert!(raw.contains("Host ID: nas-01"));
	}

	#[tokio::test]
	async fn invalid_recipient_is_rejected() {
		let mut config = config();
		config.to = vec!["not an address".to_string()];
		let err = EmailNotifier::new(&config).err().unwrap();
		assert!(matches!(err, NotifyError::Address(_)));
	}

	#[tokio::test]
	async fn plaintext_transport_without_credentials() {
		let config = SmtpConfig {
			username: None,
			password: None,
			use_tls: false,
			port: 25,
			..config()
		};
		assert!(EmailNotifier::new(&config).is_ok());
	}
}
