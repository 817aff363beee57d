// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Matrix client-server API: password login, join, `m.room.message`.

use async_trait::async_trait;
use reqwest::Client;
use resticara_common_secret::SecretString;
use resticara_config::MatrixConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::error::{NotifyError, Result};
use crate::http::{check_status, redact};
use crate::notifier::Notifier;
use crate::render::Message;

const SERVICE: &str = "matrix";

pub struct MatrixNotifier {
	http: Client,
	homeserver: Url,
	username: String,
	password: SecretString,
	room_id: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
	#[serde(rename = "type")]
	kind: &'static str,
	identifier: UserIdentifier<'a>,
	password: &'a str,
	initial_device_display_name: &'static str,
}

#[derive(Serialize)]
struct UserIdentifier<'a> {
	#[serde(rename = "type")]
	kind: &'static str,
	user: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
	access_token: String,
	#[serde(default)]
	user_id: Option<String>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
	msgtype: &'static str,
	body: &'a str,
}

impl MatrixNotifier {
	pub fn new(config: &MatrixConfig, http: Client) -> Result<Self> {
		let homeserver = Url::parse(&config.homeserver)
			.map_err(|e| NotifyError::InvalidUrl(format!("{}: {e}", config.homeserver)))?;
		if homeserver.cannot_be_a_base() {
			return Err(NotifyError::InvalidUrl(config.homeserver.clone()));
		}

		Ok(Self {
			http,
			homeserver,
			username: config.username.clone(),
			password: config.password.clone(),
			room_id: config.room_id.clone(),
		})
	}

	/// `{homeserver}/_matrix/client/v3/{segments...}` with each segment
	/// percent-encoded.
	fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.homeserver.clone();
		url
			.path_segments_mut()
			.map_err(|_| NotifyError::InvalidUrl(self.homeserver.to_string()))?
			.pop_if_empty()
			.extend(["_matrix", "client", "v3"])
			.extend(segments);
		Ok(url)
	}

	async fn login(&self) -> Result<SecretString> {
		let request = LoginRequest {
			kind: "m.login.password",
			identifier: UserIdentifier {
				kind: "m.id.user",
				user: &self.username,
			},
			password: self.password.expose(),
			initial_device_display_name: "resticara",
		};

		let response = self
			.http
			.post(self.endpoint(&["login"])?)
			.json(&request)
			.send()
			.await
			.map_err(redact)?;
		let response = check_status(SERVICE, response).await?;
		let login: LoginResponse = response.json().await.map_err(redact)?;

		debug!(user_id = ?login.user_id, "logged in to matrix");
		Ok(SecretString::new(login.access_token))
	}

	/// Joining a room the user is already in succeeds, so failures here are
	/// only logged; sending reports the real problem.
	async fn join(&self, token: &SecretString) {
		let result = async {
			let response = self
				.http
				.post(self.endpoint(&["rooms", &self.room_id, "join"])?)
				.bearer_auth(token.expose())
				.json(&serde_json::json!({}))
				.send()
				.await
				.map_err(redact)?;
			check_status(SERVICE, response).await.map(|_| ())
		}
		.await;

		if let Err(e) = result {
			debug!(room_id = %self.room_id, error = %e, "join failed, sending anyway");
		}
	}

	async fn send_text(&self, token: &SecretString, body: &str) -> Result<()> {
		let txn_id = Uuid::new_v4().to_string();
		let url = self.endpoint(&["rooms", &self.room_id, "send", "m.room.message", &txn_id])?;

		let response = self
			.http
			.put(url)
			.bearer_auth(token.expose())
			.json(&TextMessage {
				msgtype: "m.text",
				body,
			})
			.send()
			.await
			.map_err(redact)?;
		check_status(SERVICE, response).await?;
		Ok(())
	}

	/// Drops the device created by [`Self::login`].
	async fn logout(&self, token: &SecretString) {
		let result = match self.endpoint(&["logout"]) {
			Ok(url) => self
				.http
				.post(url)
				.bearer_auth(token.expose())
				.json(&serde_json::json!({}))
				.send()
				.await
				.map_err(redact),
			Err(e) => Err(e),
		};
		if let Err(e) = result {
			debug!(error = %e, "matrix logout failed");
		}
	}
}

#[async_trait]
impl Notifier for MatrixNotifier {
	fn channel(&self) -> &'static str {
		SERVICE
	}

	#[instrument(name = "matrix_send", skip(self, message), fields(room_id = %self.room_id))]
	async fn send(&self, message: &Message) -> Result<()> {
		let token = self.login().await?;
		self.join(&token).await;
		let sent = self.send_text(&token, &message.as_text()).await;
		self.logout(&token).await;
		sent?;
		debug!("matrix message sent");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::http::new_client;
	use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn notifier(server: &MockServer) -> MatrixNotifier {
		let config = MatrixConfig {
			homeserver: server.uri(),
			username: "backup-bot".to_string(),
			password: SecretString::from("pw"),
			room_id: "!abc:example.com".to_string(),
		};
		MatrixNotifier::new(&config, new_client().unwrap()).unwrap()
	}

	async fn mount_login(server: &MockServer) {
		Mock::given(method("POST"))
			.and(path("/_matrix/client/v3/login"))
			.and(body_partial_json(serde_json::json!({
				"type": "m.login.password",
				"identifier": {"type": "m.id.user", "user": "backup-bot"},
				"password": "pw",
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"access_token": "tok",
				"user_id": "@backup-bot:example.com",
			})))
			.expect(1)
			.mount(server)
			.await;
		Mock::given(method("POST"))
			.and(path("/_matrix/client/v3/logout"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
			.mount(server)
			.await;
	}

	/// Test: login, join and send happen in order with the issued token.
	#[tokio::test]
	async fn sends_text_event() {
		let server = MockServer::start().await;
		mount_login(&server).await;
		Mock::given(method("POST"))
			.and(path("/_matrix/client/v3/rooms/!abc:example.com/join"))
			.and(header("authorization", "Bearer tok"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"room_id": "!abc:example.com"})))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("PUT"))
			.and(path_regex(r"^/_matrix/client/v3/rooms/!abc:example.com/send/m.room.message/[0-9a-f-]+$"))
			.and(header("authorization", "Bearer tok"))
			.and(body_partial_json(serde_json::json!({
				"msgtype": "m.text",
				"body": "subject\n\nbody",
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"event_id": "$1"})))
			.expect(1)
			.mount(&server)
			.await;

		notifier(&server)
			.send(&Message::new("subject", "body"))
			.await
			.unwrap();
	}

	/// Test: a failed join is tolerated; the message is still sent.
	#[tokio::test]
	async fn join_failure_is_tolerated() {
		let server = MockServer::start().await;
		mount_login(&server).await;
		Mock::given(method("POST"))
			.and(path_regex(r"/join$"))
			.respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
			.mount(&server)
			.await;
		Mock::given(method("PUT"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"event_id": "$1"})))
			.expect(1)
			.mount(&server)
			.await;

		notifier(&server).send(&Message::new("s", "b")).await.unwrap();
	}

	#[tokio::test]
	async fn login_failure_is_an_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/_matrix/client/v3/login"))
			.respond_with(ResponseTemplate::new(403).set_body_string("M_FORBIDDEN"))
			.mount(&server)
			.await;

		let err = notifier(&server).send(&Message::new("s", "b")).await.unwrap_err();
		assert!(matches!(err, NotifyError::Api { status: 403, .. }));
	}

	#[test]
	fn invalid_homeserver_is_rejected() {
		let config = MatrixConfig {
			homeserver: "not a url".to_string(),
			username: "u".to_string(),
			password: SecretString::from("p"),
			room_id: "!r:x".to_string(),
		};
		let client = reqwest::Client::new();
		assert!(matches!(
			MatrixNotifier::new(&config, client),
			Err(NotifyError::InvalidUrl(_))
		));
	}
}
