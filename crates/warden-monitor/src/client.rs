// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::error::MonitorError;
use crate::state::MonitoringState;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

/// Pushes state snapshots to the control plane.
pub struct MonitorClient {
	http: Client,
	state_url: Url,
	token: String,
}

#[derive(Debug, Serialize)]
struct ReportBody {
	state: StateEnvelope,
}

#[derive(Debug, Serialize)]
struct StateEnvelope {
	state: i64,
	meta: Meta,
}

#[derive(Debug, Serialize)]
struct Meta {
	monitored: i64,
	wireguard_config: String,
}

impl From<&MonitoringState> for ReportBody {
	fn from(state: &MonitoringState) -> Self {
		Self {
			state: StateEnvelope {
				state: state.state,
				meta: Meta {
					monitored: state.monitored,
					wireguard_config: state.wireguard_config.clone(),
				},
			},
		}
	}
}

impl MonitorClient {
	pub fn new(state_url: Url, token: impl Into<String>) -> Self {
		Self {
			http: warden_common_http::new_client(),
			state_url,
			token: token.into(),
		}
	}

	/// Pushes one snapshot. Success strictly requires HTTP 200; every
	/// other status is an error, other 2xx codes included.
	#[instrument(skip_all, fields(url = %self.state_url))]
	pub async fn push(&self, state: &MonitoringState) -> Result<(), MonitorError> {
		let response = self
			.http
			.post(self.state_url.clone())
			.header(header::AUTHORIZATION, format!("Bearer {}", self.token))
			.json(&ReportBody::from(state))
			.send()
			.await?;

		let status = response.status();
		if status != StatusCode::OK {
			let body = response.text().await.unwrap_or_default();
			return Err(MonitorError::UnexpectedStatus { status, body });
		}

		debug!(monitored = state.monitored, "state pushed");
		Ok(())
	}
}

impl std::fmt::Debug for MonitorClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MonitorClient")
			.field("state_url", &self.state_url.as_str())
			.field("has_token", &!self.token.is_empty())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client_for(server: &MockServer) -> MonitorClient {
		let url: Url = format!("{}/api/state", server.uri()).parse().unwrap();
		MonitorClient::new(url, "secret-token")
	}

	#[tokio::test]
	async fn push_sends_the_expected_envelope() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/api/state"))
			.and(header("Authorization", "Bearer secret-token"))
			.and(header("Content-Type", "application/json"))
			.and(body_json(serde_json::json!({
				"state": {
					"state": 3,
					"meta": {
						"monitored": 1700000000,
						"wireguard_config": "[Interface]\n"
					}
				}
			})))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let state = MonitoringState::active(1700000000, "[Interface]\n".to_string());
		client_for(&server).push(&state).await.unwrap();
	}

	#[tokio::test]
	async fn push_rejects_server_errors() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_string("boom"))
			.mount(&server)
			.await;

		let err = client_for(&server)
			.push(&MonitoringState::active(1, String::new()))
			.await
			.unwrap_err();
		match err {
			MonitorError::UnexpectedStatus { status, body } => {
				assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
				assert_eq!(body, "boom");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn push_rejects_other_2xx_codes() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(204))
			.mount(&server)
			.await;

		let err = client_for(&server)
			.push(&MonitoringState::active(1, String::new()))
			.await
			.unwrap_err();
		match err {
			MonitorError::UnexpectedStatus { status, .. } => {
				assert_eq!(status, StatusCode::NO_CONTENT);
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn debug_does_not_leak_the_token() {
		let server = MockServer::start().await;
		let debug = format!("{:?}", client_for(&server));
		assert!(debug.contains("has_token"));
		assert!(!debug.contains("secret-token"));
	}
}
