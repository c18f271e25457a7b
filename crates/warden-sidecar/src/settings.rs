// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use warden_supervisor::ChildSpec;
use warden_wgconfig::NetworkSettings;

/// Fixed location of the shared wg-easy configuration document.
pub const CONFIG_PATH: &str = "/etc/wireguard/wg0.json";

/// Default WireGuard listen port, used for both the interface and the
/// server endpoint.
pub const LISTEN_PORT: u16 = 51820;

const DNS_RESOLVER: &str = "1.1.1.1";
const ALLOWED_IPS: &[&str] = &["0.0.0.0/0"];

const CHILD_PROGRAM: &str = "/usr/bin/dumb-init";
const CHILD_ARGS: &[&str] = &["node", "server.js"];

const FILE_WAIT_ATTEMPTS: u32 = 15;
const FILE_WAIT_INTERVAL: Duration = Duration::from_secs(1);
const RESTART_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("missing environment variable: {0}")]
	MissingEnv(&'static str),

	#[error("invalid {name}: {source}")]
	InvalidUrl {
		name: &'static str,
		source: url::ParseError,
	},
}

/// Immutable runtime settings, read from the environment once at startup
/// and passed to every component by reference.
#[derive(Debug, Clone)]
pub struct Settings {
	pub access_token: String,
	pub state_url: Url,
	/// Recognized and validated, but the push path never calls it.
	pub config_data_url: Url,
	pub config_path: PathBuf,
	pub child: ChildSpec,
	pub network: NetworkSettings,
	pub wait_attempts: u32,
	pub wait_interval: Duration,
	pub cycle_interval: Duration,
}

impl Settings {
	pub fn from_env() -> Result<Self, SettingsError> {
		let access_token = require_env("ACCESS_TOKEN")?;
		let state_url = require_url("POST_STATE_URL")?;
		let config_data_url = require_url("POST_CONFIG_DATA_URL")?;
		let host = require_env("WG_HOST")?;

		Ok(Self {
			access_token,
			state_url,
			config_data_url,
			config_path: PathBuf::from(CONFIG_PATH),
			child: ChildSpec::new(CHILD_PROGRAM)
				.args(CHILD_ARGS.iter().copied())
				.restart_cooldown(RESTART_COOLDOWN),
			network: NetworkSettings {
				host,
				listen_port: LISTEN_PORT,
				dns: DNS_RESOLVER.to_string(),
				allowed_ips: ALLOWED_IPS.iter().map(|s| s.to_string()).collect(),
			},
			wait_attempts: FILE_WAIT_ATTEMPTS,
			wait_interval: FILE_WAIT_INTERVAL,
			cycle_interval: warden_monitor::CYCLE_INTERVAL,
		})
	}
}

fn require_env(name: &'static str) -> Result<String, SettingsError> {
	match std::env::var(name) {
		Ok(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(SettingsError::MissingEnv(name)),
	}
}

/// The control plane is always addressed over HTTPS; the environment
/// carries its URLs without a scheme.
fn require_url(name: &'static str) -> Result<Url, SettingsError> {
	let raw = require_env(name)?;
	parse_control_url(name, &raw)
}

fn parse_control_url(name: &'static str, raw: &str) -> Result<Url, SettingsError> {
	Url::parse(&format!("https://{raw}")).map_err(|source| SettingsError::InvalidUrl { name, source })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn control_urls_get_the_https_scheme() {
		let url = parse_control_url("POST_STATE_URL", "control.example.com/api/state").unwrap();
		assert_eq!(url.scheme(), "https");
		assert_eq!(url.host_str(), Some("control.example.com"));
		assert_eq!(url.path(), "/api/state");
	}

	#[test]
	fn invalid_control_url_is_reported() {
		let err = parse_control_url("POST_STATE_URL", "exa mple.com").unwrap_err();
		assert!(matches!(
			err,
			SettingsError::InvalidUrl {
				name: "POST_STATE_URL",
				..
			}
		));
	}

	#[test]
	fn from_env_requires_the_access_token() {
		// settings tests are the only env mutation in this crate
		std::env::remove_var("ACCESS_TOKEN");
		std::env::remove_var("POST_STATE_URL");
		std::env::remove_var("POST_CONFIG_DATA_URL");
		std::env::remove_var("WG_HOST");

		let err = Settings::from_env().unwrap_err();
		assert!(matches!(err, SettingsError::MissingEnv("ACCESS_TOKEN")));
	}
}
