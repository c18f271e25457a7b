// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pure rendering of the canonical WireGuard peer configuration.

/// Server-side parameters that do not come from the config document.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
	pub host: String,
	pub listen_port: u16,
	pub dns: String,
	pub allowed_ips: Vec<String>,
}

impl NetworkSettings {
	pub fn endpoint(&self) -> String {
		format!("{}:{}", self.host, self.listen_port)
	}
}

/// Everything needed to render one client's peer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
	pub client_private_key: String,
	pub client_address: String,
	pub listen_port: u16,
	pub dns: String,
	pub server_public_key: String,
	pub preshared_key: String,
	pub allowed_ips: Vec<String>,
	pub endpoint: String,
}

impl PeerConfig {
	/// Renders the two-section peer configuration text.
	///
	/// Pure and deterministic: identical inputs always produce
	/// byte-identical output.
	pub fn render(&self) -> String {
		format!(
			"[Interface]
PrivateKey = {private_key}
Address = {address}
ListenPort = {listen_port}
DNS = {dns}

[Peer]
PublicKey = {public_key}
PresharedKey = {preshared_key}
AllowedIPs = {allowed_ips}
Endpoint = {endpoint}
",
			private_key = self.client_private_key,
			address = self.client_address,
			listen_port = self.listen_port,
			dns = self.dns,
			public_key = self.server_public_key,
			preshared_key = self.preshared_key,
			allowed_ips = self.allowed_ips.join(","),
			endpoint = self.endpoint,
		)
	}
}
