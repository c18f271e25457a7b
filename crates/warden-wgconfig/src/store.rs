// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::document::{ClientRecord, ConfigDocument};
use crate::error::{ConfigError, Result};
use crate::keys::KeyGenerator;
use crate::render::{NetworkSettings, PeerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Reads and repairs the shared wg-easy configuration file.
///
/// Access to the file is unsynchronized. The server process and external
/// actors write the same file; a read-modify-write race can lose their
/// update between our read and write.
#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: PathBuf,
}

impl ConfigStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Polls until the config file exists.
	///
	/// Succeeds immediately when the file is already present. Performs at
	/// most `max_attempts` existence checks spaced `interval` apart and
	/// fails with [`ConfigError::FileWaitTimeout`] once all of them miss.
	#[instrument(skip(self), fields(path = %self.path.display()))]
	pub async fn wait_for_file(&self, max_attempts: u32, interval: Duration) -> Result<()> {
		for attempt in 1..=max_attempts {
			if tokio::fs::try_exists(&self.path).await? {
				debug!(attempt, "config file present");
				return Ok(());
			}
			if attempt < max_attempts {
				tokio::time::sleep(interval).await;
			}
		}

		Err(ConfigError::FileWaitTimeout {
			path: self.path.clone(),
			attempts: max_attempts,
		})
	}

	pub async fn load(&self) -> Result<ConfigDocument> {
		let contents = tokio::fs::read(&self.path).await?;
		ConfigDocument::parse(&contents)
	}

	async fn save(&self, doc: &ConfigDocument) -> Result<()> {
		tokio::fs::write(&self.path, doc.to_bytes()?).await?;
		Ok(())
	}

	/// Guarantees at least one client credential exists.
	///
	/// An empty or absent `clients` mapping gets a freshly generated
	/// default client, and the document is rewritten in place with every
	/// unrelated field preserved. Returns whether a client was created.
	#[instrument(skip_all, fields(path = %self.path.display()))]
	pub async fn ensure_default_client(&self, keys: &dyn KeyGenerator) -> Result<bool> {
		let mut doc = self.load().await?;
		if doc.has_clients()? {
			debug!("at least one client found");
			return Ok(false);
		}

		info!("no client in config, creating default client");
		let client = ClientRecord::generate_default(keys).await?;
		let client_id = client.id.clone();
		doc.insert_client(client)?;
		self.save(&doc).await?;
		info!(%client_id, "default client created");

		Ok(true)
	}

	/// Extracts the peer configuration for the first client in the
	/// document, combined with the given network settings.
	pub async fn resolve_peer_config(&self, network: &NetworkSettings) -> Result<PeerConfig> {
		let doc = self.load().await?;
		let client = doc.first_client()?;
		let server_public_key = doc.server_public_key()?;

		Ok(PeerConfig {
			client_private_key: client.private_key,
			client_address: client.address,
			listen_port: network.listen_port,
			dns: network.dns.clone(),
			server_public_key,
			preshared_key: client.pre_shared_key,
			allowed_ips: network.allowed_ips.clone(),
			endpoint: network.endpoint(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::{DEFAULT_CLIENT_ADDRESS, DEFAULT_CLIENT_NAME};
	use crate::keys::KeyError;
	use async_trait::async_trait;
	use serde_json::Value;

	struct StaticKeys;

	#[async_trait]
	impl KeyGenerator for StaticKeys {
		async fn generate_private_key(&self) -> std::result::Result<String, KeyError> {
			Ok("PRIV".to_string())
		}

		async fn derive_public_key(
			&self,
			_private_key: &str,
		) -> std::result::Result<String, KeyError> {
			Ok("PUB".to_string())
		}

		async fn generate_preshared_key(&self) -> std::result::Result<String, KeyError> {
			Ok("PSK".to_string())
		}
	}

	fn network() -> NetworkSettings {
		NetworkSettings {
			host: "vpn.example.com".to_string(),
			listen_port: 51820,
			dns: "1.1.1.1".to_string(),
			allowed_ips: vec!["0.0.0.0/0".to_string()],
		}
	}

	fn store_with(dir: &tempfile::TempDir, contents: &str) -> ConfigStore {
		let path = dir.path().join("wg0.json");
		std::fs::write(&path, contents).unwrap();
		ConfigStore::new(path)
	}

	#[tokio::test]
	async fn ensure_creates_default_client_when_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&dir, r#"{"clients":{},"server":{"publicKey":"SRV"}}"#);

		let created = store.ensure_default_client(&StaticKeys).await.unwrap();
		assert!(created);

		let doc = store.load().await.unwrap();
		let client = doc.first_client().unwrap();
		assert_eq!(client.name, DEFAULT_CLIENT_NAME);
		assert_eq!(client.address, DEFAULT_CLIENT_ADDRESS);
		assert!(client.enabled);
		assert_eq!(client.created_at, client.updated_at);

		// all three key tokens present and mutually distinct
		assert!(!client.private_key.is_empty());
		assert!(!client.public_key.is_empty());
		assert!(!client.pre_shared_key.is_empty());
		assert_ne!(client.private_key, client.public_key);
		assert_ne!(client.private_key, client.pre_shared_key);
		assert_ne!(client.public_key, client.pre_shared_key);

		// a second run sees the client and leaves the file alone
		let created = store.ensure_default_client(&StaticKeys).await.unwrap();
		assert!(!created);
	}

	#[tokio::test]
	async fn ensure_is_noop_on_populated_config() {
		let dir = tempfile::tempdir().unwrap();
		let contents = r#"{"clients":{"c1":{"id":"c1","name":"keep","address":"10.8.0.9","privateKey":"P","publicKey":"U","preSharedKey":"S","enabled":false}},"server":{"publicKey":"SRV"}}"#;
		let store = store_with(&dir, contents);

		let created = store.ensure_default_client(&StaticKeys).await.unwrap();
		assert!(!created);

		let after = std::fs::read_to_string(store.path()).unwrap();
		assert_eq!(after, contents);
	}

	#[tokio::test]
	async fn ensure_treats_absent_clients_mapping_as_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&dir, r#"{"server":{"publicKey":"SRV"}}"#);

		let created = store.ensure_default_client(&StaticKeys).await.unwrap();
		assert!(created);

		let after: Value =
			serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
		assert_eq!(after["clients"].as_object().unwrap().len(), 1);
		assert_eq!(after["server"]["publicKey"], "SRV");
	}

	#[tokio::test]
	async fn ensure_rejects_invalid_json() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&dir, "not json");

		let err = store.ensure_default_client(&StaticKeys).await.unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[tokio::test]
	async fn resolve_combines_client_server_and_network() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(
			&dir,
			r#"{"clients":{"c1":{"id":"c1","name":"default","address":"10.8.0.2","privateKey":"CLIENTPRIV","publicKey":"CLIENTPUB","preSharedKey":"PSK","enabled":true}},"server":{"publicKey":"SRVPUB"}}"#,
		);

		let peer = store.resolve_peer_config(&network()).await.unwrap();
		assert_eq!(peer.client_private_key, "CLIENTPRIV");
		assert_eq!(peer.client_address, "10.8.0.2");
		assert_eq!(peer.server_public_key, "SRVPUB");
		assert_eq!(peer.preshared_key, "PSK");
		assert_eq!(peer.endpoint, "vpn.example.com:51820");

		let rendered = peer.render();
		assert!(rendered.contains("PublicKey = SRVPUB"));
		assert!(rendered.contains("PrivateKey = CLIENTPRIV"));
	}

	#[tokio::test]
	async fn resolve_reports_missing_sections() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&dir, r#"{"clients":{},"server":{"publicKey":"SRV"}}"#);
		assert!(matches!(
			store.resolve_peer_config(&network()).await,
			Err(ConfigError::NoClients)
		));

		let store = store_with(
			&dir,
			r#"{"clients":{"c1":{"id":"c1","name":"d","address":"10.8.0.2","privateKey":"P","publicKey":"U","preSharedKey":"S","enabled":true}}}"#,
		);
		assert!(matches!(
			store.resolve_peer_config(&network()).await,
			Err(ConfigError::NoServer)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn wait_succeeds_immediately_when_file_exists() {
		let dir = tempfile::tempdir().unwrap();
		let store = store_with(&dir, "{}");

		let before = tokio::time::Instant::now();
		store
			.wait_for_file(15, Duration::from_secs(1))
			.await
			.unwrap();
		assert_eq!(tokio::time::Instant::now(), before);
	}

	#[tokio::test(start_paused = true)]
	async fn wait_times_out_after_exactly_max_attempts() {
		let dir = tempfile::tempdir().unwrap();
		let store = ConfigStore::new(dir.path().join("never.json"));

		let before = tokio::time::Instant::now();
		let err = store
			.wait_for_file(4, Duration::from_secs(1))
			.await
			.unwrap_err();
		match err {
			ConfigError::FileWaitTimeout { attempts, .. } => assert_eq!(attempts, 4),
			other => panic!("unexpected error: {other}"),
		}

		// four checks, three sleeps in between, no trailing sleep
		assert_eq!(tokio::time::Instant::now() - before, Duration::from_secs(3));
	}

	#[tokio::test]
	async fn wait_picks_up_file_created_midway() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("late.json");
		let store = ConfigStore::new(path.clone());

		let writer = tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(50)).await;
			std::fs::write(&path, "{}").unwrap();
		});

		store
			.wait_for_file(50, Duration::from_millis(10))
			.await
			.unwrap();
		writer.await.unwrap();
	}
}
