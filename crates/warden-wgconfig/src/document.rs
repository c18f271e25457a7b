// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Typed views over the wg-easy JSON configuration document.
//!
//! The document is kept as the raw top-level object (order-preserving) and
//! only the sections this sidecar consumes get typed models. Rewriting the
//! document therefore never drops or reorders fields it does not know about.

use crate::error::{ConfigError, Result};
use crate::keys::{KeyError, KeyGenerator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name given to the client this sidecar creates.
pub const DEFAULT_CLIENT_NAME: &str = "default";

/// Address given to the client this sidecar creates.
pub const DEFAULT_CLIENT_ADDRESS: &str = "10.8.0.2";

/// One client credential entry in the `clients` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
	pub id: String,
	pub name: String,
	pub address: String,
	pub private_key: String,
	pub public_key: String,
	pub pre_shared_key: String,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub expired_at: Option<DateTime<Utc>>,
	pub enabled: bool,
}

impl ClientRecord {
	/// Builds the default client with freshly generated key material.
	pub async fn generate_default(keys: &dyn KeyGenerator) -> std::result::Result<Self, KeyError> {
		let private_key = keys.generate_private_key().await?;
		let public_key = keys.derive_public_key(&private_key).await?;
		let pre_shared_key = keys.generate_preshared_key().await?;
		let now = Utc::now();

		Ok(Self {
			id: Uuid::new_v4().to_string(),
			name: DEFAULT_CLIENT_NAME.to_string(),
			address: DEFAULT_CLIENT_ADDRESS.to_string(),
			private_key,
			public_key,
			pre_shared_key,
			created_at: Some(now),
			updated_at: Some(now),
			expired_at: None,
			enabled: true,
		})
	}
}

/// Typed view of the `server` object. Fields beyond the public key are
/// opaque to the sidecar and survive in the raw document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
	#[serde(default)]
	pub public_key: Option<String>,
}

/// The whole on-disk document, held as its raw top-level object.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
	root: Map<String, Value>,
}

impl ConfigDocument {
	pub fn parse(contents: &[u8]) -> Result<Self> {
		let root = serde_json::from_slice(contents)?;
		Ok(Self { root })
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(&self.root)?)
	}

	fn clients_object(&self) -> Result<Option<&Map<String, Value>>> {
		match self.root.get("clients") {
			None => Ok(None),
			Some(Value::Object(clients)) => Ok(Some(clients)),
			Some(_) => Err(ConfigError::InvalidField { field: "clients" }),
		}
	}

	/// Whether the `clients` mapping holds at least one entry.
	pub fn has_clients(&self) -> Result<bool> {
		Ok(self.clients_object()?.is_some_and(|clients| !clients.is_empty()))
	}

	/// Inserts a client under its id, creating the `clients` mapping if the
	/// document lacks one.
	pub fn insert_client(&mut self, client: ClientRecord) -> Result<()> {
		let value = serde_json::to_value(&client)?;
		let clients = self
			.root
			.entry("clients")
			.or_insert_with(|| Value::Object(Map::new()));
		match clients {
			Value::Object(clients) => {
				clients.insert(client.id, value);
				Ok(())
			}
			_ => Err(ConfigError::InvalidField { field: "clients" }),
		}
	}

	/// The first client in document order. Selection is deterministic and
	/// follows the on-disk order of the `clients` mapping.
	pub fn first_client(&self) -> Result<ClientRecord> {
		let clients = self.clients_object()?.ok_or(ConfigError::NoClients)?;
		let (_, value) = clients.iter().next().ok_or(ConfigError::NoClients)?;
		serde_json::from_value(value.clone()).map_err(|_| ConfigError::NoClients)
	}

	/// The server's public key.
	pub fn server_public_key(&self) -> Result<String> {
		let value = self.root.get("server").ok_or(ConfigError::NoServer)?;
		let server: ServerRecord =
			serde_json::from_value(value.clone()).map_err(|_| ConfigError::NoServer)?;
		server.public_key.ok_or(ConfigError::NoServer)
	}
}
