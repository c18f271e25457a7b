// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared wg-easy configuration handling for warden.
//!
//! The server process owns `/etc/wireguard/wg0.json`; this crate reads it,
//! repairs an empty client set, and extracts the data needed to render a
//! WireGuard peer configuration.
//!
//! # Overview
//!
//! - [`ConfigStore`]: waits for the file, guarantees a default client
//!   exists, and resolves the current client/server pair
//! - [`ConfigDocument`]: typed views over the raw JSON document; every
//!   field this crate does not understand round-trips unmodified and in
//!   its original position
//! - [`KeyGenerator`] / [`WgKeyTool`]: key material generation via the
//!   `wg` command line tool
//! - [`PeerConfig`]: pure rendering of the canonical peer configuration
//!
//! The store performs no locking against concurrent external writers of
//! the same file; a read-modify-write race can lose an update made by
//! another process between our read and write.

pub mod document;
pub mod error;
pub mod keys;
pub mod render;
pub mod store;

pub use document::{ClientRecord, ConfigDocument, ServerRecord, DEFAULT_CLIENT_ADDRESS, DEFAULT_CLIENT_NAME};
pub use error::{ConfigError, Result};
pub use keys::{KeyError, KeyGenerator, WgKeyTool};
pub use render::{NetworkSettings, PeerConfig};
pub use store::ConfigStore;
