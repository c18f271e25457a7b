// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::keys::KeyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("timed out waiting for {} after {attempts} checks", .path.display())]
	FileWaitTimeout { path: PathBuf, attempts: u32 },

	#[error("failed to access config file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("config field `{field}` is not a JSON object")]
	InvalidField { field: &'static str },

	#[error("no clients in config")]
	NoClients,

	#[error("no server public key in config")]
	NoServer,

	#[error("key generation failed: {0}")]
	Keys(#[from] KeyError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
