// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("control plane returned {status}: {body}")]
	UnexpectedStatus {
		status: reqwest::StatusCode,
		body: String,
	},

	#[error("config error: {0}")]
	Config(#[from] warden_wgconfig::ConfigError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
