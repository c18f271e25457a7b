// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Key material generation via the `wg` command line tool.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KeyError {
	#[error("failed to run `{command}`: {source}")]
	Spawn {
		command: String,
		source: std::io::Error,
	},

	#[error("failed to pipe key material to `{command}`: {source}")]
	Pipe {
		command: String,
		source: std::io::Error,
	},

	#[error("`{command}` exited with {status}: {stderr}")]
	CommandFailed {
		command: String,
		status: std::process::ExitStatus,
		stderr: String,
	},

	#[error("`{command}` produced no output")]
	EmptyOutput { command: String },
}

/// Produces private, public and pre-shared key tokens.
#[async_trait]
pub trait KeyGenerator: Send + Sync {
	async fn generate_private_key(&self) -> Result<String, KeyError>;

	/// Derives the public key for a private key token.
	async fn derive_public_key(&self, private_key: &str) -> Result<String, KeyError>;

	async fn generate_preshared_key(&self) -> Result<String, KeyError>;
}

/// Key generator backed by the `wg` tool (`genkey`, `pubkey`, `genpsk`).
#[derive(Debug, Clone)]
pub struct WgKeyTool {
	program: PathBuf,
}

impl WgKeyTool {
	pub fn new() -> Self {
		Self::with_program("wg")
	}

	pub fn with_program(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
		}
	}

	/// Runs one `wg` subcommand, optionally feeding data on stdin, and
	/// returns its stdout with trailing newlines trimmed.
	async fn run(&self, subcommand: &str, stdin_data: Option<&str>) -> Result<String, KeyError> {
		let command = format!("{} {}", self.program.display(), subcommand);

		let mut cmd = Command::new(&self.program);
		cmd.arg(subcommand)
			.stdin(if stdin_data.is_some() {
				Stdio::piped()
			} else {
				Stdio::null()
			})
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		let mut child = cmd.spawn().map_err(|source| KeyError::Spawn {
			command: command.clone(),
			source,
		})?;

		if let Some(data) = stdin_data {
			let mut stdin = child.stdin.take().expect("child stdin was piped");
			stdin
				.write_all(data.as_bytes())
				.await
				.map_err(|source| KeyError::Pipe {
					command: command.clone(),
					source,
				})?;
			// closing stdin lets the tool see EOF
			drop(stdin);
		}

		let output = child
			.wait_with_output()
			.await
			.map_err(|source| KeyError::Spawn {
				command: command.clone(),
				source,
			})?;

		if !output.status.success() {
			return Err(KeyError::CommandFailed {
				command,
				status: output.status,
				stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
			});
		}

		let token = String::from_utf8_lossy(&output.stdout)
			.trim_end()
			.to_string();
		if token.is_empty() {
			return Err(KeyError::EmptyOutput { command });
		}

		debug!(%command, "key command completed");
		Ok(token)
	}
}

impl Default for WgKeyTool {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl KeyGenerator for WgKeyTool {
	async fn generate_private_key(&self) -> Result<String, KeyError> {
		self.run("genkey", None).await
	}

	async fn derive_public_key(&self, private_key: &str) -> Result<String, KeyError> {
		self.run("pubkey", Some(private_key)).await
	}

	async fn generate_preshared_key(&self) -> Result<String, KeyError> {
		self.run("genpsk", None).await
	}
}
