// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
	/// The supervision task has stopped and takes no further requests.
	#[error("supervisor is stopped")]
	Stopped,
}

/// Why the supervised child is gone without having been asked to stop.
#[derive(Debug, Error)]
pub enum ChildFault {
	#[error("child process failed to start: {0}")]
	SpawnFailed(#[source] std::io::Error),

	#[error("child process exited unexpectedly with {0}")]
	UnexpectedExit(std::process::ExitStatus),

	#[error("failed waiting on child process: {0}")]
	WaitFailed(#[source] std::io::Error),
}
