// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::error::{ChildFault, SupervisorError};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

// one slot: at most one restart-or-terminate request is ever in flight
const REQUEST_QUEUE_DEPTH: usize = 1;

/// Command line and restart policy for the supervised child.
#[derive(Debug, Clone)]
pub struct ChildSpec {
	pub program: PathBuf,
	pub args: Vec<String>,
	pub restart_cooldown: Duration,
}

impl ChildSpec {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			restart_cooldown: Duration::from_secs(1),
		}
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn restart_cooldown(mut self, cooldown: Duration) -> Self {
		self.restart_cooldown = cooldown;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
	Running,
	Restarting,
	Terminating,
	Stopped,
}

/// Snapshot published through the status watch channel.
///
/// `pid` is `None` while a launch is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorStatus {
	pub state: SupervisorState,
	pub pid: Option<u32>,
}

enum Request {
	Restart,
	Terminate(oneshot::Sender<()>),
}

enum CooldownOutcome {
	Relaunch,
	Terminate(oneshot::Sender<()>),
	Closed,
}

/// Signaling interface to the supervision task.
#[derive(Clone)]
pub struct SupervisorHandle {
	tx: mpsc::Sender<Request>,
}

impl SupervisorHandle {
	/// Asks the supervisor to restart the child.
	///
	/// Fire-and-forget: the caller does not wait for the relaunch. A
	/// request arriving while one is already pending is dropped, and a
	/// stopped supervisor ignores restarts entirely.
	pub fn request_restart(&self) {
		match self.tx.try_send(Request::Restart) {
			Ok(()) => {}
			Err(mpsc::error::TrySendError::Full(_)) => {
				debug!("restart already pending, request dropped");
			}
			Err(mpsc::error::TrySendError::Closed(_)) => {
				debug!("supervisor stopped, restart request ignored");
			}
		}
	}

	/// Asks the supervisor to terminate the child and resolves only after
	/// the process is confirmed gone. Terminate is final: the supervisor
	/// accepts no requests afterwards.
	pub async fn terminate(&self) -> Result<(), SupervisorError> {
		let (ack_tx, ack_rx) = oneshot::channel();
		self.tx
			.send(Request::Terminate(ack_tx))
			.await
			.map_err(|_| SupervisorError::Stopped)?;
		ack_rx.await.map_err(|_| SupervisorError::Stopped)
	}
}

/// Owns the supervision task for one child process.
pub struct Supervisor {
	handle: SupervisorHandle,
	fault_rx: oneshot::Receiver<ChildFault>,
	status_rx: watch::Receiver<SupervisorStatus>,
}

impl Supervisor {
	/// Starts the supervision task, which launches the child immediately.
	pub fn spawn(spec: ChildSpec) -> Self {
		let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
		let (fault_tx, fault_rx) = oneshot::channel();
		let (status_tx, status_rx) = watch::channel(SupervisorStatus {
			state: SupervisorState::Running,
			pid: None,
		});

		tokio::spawn(run(spec, request_rx, fault_tx, status_tx));

		Self {
			handle: SupervisorHandle { tx: request_tx },
			fault_rx,
			status_rx,
		}
	}

	pub fn handle(&self) -> SupervisorHandle {
		self.handle.clone()
	}

	pub fn status(&self) -> watch::Receiver<SupervisorStatus> {
		self.status_rx.clone()
	}

	/// Resolves once if the child is lost without a restart or terminate
	/// request. Pends forever after a clean stop, which makes it safe to
	/// hold in a `select!` alongside the shutdown path.
	pub async fn fault(&mut self) -> ChildFault {
		match (&mut self.fault_rx).await {
			Ok(fault) => fault,
			Err(_) => std::future::pending().await,
		}
	}
}

async fn run(
	spec: ChildSpec,
	mut requests: mpsc::Receiver<Request>,
	fault_tx: oneshot::Sender<ChildFault>,
	status_tx: watch::Sender<SupervisorStatus>,
) {
	let mut fault_tx = Some(fault_tx);

	loop {
		let mut child = match spawn_child(&spec) {
			Ok(child) => child,
			Err(e) => {
				error!(program = %spec.program.display(), error = %e, "failed to start child process");
				if let Some(tx) = fault_tx.take() {
					let _ = tx.send(ChildFault::SpawnFailed(e));
				}
				set_status(&status_tx, SupervisorState::Stopped, None);
				park_until_terminate(&mut requests).await;
				return;
			}
		};
		set_status(&status_tx, SupervisorState::Running, child.id());
		info!(pid = child.id(), "child process started");

		let request = tokio::select! {
			biased;

			request = requests.recv() => request,

			status = child.wait() => {
				match status {
					Ok(status) => {
						error!(%status, "child process exited unexpectedly");
						if let Some(tx) = fault_tx.take() {
							let _ = tx.send(ChildFault::UnexpectedExit(status));
						}
					}
					Err(e) => {
						error!(error = %e, "failed waiting on child process");
						if let Some(tx) = fault_tx.take() {
							let _ = tx.send(ChildFault::WaitFailed(e));
						}
					}
				}
				set_status(&status_tx, SupervisorState::Stopped, None);
				park_until_terminate(&mut requests).await;
				return;
			}
		};

		match request {
			Some(Request::Terminate(ack)) => {
				info!("terminate requested");
				set_status(&status_tx, SupervisorState::Terminating, child.id());
				kill_and_reap(&mut child).await;
				set_status(&status_tx, SupervisorState::Stopped, None);
				let _ = ack.send(());
				return;
			}
			Some(Request::Restart) => {
				info!("restart requested");
				set_status(&status_tx, SupervisorState::Restarting, child.id());
				kill_and_reap(&mut child).await;
				match cooldown(&mut requests, spec.restart_cooldown).await {
					CooldownOutcome::Relaunch => {}
					CooldownOutcome::Terminate(ack) => {
						// the child is already gone; just acknowledge
						info!("terminate requested during restart cooldown");
						set_status(&status_tx, SupervisorState::Stopped, None);
						let _ = ack.send(());
						return;
					}
					CooldownOutcome::Closed => {
						set_status(&status_tx, SupervisorState::Stopped, None);
						return;
					}
				}
			}
			None => {
				// every handle dropped; do not leave the child behind
				warn!("all supervisor handles dropped, stopping child");
				kill_and_reap(&mut child).await;
				set_status(&status_tx, SupervisorState::Stopped, None);
				return;
			}
		}
	}
}

fn spawn_child(spec: &ChildSpec) -> std::io::Result<Child> {
	// stdout/stderr inherited so the child's own logs pass through
	Command::new(&spec.program)
		.args(&spec.args)
		.stdin(Stdio::null())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit())
		.kill_on_drop(true)
		.spawn()
}

async fn kill_and_reap(child: &mut Child) {
	if let Err(e) = child.start_kill() {
		warn!(error = %e, "failed to kill child process");
	}
	match child.wait().await {
		Ok(status) => debug!(%status, "child process reaped"),
		Err(e) => warn!(error = %e, "failed to reap child process"),
	}
}

/// Sleeps out the restart cooldown. A terminate arriving during the
/// cooldown wins and skips the relaunch; further restarts collapse into
/// the one already in progress.
async fn cooldown(requests: &mut mpsc::Receiver<Request>, duration: Duration) -> CooldownOutcome {
	let sleep = tokio::time::sleep(duration);
	tokio::pin!(sleep);

	loop {
		tokio::select! {
			biased;

			request = requests.recv() => match request {
				Some(Request::Terminate(ack)) => return CooldownOutcome::Terminate(ack),
				Some(Request::Restart) => debug!("restart already in progress"),
				None => return CooldownOutcome::Closed,
			},

			_ = &mut sleep => return CooldownOutcome::Relaunch,
		}
	}
}

/// After a fault the child is already gone. Keep answering the control
/// channel so a terminate handshake still completes; restarts are ignored.
async fn park_until_terminate(requests: &mut mpsc::Receiver<Request>) {
	while let Some(request) = requests.recv().await {
		match request {
			Request::Terminate(ack) => {
				let _ = ack.send(());
				return;
			}
			Request::Restart => debug!("ignoring restart after child fault"),
		}
	}
}

fn set_status(status_tx: &watch::Sender<SupervisorStatus>, state: SupervisorState, pid: Option<u32>) {
	let _ = status_tx.send(SupervisorStatus { state, pid });
}
