// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::settings::Settings;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use warden_monitor::{MonitorClient, MonitorCycle, MonitoringState};
use warden_supervisor::{Supervisor, SupervisorHandle};
use warden_wgconfig::{ConfigStore, KeyGenerator};

/// The orchestrator: sequences startup, owns the monitoring cycle task and
/// funnels every exit path through one shutdown coordinator.
pub struct App {
	settings: Settings,
	keys: Arc<dyn KeyGenerator>,
}

impl App {
	pub fn new(settings: Settings, keys: Arc<dyn KeyGenerator>) -> Self {
		Self { settings, keys }
	}

	/// Runs the sidecar until the shutdown watch fires or a fatal fault
	/// occurs. On every exit path the child process is confirmed gone
	/// before this returns.
	pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
		let store = ConfigStore::new(&self.settings.config_path);
		let monitor = MonitorClient::new(
			self.settings.state_url.clone(),
			self.settings.access_token.clone(),
		);
		let mut supervisor = Supervisor::spawn(self.settings.child.clone());
		let handle = supervisor.handle();

		let mut cycle_task: Option<JoinHandle<()>> = None;
		let outcome = tokio::select! {
			result = self.startup_then_wait(&store, &monitor, &handle, &mut cycle_task, shutdown) => result,
			fault = supervisor.fault() => Err(anyhow::Error::new(fault)),
		};

		// the shutdown coordinator: reached by the signal path, startup
		// errors and child faults alike
		if let Some(task) = &cycle_task {
			task.abort();
		}

		match outcome {
			Ok(()) => {
				let rendered = match store.resolve_peer_config(&self.settings.network).await {
					Ok(peer) => peer.render(),
					Err(e) => {
						warn!(error = %e, "failed to render config for terminal report");
						String::new()
					}
				};
				if let Err(e) = monitor.push(&MonitoringState::terminal(rendered)).await {
					warn!(error = %e, "failed to push terminal report");
				}

				info!("terminating server process");
				handle
					.terminate()
					.await
					.context("terminate handshake failed")?;
				info!("shutdown complete");
				Ok(())
			}
			Err(e) => {
				error!(error = %e, "fatal error, terminating server process");
				if let Err(term) = handle.terminate().await {
					warn!(error = %term, "terminate handshake failed during abort");
				}
				Err(e)
			}
		}
	}

	async fn startup_then_wait(
		&self,
		store: &ConfigStore,
		monitor: &MonitorClient,
		supervisor: &SupervisorHandle,
		cycle_task: &mut Option<JoinHandle<()>>,
		mut shutdown: watch::Receiver<bool>,
	) -> anyhow::Result<()> {
		// the server process writes the config file on first start; a
		// freshly created client needs a server restart, after which the
		// file is checked again
		loop {
			store
				.wait_for_file(self.settings.wait_attempts, self.settings.wait_interval)
				.await
				.context("waiting for config file")?;

			let created = store
				.ensure_default_client(self.keys.as_ref())
				.await
				.context("ensuring default client")?;
			if !created {
				break;
			}

			info!("created default client, restarting server process");
			supervisor.request_restart();
		}

		let peer = store
			.resolve_peer_config(&self.settings.network)
			.await
			.context("resolving client config")?;
		monitor
			.push(&MonitoringState::active(Utc::now().timestamp(), peer.render()))
			.await
			.context("initial state report")?;
		info!("initial state reported");

		let cycle = MonitorCycle::new(
			store.clone(),
			Arc::clone(&self.keys),
			self.settings.network.clone(),
			MonitorClient::new(
				self.settings.state_url.clone(),
				self.settings.access_token.clone(),
			),
			supervisor.clone(),
		)
		.with_interval(self.settings.cycle_interval);
		*cycle_task = Some(tokio::spawn(cycle.run()));

		// block until asked to stop
		while !*shutdown.borrow() {
			if shutdown.changed().await.is_err() {
				break;
			}
		}
		info!("shutdown signal received");

		Ok(())
	}
}
