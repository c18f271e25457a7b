// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::client::MonitorClient;
use crate::error::Result;
use crate::state::MonitoringState;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use warden_supervisor::SupervisorHandle;
use warden_wgconfig::{ConfigStore, KeyGenerator, NetworkSettings};

/// Fixed period of the monitoring loop.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(157);

/// The periodic monitoring loop.
///
/// Each tick repairs the client set (signaling a server restart when a
/// client had to be created), re-renders the peer configuration and pushes
/// an active snapshot stamped with the current time.
pub struct MonitorCycle {
	store: ConfigStore,
	keys: Arc<dyn KeyGenerator>,
	network: NetworkSettings,
	client: MonitorClient,
	supervisor: SupervisorHandle,
	interval: Duration,
}

impl MonitorCycle {
	pub fn new(
		store: ConfigStore,
		keys: Arc<dyn KeyGenerator>,
		network: NetworkSettings,
		client: MonitorClient,
		supervisor: SupervisorHandle,
	) -> Self {
		Self {
			store,
			keys,
			network,
			client,
			supervisor,
			interval: CYCLE_INTERVAL,
		}
	}

	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;
		self
	}

	/// Runs forever. The first tick fires immediately; a failed tick is
	/// logged and the next one is the implicit retry.
	pub async fn run(self) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		loop {
			ticker.tick().await;
			if let Err(e) = self.tick().await {
				warn!(error = %e, "monitoring tick failed");
			}
		}
	}

	/// One monitoring pass.
	pub async fn tick(&self) -> Result<()> {
		let created = self.store.ensure_default_client(self.keys.as_ref()).await?;
		if created {
			info!("client created during monitoring, restarting server process");
			self.supervisor.request_restart();
		}

		let peer = self.store.resolve_peer_config(&self.network).await?;
		let state = MonitoringState::active(Utc::now().timestamp(), peer.render());
		self.client.push(&state).await
	}
}
