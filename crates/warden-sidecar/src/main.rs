// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! warden sidecar binary.

use clap::Parser;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_sidecar::{App, Settings};
use warden_wgconfig::WgKeyTool;

/// Supervises the wg-easy server process and reports its client
/// configuration to the control plane.
#[derive(Parser, Debug)]
#[command(name = "warden", about = "wg-easy supervision sidecar", version)]
struct Args {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let _args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	// missing settings abort here, before any subprocess starts
	let settings = Settings::from_env()?;
	info!(
		state_url = %settings.state_url,
		config_data_url = %settings.config_data_url,
		host = %settings.network.host,
		config_path = %settings.config_path.display(),
		"starting warden sidecar"
	);

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	tokio::spawn(async move {
		wait_for_signal().await;
		let _ = shutdown_tx.send(true);
	});

	let app = App::new(settings, Arc::new(WgKeyTool::new()));
	app.run(shutdown_rx).await
}

/// Resolves on SIGINT or SIGTERM.
async fn wait_for_signal() {
	let mut term = match signal(SignalKind::terminate()) {
		Ok(term) => term,
		Err(e) => {
			warn!(error = %e, "failed to install SIGTERM handler");
			let _ = tokio::signal::ctrl_c().await;
			info!("got interrupt signal");
			return;
		}
	};

	tokio::select! {
		_ = tokio::signal::ctrl_c() => info!("got interrupt signal"),
		_ = term.recv() => info!("got termination signal"),
	}
}
