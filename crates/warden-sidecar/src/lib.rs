// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Supervision sidecar for the wg-easy server process.
//!
//! The sidecar starts the server under supervision, waits for its
//! configuration file, guarantees a default client credential exists,
//! reports the rendered peer configuration to the control plane and keeps
//! doing so on a fixed period. On shutdown it says goodbye to the control
//! plane and blocks until the server process is confirmed gone; no exit
//! path leaves the child orphaned.

pub mod app;
pub mod settings;

pub use app::App;
pub use settings::{Settings, SettingsError};
