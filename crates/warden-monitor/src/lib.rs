// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Control plane reporting for warden.
//!
//! [`MonitorClient`] pushes one state snapshot per call to the control
//! plane over authenticated HTTPS. [`MonitorCycle`] drives the periodic
//! loop: repair the client set, re-render the peer configuration, push.
//! A failed tick is logged and the next tick is the retry.

mod client;
mod cycle;
mod error;
mod state;

pub use client::MonitorClient;
pub use cycle::{MonitorCycle, CYCLE_INTERVAL};
pub use error::{MonitorError, Result};
pub use state::{MonitoringState, STATE_ACTIVE};
