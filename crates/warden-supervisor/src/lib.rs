// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Child process supervision for warden.
//!
//! Exactly one supervision task owns the wrapped server process. Other
//! units reach it only through [`SupervisorHandle`]:
//!
//! - [`SupervisorHandle::request_restart`] is fire-and-forget; the
//!   supervisor kills the child, waits out a short cooldown and relaunches
//! - [`SupervisorHandle::terminate`] is a rendezvous; it resolves only
//!   after the child is confirmed gone, and the supervisor accepts no
//!   further requests afterwards
//!
//! A child that dies without either request being made is a fault. The
//! fault is delivered once through [`Supervisor::fault`]; the supervision
//! task then keeps answering the control channel so a terminate handshake
//! still completes before the program aborts.

mod error;
mod supervisor;

pub use error::{ChildFault, SupervisorError};
pub use supervisor::{ChildSpec, Supervisor, SupervisorHandle, SupervisorState, SupervisorStatus};
