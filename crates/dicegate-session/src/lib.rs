// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Endpoint rosters and process orchestration for Dicegate.
//!
//! A [`Session`] owns an arena of endpoints and their adapters. The
//! [`Orchestrator`] starts every enabled endpoint, waits for a shutdown
//! signal, and runs cleanup under a bounded-time watchdog:
//! - save every session, then close every store, then close every adapter
//! - if cleanup is still running after the grace period, run it once more
//!   and report [`ShutdownOutcome::Forced`]

pub mod orchestrator;
pub mod session;
pub mod shutdown;

pub use orchestrator::Orchestrator;
pub use session::Session;
pub use shutdown::{ShutdownOutcome, ShutdownTimings, install_signal_handler, supervise_cleanup};
