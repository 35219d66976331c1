//! # Summary
//!
//! This module contains the units of execution run on behalf of each
//! process. Every process runs one `process` loop for its whole life; on
//! each interval that loop either broadcasts a `heartbeat` (coordinator) or
//! runs the failure `detector` (everyone else), which may launch an
//! `election` on a thread of its own.

/// Failure detection.
pub(crate) mod detector;

/// Token-circulation election.
pub mod election;

/// Coordinator data broadcast.
pub(crate) mod heartbeat;

/// Per-process loop.
pub(crate) mod process;
