//! Shared-semaphore multi-process stress rig.
//!
//! Two binaries share this crate:
//! - `muon-stress`: the driver. Creates one named semaphore, spawns worker
//!   processes that contend on it, joins them all, and records one
//!   statistics line for the run.
//! - `muon-sem-worker`: the child side. Opens the semaphore by name and
//!   hammers it from `thread_count` threads.

pub mod config;
pub mod contend;
pub mod params;
pub mod stats;

/// Base name of the shared semaphore. Workers compose the same full name
/// from the same parameters the driver used.
pub const SHARED_SEMAPHORE_BASE: &str = "SHARED_SEMAPHORE";
