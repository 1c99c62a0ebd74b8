//! Platform primitives for the muon stress rig.
//!
//! Wraps the small surface the stress tools consume:
//! - [`NamedSemaphore`]: a named counting semaphore visible across process
//!   boundaries by name lookup
//! - [`WorkerChild`] / [`join_all`]: child process spawn records and a
//!   blocking join over all of them
//! - [`Stopwatch`]: monotonic elapsed-millis measurement

pub mod clock;
pub mod proc;
pub mod sem;

pub use clock::Stopwatch;
pub use proc::{JoinReport, ProcError, WorkerChild, join_all};
pub use sem::{NamedSemaphore, SEM_NAME_MAX, SemError, compose_name};

/// Upper bound on the number of processes (or threads) a single joint wait
/// may cover. Callers validate their fan-out against this before spawning.
pub const MAX_WAIT_OBJECTS: usize = 64;
