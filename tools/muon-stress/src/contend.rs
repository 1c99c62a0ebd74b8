//! The contention loop run inside each worker process.
//!
//! With the semaphore created at initial count 1 and maximum count 1 it acts
//! as a cross-process mutex, so the cycles of every thread in every worker
//! serialize on it.

use std::fmt;

use muon_pal::{NamedSemaphore, SemError};

/// Failure of a worker contention run.
#[derive(Debug)]
pub enum ContendError {
    /// A semaphore operation failed.
    Sem(SemError),
    /// A contention thread panicked.
    ThreadPanicked,
}

impl fmt::Display for ContendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sem(e) => write!(f, "contention failed: {e}"),
            Self::ThreadPanicked => write!(f, "a contention thread panicked"),
        }
    }
}

impl std::error::Error for ContendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sem(e) => Some(e),
            Self::ThreadPanicked => None,
        }
    }
}

impl From<SemError> for ContendError {
    fn from(e: SemError) -> Self {
        Self::Sem(e)
    }
}

/// Drive `threads` OS threads through `repeats` acquire/release cycles each.
///
/// Returns the first error any thread hit; remaining threads still run to
/// completion before this returns.
pub fn contend(sem: &NamedSemaphore, threads: u32, repeats: u32) -> Result<(), ContendError> {
    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads as usize);
        for _ in 0..threads {
            handles.push(scope.spawn(move || -> Result<(), SemError> {
                for _ in 0..repeats {
                    sem.acquire()?;
                    sem.release()?;
                }
                Ok(())
            }));
        }

        let mut first_error = None;
        for handle in handles {
            let outcome = match handle.join() {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(ContendError::from(e)),
                Err(_) => Some(ContendError::ThreadPanicked),
            };
            if first_error.is_none() {
                first_error = outcome;
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    })
}
