//! Child process spawn records and joint waiting.
//!
//! The rig's fan-out is a dynamically sized collection of [`WorkerChild`]
//! records, joined in one blocking pass by [`join_all`]. Process resources
//! are released when the records drop, once per child.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus};

/// Errors from spawning or collecting a child process.
#[derive(Debug)]
pub enum ProcError {
    /// Creating the child process failed.
    Spawn {
        /// Spawn-order index of the child.
        index: usize,
        /// Underlying platform error.
        source: io::Error,
    },
    /// Waiting for the child to terminate failed.
    Wait {
        /// Spawn-order index of the child.
        index: usize,
        /// Underlying platform error.
        source: io::Error,
    },
}

impl fmt::Display for ProcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { index, source } => {
                write!(f, "spawn failed for worker {index}: {source}")
            }
            Self::Wait { index, source } => {
                write!(f, "wait failed for worker {index}: {source}")
            }
        }
    }
}

impl std::error::Error for ProcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } | Self::Wait { source, .. } => Some(source),
        }
    }
}

/// One spawned worker process awaiting collection.
pub struct WorkerChild {
    /// Position of this child in the spawn order.
    pub index: usize,
    child: Child,
}

impl WorkerChild {
    /// Spawn a child process running `program` with `args`.
    ///
    /// Standard streams are inherited so worker diagnostics surface on the
    /// spawner's console.
    pub fn spawn(program: &Path, args: &[String], index: usize) -> Result<Self, ProcError> {
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|source| ProcError::Spawn { index, source })?;
        Ok(Self { index, child })
    }

    /// OS process id of the child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl fmt::Debug for WorkerChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerChild")
            .field("index", &self.index)
            .field("pid", &self.child.id())
            .finish()
    }
}

/// Outcome of waiting on one child.
#[derive(Debug)]
pub struct JoinReport {
    /// Spawn-order index of the child.
    pub index: usize,
    /// Exit status, or the error that prevented collecting it.
    pub result: Result<ExitStatus, ProcError>,
}

/// Block until every child has terminated and collect each exit status.
///
/// There is no timeout and no cancellation: a hung child hangs the caller.
/// A wait failure on one child is reported in its [`JoinReport`] and does
/// not cut the join short for the others.
pub fn join_all(children: Vec<WorkerChild>) -> Vec<JoinReport> {
    children
        .into_iter()
        .map(|mut worker| {
            let result = worker
                .child
                .wait()
                .map_err(|source| ProcError::Wait {
                    index: worker.index,
                    source,
                });
            JoinReport {
                index: worker.index,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str, index: usize) -> WorkerChild {
        WorkerChild::spawn(
            Path::new("/bin/sh"),
            &["-c".to_string(), script.to_string()],
            index,
        )
        .unwrap()
    }

    #[test]
    fn join_all_collects_every_status() {
        let children = vec![shell("exit 0", 0), shell("exit 0", 1), shell("exit 0", 2)];
        let reports = join_all(children);
        assert_eq!(reports.len(), 3);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.index, i);
            assert!(report.result.as_ref().unwrap().success());
        }
    }

    #[test]
    fn failure_exit_is_reported_not_fatal() {
        let children = vec![shell("exit 0", 0), shell("exit 3", 1), shell("exit 0", 2)];
        let reports = join_all(children);
        assert!(reports[0].result.as_ref().unwrap().success());
        assert_eq!(reports[1].result.as_ref().unwrap().code(), Some(3));
        assert!(reports[2].result.as_ref().unwrap().success());
    }

    #[test]
    fn spawn_failure_names_the_index() {
        let err = WorkerChild::spawn(Path::new("/nonexistent/muon-worker"), &[], 7).unwrap_err();
        match err {
            ProcError::Spawn { index, .. } => assert_eq!(index, 7),
            ProcError::Wait { .. } => panic!("expected a spawn error"),
        }
    }
}
