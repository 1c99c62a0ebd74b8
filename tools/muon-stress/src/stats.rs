//! Statistics lines and report files.
//!
//! Each run records exactly one comma-separated line. The driver writes
//! `main_semaphore_<relationId>_.txt`; each worker writes
//! `semaphore_<relationId>_<workerIndex>_.txt`. Files are created fresh
//! (truncate-or-create) and closed explicitly so close-time failures
//! surface to the caller instead of vanishing in a drop.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Statistics recorded by the driver for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Wall-clock milliseconds from run start to all children reaped.
    pub elapsed_millis: u64,
    /// Grouping id for the run.
    pub relation_id: u32,
    /// Worker processes spawned.
    pub process_count: u32,
    /// Threads per worker.
    pub thread_count: u32,
    /// Acquire/release cycles per thread.
    pub repeat_count: u32,
    /// Informational build label.
    pub build_label: String,
}

impl RunStats {
    /// Format the single CSV line the report file carries.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.elapsed_millis,
            self.relation_id,
            self.process_count,
            self.thread_count,
            self.repeat_count,
            self.build_label
        )
    }
}

/// Statistics recorded by one worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    /// Wall-clock milliseconds the worker spent contending.
    pub elapsed_millis: u64,
    /// Grouping id for the run.
    pub relation_id: u32,
    /// Spawn-order index of this worker.
    pub worker_index: u32,
    /// Threads this worker ran.
    pub thread_count: u32,
    /// Acquire/release cycles per thread.
    pub repeat_count: u32,
    /// Informational build label.
    pub build_label: String,
}

impl WorkerStats {
    /// Format the single CSV line the worker report file carries.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.elapsed_millis,
            self.relation_id,
            self.worker_index,
            self.thread_count,
            self.repeat_count,
            self.build_label
        )
    }
}

/// A statistics report file, created fresh for each run.
#[derive(Debug)]
pub struct ReportFile {
    path: PathBuf,
    file: File,
}

impl ReportFile {
    /// Driver report path for a relation id.
    pub fn driver_path(dir: &Path, relation_id: u32) -> PathBuf {
        dir.join(format!("main_semaphore_{relation_id}_.txt"))
    }

    /// Worker report path for a relation id and worker index.
    pub fn worker_path(dir: &Path, relation_id: u32, worker_index: u32) -> PathBuf {
        dir.join(format!("semaphore_{relation_id}_{worker_index}_.txt"))
    }

    /// Create (or truncate) the report file at `path`, creating missing
    /// parent directories first.
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&path)?;
        Ok(Self { path, file })
    }

    /// Append one line to the report.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{line}")
    }

    /// Flush to stable storage and close. Consuming `self` keeps the close
    /// single-shot.
    pub fn close(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }

    /// Path this report is written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
