//! Child worker for the shared-semaphore stress rig.
//!
//! Opens the semaphore the driver created under the composed name, contends
//! on it from `thread_count` threads, records its own statistics line, and
//! exits nonzero on any failure so the driver marks the run failed.

use anyhow::{Context, Result};
use clap::Parser;

use muon_pal::{NamedSemaphore, Stopwatch, compose_name};
use muon_stress::SHARED_SEMAPHORE_BASE;
use muon_stress::config::Config;
use muon_stress::contend::contend;
use muon_stress::params::WorkerParams;
use muon_stress::stats::{ReportFile, WorkerStats};

fn main() -> Result<()> {
    let params = WorkerParams::parse();
    let config = Config::load();
    let watch = Stopwatch::start();

    let sem_name = compose_name(SHARED_SEMAPHORE_BASE, params.name_suffix.as_deref());
    let semaphore = NamedSemaphore::open(&sem_name)
        .with_context(|| format!("opening shared semaphore {sem_name}"))?;

    // A contention failure is still followed by the statistics write and the
    // close, then reported through the exit status.
    let contention = contend(&semaphore, params.thread_count, params.repeat_count);

    let stats = WorkerStats {
        elapsed_millis: watch.elapsed_millis(),
        relation_id: params.relation_id,
        worker_index: params.worker_index,
        thread_count: params.thread_count,
        repeat_count: params.repeat_count,
        build_label: config.build_label.clone(),
    };
    let path = ReportFile::worker_path(&config.report_dir, params.relation_id, params.worker_index);
    let mut report = ReportFile::create(path.clone())
        .with_context(|| format!("opening worker report file {}", path.display()))?;
    report
        .write_line(&stats.to_csv_line())
        .context("writing worker statistics line")?;
    report.close().context("closing worker report file")?;

    semaphore.close().context("closing shared semaphore")?;

    contention.with_context(|| format!("worker {} contention failed", params.worker_index))?;
    Ok(())
}
