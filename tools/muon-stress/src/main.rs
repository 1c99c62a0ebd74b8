//! Composite shared-semaphore stress driver.
//!
//! Creates one named semaphore (initial count 1, maximum count 1), spawns
//! worker processes that contend on it, joins them all, and records one
//! statistics line for the run.
//!
//! Usage:
//!   muon-stress <process_count> <thread_count> <repeat_count> <relation_id> [name_suffix]

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use muon_pal::{NamedSemaphore, Stopwatch, WorkerChild, compose_name, join_all};
use muon_stress::SHARED_SEMAPHORE_BASE;
use muon_stress::config::Config;
use muon_stress::params::{self, StressParams};
use muon_stress::stats::{ReportFile, RunStats};

fn main() -> Result<ExitCode> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if params::wants_legacy_help(&argv) {
        StressParams::command()
            .print_help()
            .context("printing usage")?;
        return Ok(ExitCode::FAILURE);
    }

    let params = StressParams::parse();
    let config = Config::load();
    run(&params, &config)
}

fn run(params: &StressParams, config: &Config) -> Result<ExitCode> {
    let watch = Stopwatch::start();
    let mut failed = false;

    // The report file is opened before any child exists, so a run that
    // cannot record its result never spends work on one.
    let report_path = ReportFile::driver_path(&config.report_dir, params.relation_id);
    let mut report = ReportFile::create(report_path.clone())
        .with_context(|| format!("opening report file {}", report_path.display()))?;

    let sem_name = compose_name(SHARED_SEMAPHORE_BASE, params.name_suffix.as_deref());
    let semaphore = NamedSemaphore::create(&sem_name, 1, 1)
        .with_context(|| format!("creating shared semaphore {sem_name}"))?;

    let worker_exe = worker_binary()?;
    println!(
        "Spawning {} worker(s) contending on {sem_name}...",
        params.process_count
    );

    let mut children = Vec::with_capacity(params.process_count as usize);
    for index in 0..params.process_count {
        // A spawn failure aborts the run immediately; workers already
        // running are left to finish against the still-live semaphore.
        let child = WorkerChild::spawn(&worker_exe, &worker_args(params, index), index as usize)
            .with_context(|| format!("spawning worker {index}"))?;
        children.push(child);
    }

    for join in join_all(children) {
        match join.result {
            Ok(status) if status.success() => {}
            Ok(status) => {
                println!("worker {} exited with failure status: {status}", join.index);
                failed = true;
            }
            Err(err) => {
                println!("worker {}: {err}", join.index);
                failed = true;
            }
        }
    }

    let stats = RunStats {
        elapsed_millis: watch.elapsed_millis(),
        relation_id: params.relation_id,
        process_count: params.process_count,
        thread_count: params.thread_count,
        repeat_count: params.repeat_count,
        build_label: config.build_label.clone(),
    };
    if let Err(err) = report.write_line(&stats.to_csv_line()) {
        println!("error writing statistics line: {err}");
        failed = true;
    }
    if let Err(err) = report.close() {
        println!("error closing report file: {err}");
        failed = true;
    }

    if let Err(err) = semaphore.close() {
        println!("error closing shared semaphore: {err}");
        failed = true;
    }

    if failed {
        println!("Test Failed");
        return Ok(ExitCode::FAILURE);
    }
    println!("Test Passed");
    Ok(ExitCode::SUCCESS)
}

/// Locate the worker binary next to the running driver.
fn worker_binary() -> Result<PathBuf> {
    let mut path = std::env::current_exe().context("locating the driver binary")?;
    path.pop();
    path.push("muon-sem-worker");
    if !path.exists() {
        bail!("worker binary not found at {}", path.display());
    }
    Ok(path)
}

/// Arguments the worker at `index` is spawned with.
fn worker_args(params: &StressParams, index: u32) -> Vec<String> {
    let mut args = vec![
        index.to_string(),
        params.thread_count.to_string(),
        params.repeat_count.to_string(),
        params.relation_id.to_string(),
    ];
    if let Some(suffix) = &params.name_suffix {
        args.push(suffix.clone());
    }
    args
}
