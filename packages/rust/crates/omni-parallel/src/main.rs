//! omni-parallel CLI: run a batch of shell jobs with a concurrency throttle.
//!
//! Settings come from `packages/conf/settings.yaml` merged with the user config home;
//! flags override both. Result records are printed to stdout as JSON lines in
//! submission order.
//!
//! Logging: set `RUST_LOG=omni_parallel=debug` to see per-job lifecycle logs on stderr.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use omni_parallel::{
    ArgumentBinding, HostContext, JobOutcomeKind, ParallelJobManager, ParallelSettings,
    ShellExecutor, WaitOutcome, Work, load_runtime_settings, set_config_home_override,
};

use crate::cli::{Cli, Command};

const EXIT_JOB_FAILED: u8 = 1;
const EXIT_TIMED_OUT: u8 = 2;

struct RunRequest {
    command: String,
    inputs: Vec<String>,
    inputs_file: Option<PathBuf>,
    throttle: Option<usize>,
    retry_limit: Option<u32>,
    timeout_ms: Option<u64>,
    local_scope: bool,
    workdir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing: RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "omni_parallel=debug"
        } else {
            "omni_parallel=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }
    let runtime_settings = load_runtime_settings();

    match cli.command {
        Command::Run {
            command,
            inputs,
            inputs_file,
            throttle,
            retry_limit,
            timeout_ms,
            local_scope,
            workdir,
        } => {
            let request = RunRequest {
                command,
                inputs,
                inputs_file,
                throttle,
                retry_limit,
                timeout_ms,
                local_scope,
                workdir,
            };
            run_batch(request, &runtime_settings.parallel).await
        }
    }
}

async fn run_batch(request: RunRequest, settings: &ParallelSettings) -> Result<ExitCode> {
    let bindings = collect_bindings(&request.inputs, request.inputs_file.as_deref())?;

    let mut config = settings.manager_config();
    if let Some(throttle) = request.throttle {
        config.throttle = throttle;
    }
    if let Some(retry_limit) = request.retry_limit {
        config.retry_limit = retry_limit;
    }
    config.use_local_scope |= request.local_scope;

    let host = request
        .workdir
        .map_or_else(HostContext::none, HostContext::new);
    let manager = ParallelJobManager::with_host(Arc::new(ShellExecutor::new()), config, host)?;

    let work = Work::new(request.command);
    for binding in bindings {
        manager.submit_binding(work.clone(), binding).await?;
    }
    let dispatch = manager.begin_processing().await?;

    let limit = request
        .timeout_ms
        .map(Duration::from_millis)
        .or_else(|| settings.wait_timeout());
    let outcome = match limit {
        Some(limit) => manager.wait_for_all_timeout(limit).await,
        None => {
            manager.wait_for_all().await;
            WaitOutcome::Completed
        }
    };

    if outcome.is_completed() {
        let summary = dispatch.join().await?;
        tracing::debug!(
            dispatched = summary.dispatched,
            crashed = summary.crashed,
            "dispatch finished"
        );
    } else {
        // Unfinished jobs are cancelled when the runtime shuts down on exit.
        let total = manager.total_count().await;
        let completed = manager.completed_count().await;
        tracing::warn!(total, completed, "wait timed out; printing partial results");
    }

    let mut results = manager.results().await;
    results.sort_by_key(|result| result.job_id);
    let any_failed = results
        .iter()
        .any(|result| result.kind() == JobOutcomeKind::Failed);
    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    if !outcome.is_completed() {
        return Ok(ExitCode::from(EXIT_TIMED_OUT));
    }
    if any_failed {
        return Ok(ExitCode::from(EXIT_JOB_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

fn collect_bindings(
    inputs: &[String],
    inputs_file: Option<&std::path::Path>,
) -> Result<Vec<ArgumentBinding>> {
    let mut raw: Vec<String> = inputs.to_vec();
    if let Some(path) = inputs_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inputs file {}", path.display()))?;
        raw.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string),
        );
    }
    Ok(raw.iter().map(|input| parse_input(input)).collect())
}

fn parse_input(raw: &str) -> ArgumentBinding {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => ArgumentBinding::from_json(value),
        Err(_) => ArgumentBinding::Scalar(Value::String(raw.to_string())),
    }
}
