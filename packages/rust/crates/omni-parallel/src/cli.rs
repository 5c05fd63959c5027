use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "omni-parallel")]
#[command(about = "Run a batch of shell jobs with bounded concurrency and collect their results.")]
pub(crate) struct Cli {
    /// Override config home (absolute, or relative to `PRJ_ROOT`/cwd).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Debug logging for omni_parallel (RUST_LOG still wins).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run `--command` once per input. Inputs are JSON when they parse, plain strings
    /// otherwise; arrays bind positionally and objects as `--key value` pairs.
    Run {
        /// Shell script run via `sh -c`; inputs arrive as `$1`, `$2`, ... / `"$@"`.
        #[arg(long)]
        command: String,

        /// One input per job (repeatable).
        #[arg(long = "input")]
        inputs: Vec<String>,

        /// File with one input per line (JSON lines or plain text).
        #[arg(long)]
        inputs_file: Option<PathBuf>,

        /// Max concurrently running jobs (default: settings, then 4).
        #[arg(long)]
        throttle: Option<usize>,

        /// Extra attempts for failed jobs (default: settings, then 0).
        #[arg(long)]
        retry_limit: Option<u32>,

        /// Stop waiting after this many milliseconds; running jobs are not cancelled.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Run each job with a cleared environment.
        #[arg(long)]
        local_scope: bool,

        /// Working directory for every job.
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
}
