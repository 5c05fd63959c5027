//! Shell executor: runs each job's work as a `sh -c` script.
//!
//! Arguments become the script's positional parameters (`$1`, `$2`, ... / `"$@"`):
//! a scalar is one parameter, a positional list one parameter per item, and named
//! parameters expand to `--key value` pairs. Strings are passed raw, other JSON values
//! as compact JSON text.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::jobs::{ArgumentBinding, ExecutionContext, Executor, Work};

/// Shell executor configuration.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shell binary invoked with `-c`.
    pub shell: String,
    /// Variables kept when a job runs in a local (cleared) environment.
    pub local_scope_keep_env: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            local_scope_keep_env: vec!["PATH".to_string(), "HOME".to_string()],
        }
    }
}

/// Runs work bodies through a POSIX shell. A `PathBuf` host context sets the working
/// directory.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    config: ShellConfig,
}

impl ShellExecutor {
    /// Executor using `sh`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with custom configuration.
    #[must_use]
    pub fn with_config(config: ShellConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, ctx: &ExecutionContext, work: &Work, args: &ArgumentBinding) -> Command {
        let mut command = Command::new(&self.config.shell);
        command
            .arg("-c")
            .arg(work.body())
            .arg("omni-parallel")
            .args(render_arguments(args))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if ctx.use_local_scope {
            command.env_clear();
            for key in &self.config.local_scope_keep_env {
                if let Ok(value) = std::env::var(key) {
                    command.env(key, value);
                }
            }
        }
        command
            .env("OMNI_PARALLEL_JOB_ID", ctx.job_id.0.to_string())
            .env("OMNI_PARALLEL_ATTEMPT", ctx.attempt.to_string());

        if let Some(dir) = ctx.host.downcast_ref::<PathBuf>() {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        work: &Work,
        args: &ArgumentBinding,
    ) -> Result<Value> {
        let output = self
            .build_command(ctx, work, args)
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.config.shell))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "exit {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(stdout).unwrap_or_else(|_| Value::String(stdout.to_string())))
    }
}

/// Flatten a binding into shell positional parameters.
#[must_use]
pub fn render_arguments(args: &ArgumentBinding) -> Vec<String> {
    match args {
        ArgumentBinding::Scalar(value) => vec![render_value(value)],
        ArgumentBinding::Positional(values) => values.iter().map(render_value).collect(),
        ArgumentBinding::Named(map) => map
            .iter()
            .flat_map(|(key, value)| [format!("--{key}"), render_value(value)])
            .collect(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
