//! Runtime settings loader for omni-parallel.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/settings.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/omni-dev-fusion/settings.yaml`
//!
//! Merge precedence is user over system.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::jobs::ParallelJobManagerConfig;

const SYSTEM_SETTINGS_PATH: &str = "packages/conf/settings.yaml";
const USER_SETTINGS_PATH: &str = "omni-dev-fusion/settings.yaml";
const DEFAULT_CONFIG_HOME: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Settings file root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    /// `parallel:` section.
    #[serde(default)]
    pub parallel: ParallelSettings,
}

/// `parallel:` section; every field is optional so files can override selectively.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ParallelSettings {
    /// Maximum concurrently running jobs.
    pub throttle: Option<usize>,
    /// Extra attempts for failed jobs.
    pub retry_limit: Option<u32>,
    /// Ask the executor to isolate each job's environment.
    pub use_local_scope: Option<bool>,
    /// Default bound for waits, in milliseconds. Absent means wait until done.
    pub wait_timeout_ms: Option<u64>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            parallel: self.parallel.merge(overlay.parallel),
        }
    }
}

impl ParallelSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            throttle: overlay.throttle.or(self.throttle),
            retry_limit: overlay.retry_limit.or(self.retry_limit),
            use_local_scope: overlay.use_local_scope.or(self.use_local_scope),
            wait_timeout_ms: overlay.wait_timeout_ms.or(self.wait_timeout_ms),
        }
    }

    /// Manager config with unset fields taken from the defaults. Not validated here.
    #[must_use]
    pub fn manager_config(&self) -> ParallelJobManagerConfig {
        let defaults = ParallelJobManagerConfig::default();
        ParallelJobManagerConfig {
            throttle: self.throttle.unwrap_or(defaults.throttle),
            retry_limit: self.retry_limit.unwrap_or(defaults.retry_limit),
            use_local_scope: self.use_local_scope.unwrap_or(defaults.use_local_scope),
        }
    }

    /// Wait bound, if configured.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

/// Load the system and user settings files; user values win.
pub fn load_runtime_settings() -> RuntimeSettings {
    let root = project_root();
    load_settings_layers(&[
        root.join(SYSTEM_SETTINGS_PATH),
        config_home(&root).join(USER_SETTINGS_PATH),
    ])
}

/// Merge settings files in order; a later layer overrides the fields it sets. Missing
/// or malformed layers contribute nothing.
pub fn load_settings_layers<P: AsRef<Path>>(layers: &[P]) -> RuntimeSettings {
    layers
        .iter()
        .filter_map(|layer| read_layer(layer.as_ref()))
        .fold(RuntimeSettings::default(), RuntimeSettings::merge)
}

fn read_layer(path: &Path) -> Option<RuntimeSettings> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "settings layer not present");
        return None;
    }
    let raw = std::fs::read_to_string(path)
        .inspect_err(|error| {
            tracing::warn!(path = %path.display(), error = %error, "settings layer unreadable; skipped");
        })
        .ok()?;
    serde_yaml::from_str(&raw)
        .inspect_err(|error| {
            tracing::warn!(path = %path.display(), error = %error, "settings layer is not valid yaml; skipped");
        })
        .ok()
}

/// Point the user settings lookup at another config home (CLI `--conf`). Relative paths
/// resolve against the project root. The first override wins.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    let current = CONFIG_HOME_OVERRIDE.get_or_init(|| path.clone());
    if *current != path {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home already overridden"
        );
    }
}

fn project_root() -> PathBuf {
    env_path("PRJ_ROOT")
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn config_home(root: &Path) -> PathBuf {
    let home = CONFIG_HOME_OVERRIDE
        .get()
        .cloned()
        .or_else(|| env_path("PRJ_CONFIG_HOME"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_HOME));
    if home.is_absolute() { home } else { root.join(home) }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = std::env::var(key).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}
