//! Configuration schema for bcsched
//!
//! Configuration is stored at `~/.config/bcsched/config.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// How to reach the cluster
    pub cluster: ClusterConfig,

    /// Build scheduling settings
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// OpenShift CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Path or name of the `oc` binary
    pub oc_binary: String,

    /// Default namespace (falls back to the current `oc` project)
    pub namespace: Option<String>,

    /// kubeconfig context passed as `--context`
    pub context: Option<String>,

    /// API server passed as `--server`
    pub server: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            oc_binary: "oc".to_string(),
            namespace: None,
            context: None,
            server: None,
        }
    }
}

/// What to do when a triggered build does not complete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the run on the first failed build
    #[default]
    FailFast,
    /// Log the failure and treat the build as done
    Ignore,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "fail-fast"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

/// Build scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Upper bound on one trigger-and-wait in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// Failure handling
    pub on_failure: FailurePolicy,

    /// Maximum builds in flight at once (0 = unbounded)
    pub max_concurrent: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            on_failure: FailurePolicy::FailFast,
            max_concurrent: 0,
        }
    }
}

impl BuildConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }
}
