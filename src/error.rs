//! Error types for bcsched
//!
//! All modules use `BcschedResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bcsched operations
pub type BcschedResult<T> = Result<T, BcschedError>;

/// All errors that can occur in bcsched
#[derive(Error, Debug)]
pub enum BcschedError {
    // Resource errors
    #[error("Missing object: {name}")]
    MissingObject { name: String },

    #[error("Invalid resource name '{name}': expected [namespace/]kind/name")]
    InvalidName { name: String },

    #[error("Malformed resource {name}: {reason}")]
    MalformedResource { name: String, reason: String },

    // Graph errors
    #[error("Expected 'ImageStreamTag' but found '{kind}' in {build_config}.spec.output.to")]
    UnsupportedOutputKind { build_config: String, kind: String },

    #[error("Expected 'ImageStreamTag' but found '{kind}' as build input of {build_config}")]
    UnsupportedInputKind { build_config: String, kind: String },

    #[error("Cyclic dependency between build configs: {}", build_configs.join(", "))]
    CyclicDependency { build_configs: Vec<String> },

    // Build errors
    #[error("Build {build} of {build_config} failed: {reason}")]
    BuildFailed {
        build_config: String,
        build: String,
        reason: String,
    },

    #[error("Build of {build_config} did not finish within {limit:?}")]
    BuildTimeout { build_config: String, limit: Duration },

    #[error("Scheduling stalled with pending build configs: {}", pending.join(", "))]
    Stalled { pending: Vec<String> },

    // Cluster CLI errors
    #[error("OpenShift CLI not found: {binary}")]
    OcNotFound { binary: String },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl BcschedError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a malformed resource error
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was raised before any build could be triggered
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::MalformedResource { .. }
                | Self::UnsupportedOutputKind { .. }
                | Self::UnsupportedInputKind { .. }
                | Self::CyclicDependency { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::OcNotFound { .. } => {
                Some("Install the OpenShift CLI or set cluster.oc_binary in the config")
            }
            Self::MissingObject { .. } => {
                Some("Apply the resource first, or include it in the batch file")
            }
            Self::CyclicDependency { .. } => {
                Some("Break the cycle so no build config consumes an image stream it transitively produces")
            }
            Self::BuildTimeout { .. } => Some("Raise build.timeout_secs or pass --timeout"),
            Self::BuildFailed { .. } => {
                Some("Inspect the build logs with: oc logs build/<name>. Pass --ignore-failures to continue anyway")
            }
            _ => None,
        }
    }
}
