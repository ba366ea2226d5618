//! Cluster client abstraction
//!
//! The scheduler never talks to a cluster directly; it goes through this
//! trait so the `oc` CLI can be swapped for a fake in tests.

use crate::error::BcschedResult;
use crate::resource::ResourceIdentity;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Options for triggering a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Block until the cluster reports the build finished
    pub wait: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { wait: true }
    }
}

/// Final status reported for a triggered build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BuildStatus {
    Complete,
    Failed {
        phase: String,
        message: Option<String>,
    },
}

impl BuildStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Result of a build trigger
#[derive(Debug, Clone)]
pub struct BuildHandle {
    /// Every resource the trigger reported, the Build itself first
    pub identifiers: Vec<ResourceIdentity>,
    pub status: BuildStatus,
}

impl BuildHandle {
    pub fn identifiers(&self) -> &[ResourceIdentity] {
        &self.identifiers
    }

    /// The Build resource this trigger created
    pub fn build(&self) -> Option<&ResourceIdentity> {
        self.identifiers
            .iter()
            .find(|id| id.is_build())
            .or_else(|| self.identifiers.first())
    }
}

/// Capabilities the scheduler needs from a cluster
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Namespace used for names that don't carry one
    fn default_namespace(&self) -> &str;

    /// Batched read of current resource state.
    ///
    /// Objects that do not exist are left out; the rest keep request order.
    async fn fetch_objects(&self, identities: &[ResourceIdentity]) -> BcschedResult<Vec<Value>>;

    /// Start a build for a build config
    async fn start_build(
        &self,
        build_config: &ResourceIdentity,
        options: BuildOptions,
    ) -> BcschedResult<BuildHandle>;

    /// Human-readable client name for display
    fn client_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_prefers_build_identifier() {
        let handle = BuildHandle {
            identifiers: vec![
                ResourceIdentity::new("ns", "ImageStream", "app"),
                ResourceIdentity::new("ns", "Build", "app-1"),
            ],
            status: BuildStatus::Complete,
        };
        assert_eq!(handle.build().unwrap().name(), "app-1");
    }

    #[test]
    fn status_serializes_tagged() {
        let failed = BuildStatus::Failed {
            phase: "Failed".to_string(),
            message: None,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(!failed.is_success());
        assert!(BuildStatus::Complete.is_success());
    }
}
