//! Scheduling run results

use crate::cluster::BuildStatus;
use crate::resource::ResourceIdentity;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one build config's build
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecord {
    pub build_config: ResourceIdentity,
    pub build: Option<ResourceIdentity>,
    #[serde(flatten)]
    pub outcome: BuildStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Everything a scheduling run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Identifiers reported by every trigger, in completion order
    pub identifiers: Vec<ResourceIdentity>,
    /// Build configs launched by each sweep
    pub sweeps: Vec<Vec<ResourceIdentity>>,
    /// One record per build config, in completion order
    pub builds: Vec<BuildRecord>,
}

impl BuildReport {
    pub fn failed(&self) -> impl Iterator<Item = &BuildRecord> {
        self.builds.iter().filter(|record| !record.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn record(&self, build_config: &ResourceIdentity) -> Option<&BuildRecord> {
        self.builds
            .iter()
            .find(|record| &record.build_config == build_config)
    }

    /// Position of `identity` in the accumulated identifiers
    pub fn position(&self, identity: &ResourceIdentity) -> Option<usize> {
        self.identifiers.iter().position(|id| id == identity)
    }
}
