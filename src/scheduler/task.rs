//! Build launch task
//!
//! Triggers one build, waits for it, and reads back every object the
//! trigger reported. Owns no shared state: the result is a message for the
//! scheduler to fold in.

use crate::cluster::{BuildHandle, BuildOptions, BuildStatus, ClusterClient};
use crate::error::{BcschedError, BcschedResult};
use crate::resource::ResourceIdentity;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build phases that mean the build did not produce an image
const UNSUCCESSFUL_PHASES: &[&str] = &["Failed", "Error", "Cancelled"];

/// Message returned by a finished launch task
#[derive(Debug)]
pub struct BuildCompletion {
    pub build_config: ResourceIdentity,
    pub handle: BuildHandle,
    /// Bodies of the identifiers in `handle`
    pub objects: Vec<Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct LaunchTask {
    client: Arc<dyn ClusterClient>,
    build_config: ResourceIdentity,
    timeout: Option<Duration>,
}

impl LaunchTask {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        build_config: ResourceIdentity,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            build_config,
            timeout,
        }
    }

    pub async fn run(self) -> BcschedResult<BuildCompletion> {
        let started_at = Utc::now();
        let trigger = self
            .client
            .start_build(&self.build_config, BuildOptions::default());

        let mut handle = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, trigger).await.map_err(|_| {
                BcschedError::BuildTimeout {
                    build_config: self.build_config.to_string(),
                    limit,
                }
            })??,
            None => trigger.await?,
        };

        if handle.identifiers.is_empty() {
            return Err(BcschedError::Internal(format!(
                "start-build for {} reported no build",
                self.build_config
            )));
        }

        let objects = self.client.fetch_objects(&handle.identifiers).await?;
        if handle.status.is_success() {
            if let Some(status) = refine_status(&handle, &objects) {
                handle.status = status;
            }
        }
        let finished_at = Utc::now();

        debug!(
            build_config = %self.build_config,
            success = handle.status.is_success(),
            objects = objects.len(),
            "Build task finished"
        );

        Ok(BuildCompletion {
            build_config: self.build_config,
            handle,
            objects,
            started_at,
            finished_at,
        })
    }
}

/// A failed status when the Build body disagrees with the trigger's success
fn refine_status(handle: &BuildHandle, objects: &[Value]) -> Option<BuildStatus> {
    let build = handle.build()?;
    let body = objects.iter().find(|body| {
        ResourceIdentity::from_body(body, build.namespace()).is_ok_and(|id| &id == build)
    })?;
    let phase = body.pointer("/status/phase").and_then(Value::as_str)?;
    if !UNSUCCESSFUL_PHASES.contains(&phase) {
        return None;
    }
    Some(BuildStatus::Failed {
        phase: phase.to_string(),
        message: body
            .pointer("/status/message")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
