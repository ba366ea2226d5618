//! In-memory cluster for tests
//!
//! Serves objects from a map, records every call, and simulates builds
//! with a configurable duration and outcome.

use crate::cluster::client::{BuildHandle, BuildOptions, BuildStatus, ClusterClient};
use crate::error::{BcschedError, BcschedResult};
use crate::resource::{kinds, ResourceIdentity};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Something the fake cluster observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Started(String),
    Finished(String),
}

#[derive(Debug, Clone)]
struct FakeBuild {
    delay: Duration,
    status: BuildStatus,
}

/// Fake [`ClusterClient`] backed by an in-memory object map
pub struct FakeCluster {
    namespace: String,
    objects: Mutex<HashMap<ResourceIdentity, Value>>,
    builds: HashMap<String, FakeBuild>,
    default_delay: Duration,
    fetch_calls: Mutex<Vec<Vec<ResourceIdentity>>>,
    events: Mutex<Vec<FakeEvent>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeCluster {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            objects: Mutex::new(HashMap::new()),
            builds: HashMap::new(),
            default_delay: Duration::from_millis(5),
            fetch_calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Register an object the cluster should serve
    pub fn with_object(self, body: Value) -> Self {
        let identity = ResourceIdentity::from_body(&body, &self.namespace)
            .expect("fake object needs kind and metadata.name");
        lock(&self.objects).insert(identity, body);
        self
    }

    pub fn with_objects(self, bodies: impl IntoIterator<Item = Value>) -> Self {
        bodies.into_iter().fold(self, Self::with_object)
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Make builds of `build_config` take `delay`
    pub fn with_build_delay(mut self, build_config: &str, delay: Duration) -> Self {
        let status = self.status_for(build_config);
        self.builds
            .insert(build_config.to_string(), FakeBuild { delay, status });
        self
    }

    /// Make builds of `build_config` fail
    pub fn with_build_failure(mut self, build_config: &str) -> Self {
        let delay = self.delay_for(build_config);
        self.builds.insert(
            build_config.to_string(),
            FakeBuild {
                delay,
                status: BuildStatus::Failed {
                    phase: "Failed".to_string(),
                    message: Some("assemble script failed".to_string()),
                },
            },
        );
        self
    }

    /// Names of the build configs `start_build` was called for, in order
    pub fn started(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                FakeEvent::Started(name) => Some(name.clone()),
                FakeEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        lock(&self.events).clone()
    }

    pub fn fetch_calls(&self) -> Vec<Vec<ResourceIdentity>> {
        lock(&self.fetch_calls).clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn delay_for(&self, build_config: &str) -> Duration {
        self.builds
            .get(build_config)
            .map_or(self.default_delay, |b| b.delay)
    }

    fn status_for(&self, build_config: &str) -> BuildStatus {
        self.builds
            .get(build_config)
            .map_or(BuildStatus::Complete, |b| b.status.clone())
    }

    fn record(&self, event: FakeEvent) {
        lock(&self.events).push(event);
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn default_namespace(&self) -> &str {
        &self.namespace
    }

    async fn fetch_objects(&self, identities: &[ResourceIdentity]) -> BcschedResult<Vec<Value>> {
        lock(&self.fetch_calls).push(identities.to_vec());
        let objects = lock(&self.objects);
        Ok(identities
            .iter()
            .filter_map(|id| objects.get(id).cloned())
            .collect())
    }

    async fn start_build(
        &self,
        build_config: &ResourceIdentity,
        options: BuildOptions,
    ) -> BcschedResult<BuildHandle> {
        if !lock(&self.objects).contains_key(build_config) {
            return Err(BcschedError::command_exec(
                format!("oc start-build {}", build_config.short_name()),
                format!("buildconfig \"{}\" not found", build_config.name()),
            ));
        }

        let name = build_config.name().to_string();
        self.record(FakeEvent::Started(name.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if options.wait {
            tokio::time::sleep(self.delay_for(&name)).await;
        }
        let status = self.status_for(&name);

        let build_number = lock(&self.events)
            .iter()
            .filter(|e| **e == FakeEvent::Started(name.clone()))
            .count();
        let build_name = format!("{}-{}", name, build_number);
        let phase = match &status {
            BuildStatus::Complete => "Complete".to_string(),
            BuildStatus::Failed { phase, .. } => phase.clone(),
        };
        let build = json!({
            "kind": "Build",
            "metadata": {"name": build_name, "namespace": build_config.namespace()},
            "status": {"phase": phase}
        });
        let identity = ResourceIdentity::new(build_config.namespace(), kinds::BUILD, &build_name);
        lock(&self.objects).insert(identity.clone(), build);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(FakeEvent::Finished(name));

        Ok(BuildHandle {
            identifiers: vec![identity],
            status,
        })
    }

    fn client_name(&self) -> &'static str {
        "Fake cluster"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An `ImageStream` body
pub fn image_stream(namespace: &str, name: &str) -> Value {
    json!({
        "kind": "ImageStream",
        "apiVersion": "image.openshift.io/v1",
        "metadata": {"name": name, "namespace": namespace}
    })
}

/// A source-strategy `BuildConfig` body.
///
/// `inputs` are `ImageStreamTag` names (`stream:tag`); the first is the
/// strategy image, the rest become `spec.source.images`.
pub fn build_config(namespace: &str, name: &str, inputs: &[&str], output: Option<&str>) -> Value {
    let tag = |n: &str| json!({"kind": "ImageStreamTag", "name": n});
    let strategy = match inputs.first() {
        Some(first) => json!({"type": "Source", "sourceStrategy": {"from": tag(first)}}),
        None => json!({"type": "Docker", "dockerStrategy": {}}),
    };
    let images: Vec<Value> = inputs
        .iter()
        .skip(1)
        .map(|n| json!({"from": tag(n), "paths": []}))
        .collect();
    let output = match output {
        Some(to) => json!({"to": tag(to)}),
        None => json!({}),
    };

    json!({
        "kind": "BuildConfig",
        "apiVersion": "build.openshift.io/v1",
        "metadata": {"name": name, "namespace": namespace},
        "spec": {
            "output": output,
            "strategy": strategy,
            "source": {"images": images}
        }
    })
}
