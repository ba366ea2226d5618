//! Build scheduler
//!
//! Runs every build config of a [`BuildGraph`] to completion in rounds:
//!
//! 1. **Sweep**: rotate the pending queue once, launching each entry whose
//!    inputs are all built and requeueing the rest.
//! 2. **Drain**: join every in-flight launch task and fold its completion
//!    into the cache and graph.
//!
//! Launch tasks only return messages. The cache, graph and report are
//! mutated here, between `join_next` calls.

mod report;
mod task;

pub use report::{BuildRecord, BuildReport};
pub use task::{BuildCompletion, LaunchTask};

use crate::cache::ResourceCache;
use crate::cluster::BuildStatus;
use crate::config::{BuildConfig, FailurePolicy};
use crate::error::{BcschedError, BcschedResult};
use crate::graph::{BuildConfigId, BuildGraph, GraphBuilder};
use crate::resource::ResourceIdentity;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Knobs for one scheduling run
#[derive(Debug, Clone, Default)]
pub struct SchedulerOptions {
    /// Bound on each trigger-and-wait
    pub timeout: Option<Duration>,
    pub on_failure: FailurePolicy,
    /// Cap on builds in flight; `None` is unbounded
    pub max_concurrent: Option<usize>,
}

impl From<&BuildConfig> for SchedulerOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            timeout: config.timeout(),
            on_failure: config.on_failure,
            max_concurrent: config.concurrency_limit(),
        }
    }
}

/// Progress notifications
#[derive(Debug)]
pub enum SchedulerEvent<'a> {
    Launched(&'a ResourceIdentity),
    Finished(&'a BuildRecord),
}

type Observer = Box<dyn FnMut(SchedulerEvent<'_>) + Send>;

pub struct Scheduler {
    cache: ResourceCache,
    options: SchedulerOptions,
    observer: Option<Observer>,
}

impl Scheduler {
    pub fn new(cache: ResourceCache, options: SchedulerOptions) -> Self {
        Self {
            cache,
            options,
            observer: None,
        }
    }

    /// Receive an event for every launch and completion
    pub fn with_observer(
        mut self,
        observer: impl FnMut(SchedulerEvent<'_>) + Send + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache {
        &mut self.cache
    }

    /// Build the dependency graph for `build_configs`
    pub async fn plan(&mut self, build_configs: &[ResourceIdentity]) -> BcschedResult<BuildGraph> {
        GraphBuilder::new(&mut self.cache).build(build_configs).await
    }

    /// Plan and run `build_configs`
    pub async fn schedule(
        &mut self,
        build_configs: &[ResourceIdentity],
    ) -> BcschedResult<BuildReport> {
        let graph = self.plan(build_configs).await?;
        self.run(graph).await
    }

    /// Drive every build config in `graph` to completion
    pub async fn run(&mut self, mut graph: BuildGraph) -> BcschedResult<BuildReport> {
        let mut queue: VecDeque<BuildConfigId> = graph.build_config_ids().collect();
        let mut tasks: JoinSet<BcschedResult<BuildCompletion>> = JoinSet::new();
        let mut report = BuildReport::default();

        info!(build_configs = queue.len(), "Scheduling builds");

        while !queue.is_empty() {
            let launched = self.sweep(&graph, &mut queue, &mut tasks);
            debug!(
                sweep = report.sweeps.len() + 1,
                launched = launched.len(),
                delayed = queue.len(),
                "Sweep finished"
            );

            if launched.is_empty() && tasks.is_empty() {
                let pending = queue
                    .iter()
                    .map(|id| graph.build_config(*id).identity().to_string())
                    .collect();
                return Err(BcschedError::Stalled { pending });
            }
            if !launched.is_empty() {
                report.sweeps.push(launched);
            }

            if !queue.is_empty() {
                self.drain(&mut graph, &mut tasks, &mut report).await?;
            }
        }

        self.drain(&mut graph, &mut tasks, &mut report).await?;
        info!(builds = report.builds.len(), "All builds finished");
        Ok(report)
    }

    /// One rotation of the queue.
    ///
    /// Ends once the number of consecutive entries that were not launched
    /// equals the queue length.
    fn sweep(
        &mut self,
        graph: &BuildGraph,
        queue: &mut VecDeque<BuildConfigId>,
        tasks: &mut JoinSet<BcschedResult<BuildCompletion>>,
    ) -> Vec<ResourceIdentity> {
        let mut launched = Vec::new();
        let mut misses = 0;

        while misses < queue.len() {
            let Some(id) = queue.pop_front() else {
                break;
            };
            let identity = graph.build_config(id).identity();
            let at_capacity = self
                .options
                .max_concurrent
                .is_some_and(|limit| tasks.len() >= limit);

            if !at_capacity && graph.is_ready(id) {
                debug!("Launching build of {}", identity);
                let task = LaunchTask::new(
                    self.cache.client().clone(),
                    identity.clone(),
                    self.options.timeout,
                );
                tasks.spawn(task.run());
                self.notify(SchedulerEvent::Launched(identity));
                launched.push(identity.clone());
                misses = 0;
            } else {
                debug!("Requeueing {}", identity);
                queue.push_back(id);
                misses += 1;
            }
        }

        launched
    }

    /// Join every in-flight task, folding completions in arrival order
    async fn drain(
        &mut self,
        graph: &mut BuildGraph,
        tasks: &mut JoinSet<BcschedResult<BuildCompletion>>,
        report: &mut BuildReport,
    ) -> BcschedResult<()> {
        while let Some(joined) = tasks.join_next().await {
            let completion = joined
                .map_err(|e| BcschedError::Internal(format!("build task failed: {}", e)))??;
            self.fold(graph, report, completion)?;
        }
        Ok(())
    }

    fn fold(
        &mut self,
        graph: &mut BuildGraph,
        report: &mut BuildReport,
        completion: BuildCompletion,
    ) -> BcschedResult<()> {
        let BuildCompletion {
            build_config,
            handle,
            objects,
            started_at,
            finished_at,
        } = completion;

        let id = graph.find_build_config(&build_config).ok_or_else(|| {
            BcschedError::Internal(format!("completion for unknown build config {}", build_config))
        })?;

        self.cache.put_all(objects)?;
        for identity in handle.identifiers() {
            if self.cache.lookup(identity).is_none() {
                return Err(BcschedError::MissingObject {
                    name: identity.to_string(),
                });
            }
        }

        let build = handle.build().cloned();
        let build_entry = build
            .as_ref()
            .and_then(|identity| self.cache.lookup(identity))
            .cloned();
        if let BuildStatus::Failed { phase, message } = &handle.status {
            let reason = message.clone().unwrap_or_else(|| phase.clone());
            let build_name = build
                .as_ref()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string);
            match self.options.on_failure {
                FailurePolicy::FailFast => {
                    return Err(BcschedError::BuildFailed {
                        build_config: build_config.to_string(),
                        build: build_name,
                        reason,
                    });
                }
                FailurePolicy::Ignore => {
                    warn!("Build {} of {} failed: {}", build_name, build_config, reason);
                }
            }
        }

        if let Some(entry) = build_entry {
            graph.set_build(id, entry)?;
        }
        debug!("Build of {} folded in", build_config);

        report.identifiers.extend(handle.identifiers.iter().cloned());
        report.builds.push(BuildRecord {
            build_config,
            build,
            outcome: handle.status,
            started_at,
            finished_at,
        });
        if let Some(record) = report.builds.last() {
            if let Some(observer) = self.observer.as_mut() {
                observer(SchedulerEvent::Finished(record));
            }
        }
        Ok(())
    }

    fn notify(&mut self, event: SchedulerEvent<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }
}
