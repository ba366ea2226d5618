//! Build dependency graph
//!
//! Build configs and image streams live in two arenas and point at each
//! other by typed index:
//!
//! ```text
//! BuildConfig ──output──▶ ImageStream ◀──dependencies── BuildConfig
//!      ▲                       │
//!      └──────producer─────────┘
//! ```
//!
//! `output` and `producer` are only written together by [`BuildGraph::link_output`].

mod builder;

pub use builder::GraphBuilder;

use crate::cache::CacheEntry;
use crate::error::{BcschedError, BcschedResult};
use crate::resource::ResourceIdentity;
use std::collections::{HashMap, VecDeque};

/// Index of a build config node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildConfigId(usize);

/// Index of an image stream node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageStreamId(usize);

/// A build config and its links
#[derive(Debug, Clone)]
pub struct BuildConfigEntry {
    entry: CacheEntry,
    output: Option<ImageStreamId>,
    dependencies: Vec<ImageStreamId>,
    build: Option<CacheEntry>,
}

impl BuildConfigEntry {
    pub fn entry(&self) -> &CacheEntry {
        &self.entry
    }

    pub fn identity(&self) -> &ResourceIdentity {
        self.entry.identity()
    }

    /// Image stream this build config pushes to
    pub fn output(&self) -> Option<ImageStreamId> {
        self.output
    }

    /// Image streams read as build input, in declaration order
    pub fn dependencies(&self) -> &[ImageStreamId] {
        &self.dependencies
    }

    /// The completed build, once the scheduler has observed it
    pub fn build(&self) -> Option<&CacheEntry> {
        self.build.as_ref()
    }
}

/// An image stream and the build config producing it
#[derive(Debug, Clone)]
pub struct ImageStreamEntry {
    entry: CacheEntry,
    producer: Option<BuildConfigId>,
}

impl ImageStreamEntry {
    pub fn entry(&self) -> &CacheEntry {
        &self.entry
    }

    pub fn identity(&self) -> &ResourceIdentity {
        self.entry.identity()
    }

    /// `None` means the stream is supplied from outside the batch
    pub fn producer(&self) -> Option<BuildConfigId> {
        self.producer
    }
}

/// Producer/consumer graph between build configs
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    build_configs: Vec<BuildConfigEntry>,
    image_streams: Vec<ImageStreamEntry>,
    build_config_index: HashMap<ResourceIdentity, BuildConfigId>,
    image_stream_index: HashMap<ResourceIdentity, ImageStreamId>,
}

impl BuildGraph {
    pub fn build_config(&self, id: BuildConfigId) -> &BuildConfigEntry {
        &self.build_configs[id.0]
    }

    pub fn image_stream(&self, id: ImageStreamId) -> &ImageStreamEntry {
        &self.image_streams[id.0]
    }

    /// Build config ids in batch order
    pub fn build_config_ids(&self) -> impl Iterator<Item = BuildConfigId> {
        (0..self.build_configs.len()).map(BuildConfigId)
    }

    pub fn len(&self) -> usize {
        self.build_configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.build_configs.is_empty()
    }

    pub fn image_stream_count(&self) -> usize {
        self.image_streams.len()
    }

    pub fn find_build_config(&self, identity: &ResourceIdentity) -> Option<BuildConfigId> {
        self.build_config_index.get(identity).copied()
    }

    pub fn find_image_stream(&self, identity: &ResourceIdentity) -> Option<ImageStreamId> {
        self.image_stream_index.get(identity).copied()
    }

    /// Distinct build configs whose output `id` consumes
    pub fn upstream(&self, id: BuildConfigId) -> Vec<BuildConfigId> {
        let mut producers = Vec::new();
        for stream in &self.build_config(id).dependencies {
            if let Some(producer) = self.image_stream(*stream).producer {
                if !producers.contains(&producer) {
                    producers.push(producer);
                }
            }
        }
        producers
    }

    /// Every input is external or already built
    pub fn is_ready(&self, id: BuildConfigId) -> bool {
        self.upstream(id)
            .into_iter()
            .all(|producer| self.build_config(producer).build.is_some())
    }

    /// Record the completed build of a build config
    pub fn set_build(&mut self, id: BuildConfigId, build: CacheEntry) -> BcschedResult<()> {
        let node = &mut self.build_configs[id.0];
        if let Some(existing) = &node.build {
            return Err(BcschedError::Internal(format!(
                "{} already has build {}",
                node.entry.identity(),
                existing.identity()
            )));
        }
        node.build = Some(build);
        Ok(())
    }

    /// Topological waves: each wave only depends on earlier waves.
    ///
    /// Fails with `CyclicDependency` listing every build config that sits on
    /// or behind a cycle.
    pub fn waves(&self) -> BcschedResult<Vec<Vec<BuildConfigId>>> {
        let mut in_degree = vec![0usize; self.build_configs.len()];
        let mut downstream: Vec<Vec<BuildConfigId>> = vec![Vec::new(); self.build_configs.len()];
        for consumer in self.build_config_ids() {
            for producer in self.upstream(consumer) {
                in_degree[consumer.0] += 1;
                downstream[producer.0].push(consumer);
            }
        }

        let mut ready: VecDeque<BuildConfigId> = self
            .build_config_ids()
            .filter(|id| in_degree[id.0] == 0)
            .collect();
        let mut waves = Vec::new();
        let mut placed = 0;

        while !ready.is_empty() {
            let wave: Vec<BuildConfigId> = ready.drain(..).collect();
            for id in &wave {
                for consumer in &downstream[id.0] {
                    in_degree[consumer.0] -= 1;
                    if in_degree[consumer.0] == 0 {
                        ready.push_back(*consumer);
                    }
                }
            }
            placed += wave.len();
            waves.push(wave);
        }

        if placed < self.build_configs.len() {
            let build_configs = self
                .build_config_ids()
                .filter(|id| in_degree[id.0] > 0)
                .map(|id| self.build_config(id).identity().to_string())
                .collect();
            return Err(BcschedError::CyclicDependency { build_configs });
        }

        Ok(waves)
    }

    /// Reject graphs that can never finish
    pub fn check_feasible(&self) -> BcschedResult<()> {
        self.waves().map(|_| ())
    }

    pub(crate) fn add_build_config(&mut self, entry: CacheEntry) -> BuildConfigId {
        if let Some(id) = self.find_build_config(entry.identity()) {
            return id;
        }
        let id = BuildConfigId(self.build_configs.len());
        self.build_config_index.insert(entry.identity().clone(), id);
        self.build_configs.push(BuildConfigEntry {
            entry,
            output: None,
            dependencies: Vec::new(),
            build: None,
        });
        id
    }

    /// One node per image stream, shared by every consumer
    pub(crate) fn intern_image_stream(&mut self, entry: CacheEntry) -> ImageStreamId {
        if let Some(id) = self.find_image_stream(entry.identity()) {
            return id;
        }
        let id = ImageStreamId(self.image_streams.len());
        self.image_stream_index.insert(entry.identity().clone(), id);
        self.image_streams.push(ImageStreamEntry {
            entry,
            producer: None,
        });
        id
    }

    /// Make `build_config` the producer of `stream`.
    ///
    /// Returns the build config that produced it before, which loses its output.
    pub(crate) fn link_output(
        &mut self,
        build_config: BuildConfigId,
        stream: ImageStreamId,
    ) -> Option<BuildConfigId> {
        let previous = self.image_streams[stream.0]
            .producer
            .replace(build_config)
            .filter(|previous| *previous != build_config);
        if let Some(previous) = previous {
            self.build_configs[previous.0].output = None;
        }
        self.build_configs[build_config.0].output = Some(stream);
        previous
    }

    pub(crate) fn add_dependency(&mut self, build_config: BuildConfigId, stream: ImageStreamId) {
        self.build_configs[build_config.0].dependencies.push(stream);
    }
}
