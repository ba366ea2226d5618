//! Graph construction from cached build configs

use crate::cache::ResourceCache;
use crate::error::{BcschedError, BcschedResult};
use crate::graph::{BuildConfigId, BuildGraph, ImageStreamId};
use crate::resource::{BuildConfigSpec, ObjectReference, ResourceIdentity};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Image streams one build config writes and reads
struct Links {
    output: Option<ResourceIdentity>,
    inputs: Vec<ResourceIdentity>,
}

/// Resolves build-config inputs and outputs into a [`BuildGraph`]
pub struct GraphBuilder<'a> {
    cache: &'a mut ResourceCache,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(cache: &'a mut ResourceCache) -> Self {
        Self { cache }
    }

    /// Build and check the graph for `build_configs`.
    ///
    /// Duplicate identities collapse to their first occurrence. Anything not
    /// in the cache is fetched, build configs in one batch and image streams
    /// in a second.
    pub async fn build(self, build_configs: &[ResourceIdentity]) -> BcschedResult<BuildGraph> {
        let mut seen = HashSet::new();
        let unique: Vec<ResourceIdentity> = build_configs
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        let entries = self.cache.resolve(&unique).await?;

        let mut links = Vec::with_capacity(entries.len());
        for entry in &entries {
            links.push(read_links(entry.identity(), entry.body())?);
        }

        let mut streams: Vec<ResourceIdentity> = Vec::new();
        for link in &links {
            for stream in link.output.iter().chain(&link.inputs) {
                if !streams.contains(stream) {
                    streams.push(stream.clone());
                }
            }
        }
        let stream_entries = self.cache.resolve(&streams).await?;

        let mut graph = BuildGraph::default();
        let ids: Vec<BuildConfigId> = entries
            .into_iter()
            .map(|entry| graph.add_build_config(entry))
            .collect();
        for entry in stream_entries {
            graph.intern_image_stream(entry);
        }

        for (&id, link) in ids.iter().zip(&links) {
            if let Some(output) = &link.output {
                let stream = interned(&graph, output)?;
                if let Some(previous) = graph.link_output(id, stream) {
                    warn!(
                        "{} and {} both produce {}, keeping {}",
                        graph.build_config(previous).identity(),
                        graph.build_config(id).identity(),
                        output,
                        graph.build_config(id).identity(),
                    );
                }
            }
        }

        for (&id, link) in ids.iter().zip(&links) {
            for input in &link.inputs {
                let stream = interned(&graph, input)?;
                graph.add_dependency(id, stream);
            }
        }

        debug!(
            build_configs = graph.len(),
            image_streams = graph.image_stream_count(),
            "Dependency graph built"
        );

        graph.check_feasible()?;
        Ok(graph)
    }
}

fn interned(graph: &BuildGraph, identity: &ResourceIdentity) -> BcschedResult<ImageStreamId> {
    graph
        .find_image_stream(identity)
        .ok_or_else(|| BcschedError::Internal(format!("image stream {} was not resolved", identity)))
}

/// Validate and collect the image streams a build config touches
fn read_links(identity: &ResourceIdentity, body: &serde_json::Value) -> BcschedResult<Links> {
    let spec = BuildConfigSpec::from_body(identity, body)?;
    let namespace = identity.namespace();

    let output = match &spec.output.to {
        Some(to) if to.is_image_stream_tag() => Some(to.image_stream(namespace)),
        Some(to) => {
            return Err(BcschedError::UnsupportedOutputKind {
                build_config: identity.to_string(),
                kind: to.kind.clone(),
            })
        }
        None => None,
    };

    let inputs = spec
        .input_images()
        .into_iter()
        .map(|reference| input_stream(identity, reference))
        .collect::<BcschedResult<Vec<_>>>()?;

    Ok(Links { output, inputs })
}

fn input_stream(
    identity: &ResourceIdentity,
    reference: &ObjectReference,
) -> BcschedResult<ResourceIdentity> {
    if !reference.is_image_stream_tag() {
        return Err(BcschedError::UnsupportedInputKind {
            build_config: identity.to_string(),
            kind: reference.kind.clone(),
        });
    }
    Ok(reference.image_stream(identity.namespace()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{build_config, image_stream, FakeCluster};
    use serde_json::json;
    use std::sync::Arc;

    fn bc(name: &str) -> ResourceIdentity {
        ResourceIdentity::new("tools", "BuildConfig", name)
    }

    fn cache(fake: FakeCluster) -> (Arc<FakeCluster>, ResourceCache) {
        let fake = Arc::new(fake);
        (fake.clone(), ResourceCache::new(fake))
    }

    #[tokio::test]
    async fn links_producers_and_consumers() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        cache
            .put_all([
                build_config("tools", "base", &["ubi:9"], Some("base:latest")),
                build_config("tools", "app", &["base:latest", "assets:1"], Some("app:latest")),
                image_stream("tools", "ubi"),
                image_stream("tools", "base"),
                image_stream("tools", "assets"),
                image_stream("tools", "app"),
            ])
            .unwrap();

        let graph = GraphBuilder::new(&mut cache)
            .build(&[bc("app"), bc("base")])
            .await
            .unwrap();

        let ids: Vec<_> = graph.build_config_ids().collect();
        assert_eq!(graph.build_config(ids[0]).identity(), &bc("app"));
        assert_eq!(graph.upstream(ids[0]), vec![ids[1]]);
        assert_eq!(graph.build_config(ids[0]).dependencies().len(), 2);

        let base = graph
            .find_image_stream(&ResourceIdentity::new("tools", "is", "base"))
            .unwrap();
        assert_eq!(graph.image_stream(base).producer(), Some(ids[1]));
        assert_eq!(graph.build_config(ids[1]).output(), Some(base));

        let ubi = graph
            .find_image_stream(&ResourceIdentity::new("tools", "is", "ubi"))
            .unwrap();
        assert_eq!(graph.image_stream(ubi).producer(), None);
    }

    #[tokio::test]
    async fn missing_streams_are_fetched_in_one_batch() {
        let (fake, mut cache) = cache(
            FakeCluster::new("tools")
                .with_object(image_stream("tools", "ubi"))
                .with_object(image_stream("tools", "app")),
        );
        cache
            .put(build_config("tools", "app", &["ubi:9"], Some("app:latest")))
            .unwrap();

        GraphBuilder::new(&mut cache).build(&[bc("app")]).await.unwrap();
        let calls = fake.fetch_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
    }

    #[tokio::test]
    async fn duplicate_names_collapse() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        cache.put(build_config("tools", "a", &[], None)).unwrap();
        let graph = GraphBuilder::new(&mut cache)
            .build(&[bc("a"), bc("a")])
            .await
            .unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[tokio::test]
    async fn input_namespace_is_honored() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        let mut body = build_config("tools", "app", &["python:3.9"], None);
        body["spec"]["strategy"]["sourceStrategy"]["from"]["namespace"] = json!("openshift");
        cache
            .put_all([body, image_stream("openshift", "python")])
            .unwrap();

        let graph = GraphBuilder::new(&mut cache).build(&[bc("app")]).await.unwrap();
        assert!(graph
            .find_image_stream(&ResourceIdentity::new("openshift", "is", "python"))
            .is_some());
    }

    #[tokio::test]
    async fn docker_image_output_is_rejected() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        let mut body = build_config("tools", "app", &[], None);
        body["spec"]["output"]["to"] = json!({"kind": "DockerImage", "name": "quay.io/x/app"});
        cache.put(body).unwrap();

        let err = GraphBuilder::new(&mut cache)
            .build(&[bc("app")])
            .await
            .unwrap_err();
        assert!(matches!(err, BcschedError::UnsupportedOutputKind { .. }));
    }

    #[tokio::test]
    async fn docker_image_input_is_rejected() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        let mut body = build_config("tools", "app", &[], None);
        body["spec"]["strategy"] = json!({
            "dockerStrategy": {"from": {"kind": "DockerImage", "name": "alpine:3"}}
        });
        cache.put(body).unwrap();

        let err = GraphBuilder::new(&mut cache)
            .build(&[bc("app")])
            .await
            .unwrap_err();
        assert!(matches!(err, BcschedError::UnsupportedInputKind { .. }));
    }

    #[tokio::test]
    async fn missing_input_stream_is_fatal() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        cache
            .put(build_config("tools", "app", &["ghost:1"], None))
            .unwrap();
        let err = GraphBuilder::new(&mut cache)
            .build(&[bc("app")])
            .await
            .unwrap_err();
        assert!(matches!(err, BcschedError::MissingObject { .. }));
    }

    #[tokio::test]
    async fn later_producer_wins() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        cache
            .put_all([
                build_config("tools", "first", &[], Some("app:latest")),
                build_config("tools", "second", &[], Some("app:latest")),
                image_stream("tools", "app"),
            ])
            .unwrap();

        let graph = GraphBuilder::new(&mut cache)
            .build(&[bc("first"), bc("second")])
            .await
            .unwrap();
        let ids: Vec<_> = graph.build_config_ids().collect();
        let app = graph
            .find_image_stream(&ResourceIdentity::new("tools", "is", "app"))
            .unwrap();
        assert_eq!(graph.image_stream(app).producer(), Some(ids[1]));
        assert_eq!(graph.build_config(ids[0]).output(), None);
    }

    #[tokio::test]
    async fn cycle_is_rejected() {
        let (_fake, mut cache) = cache(FakeCluster::new("tools"));
        cache
            .put_all([
                build_config("tools", "a", &["b:latest"], Some("a:latest")),
                build_config("tools", "b", &["a:latest"], Some("b:latest")),
                image_stream("tools", "a"),
                image_stream("tools", "b"),
            ])
            .unwrap();

        let err = GraphBuilder::new(&mut cache)
            .build(&[bc("a"), bc("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, BcschedError::CyclicDependency { .. }));
    }
}
