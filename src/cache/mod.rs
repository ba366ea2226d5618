//! Process-local resource cache
//!
//! Maps a [`ResourceIdentity`] to the last known body of that resource.
//! Lookups that miss are fetched from the cluster in one batched call.
//!
//! # Contract
//!
//! | Operation | Fetches | Fails with |
//! |-----------|---------|------------|
//! | `get` / `resolve` | misses only, one batch | `MissingObject` if still absent |
//! | `put` / `put_all` | never | `MalformedResource` |
//! | `lookup` | never | - |

use crate::cluster::ClusterClient;
use crate::error::{BcschedError, BcschedResult};
use crate::resource::{flatten, ResourceIdentity};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A cached resource
#[derive(Debug, Clone)]
pub struct CacheEntry {
    identity: ResourceIdentity,
    body: Arc<Value>,
    short_name: String,
}

impl CacheEntry {
    fn new(identity: ResourceIdentity, body: Value) -> Self {
        let short_name = identity.short_name();
        Self {
            identity,
            body: Arc::new(body),
            short_name,
        }
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// `kind/name`
    pub fn short_name(&self) -> &str {
        &self.short_name
    }
}

/// Identity-keyed cache in front of a [`ClusterClient`]
pub struct ResourceCache {
    client: Arc<dyn ClusterClient>,
    default_namespace: String,
    entries: HashMap<ResourceIdentity, CacheEntry>,
}

impl ResourceCache {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        let default_namespace = client.default_namespace().to_string();
        Self {
            client,
            default_namespace,
            entries: HashMap::new(),
        }
    }

    pub fn client(&self) -> &Arc<dyn ClusterClient> {
        &self.client
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Entries for raw names, in input order, fetching any misses
    pub async fn get<S: AsRef<str>>(&mut self, names: &[S]) -> BcschedResult<Vec<CacheEntry>> {
        let identities = names
            .iter()
            .map(|name| ResourceIdentity::parse(name.as_ref(), &self.default_namespace))
            .collect::<BcschedResult<Vec<_>>>()?;
        self.resolve(&identities).await
    }

    /// Entries for identities, in input order, fetching any misses
    pub async fn resolve(
        &mut self,
        identities: &[ResourceIdentity],
    ) -> BcschedResult<Vec<CacheEntry>> {
        let mut seen = HashSet::new();
        let misses: Vec<ResourceIdentity> = identities
            .iter()
            .filter(|id| !self.entries.contains_key(*id) && seen.insert(*id))
            .cloned()
            .collect();

        if !misses.is_empty() {
            debug!(count = misses.len(), "Fetching uncached objects");
            let fetched = self.client.fetch_objects(&misses).await?;
            self.put_all(fetched)?;
        }

        identities
            .iter()
            .map(|id| {
                self.entries
                    .get(id)
                    .cloned()
                    .ok_or_else(|| BcschedError::MissingObject {
                        name: id.to_string(),
                    })
            })
            .collect()
    }

    /// Insert or overwrite one resource
    pub fn put(&mut self, body: Value) -> BcschedResult<CacheEntry> {
        let identity = ResourceIdentity::from_body(&body, &self.default_namespace)?;
        let entry = CacheEntry::new(identity.clone(), body);
        self.entries.insert(identity, entry.clone());
        Ok(entry)
    }

    /// Insert or overwrite many resources, expanding `List` bodies
    pub fn put_all(
        &mut self,
        bodies: impl IntoIterator<Item = Value>,
    ) -> BcschedResult<Vec<CacheEntry>> {
        bodies
            .into_iter()
            .flat_map(flatten)
            .map(|body| self.put(body))
            .collect()
    }

    /// Entry for an identity, without fetching
    pub fn lookup(&self, identity: &ResourceIdentity) -> Option<&CacheEntry> {
        self.entries.get(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fake::{image_stream, FakeCluster};
    use serde_json::json;

    fn cache_with(fake: FakeCluster) -> (Arc<FakeCluster>, ResourceCache) {
        let fake = Arc::new(fake);
        let cache = ResourceCache::new(fake.clone());
        (fake, cache)
    }

    #[tokio::test]
    async fn cached_entries_do_not_fetch() {
        let (fake, mut cache) = cache_with(FakeCluster::new("tools"));
        cache.put(image_stream("tools", "python")).unwrap();

        let entries = cache.get(&["ImageStream/python"]).await.unwrap();
        assert_eq!(entries[0].short_name(), "imagestream.image.openshift.io/python");
        assert!(fake.fetch_calls().is_empty());
    }

    #[tokio::test]
    async fn misses_are_fetched_in_one_batch() {
        let (fake, mut cache) = cache_with(
            FakeCluster::new("tools")
                .with_object(image_stream("tools", "a"))
                .with_object(image_stream("tools", "b")),
        );
        cache.put(image_stream("tools", "c")).unwrap();

        let entries = cache.get(&["is/b", "is/c", "is/a", "is/b"]).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.identity().name()).collect();
        assert_eq!(names, vec!["b", "c", "a", "b"]);

        let calls = fake.fetch_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn absent_after_fetch_is_missing() {
        let (_fake, mut cache) = cache_with(FakeCluster::new("tools"));
        let err = cache.get(&["is/nope"]).await.unwrap_err();
        assert!(matches!(err, BcschedError::MissingObject { .. }));
        assert!(err.to_string().contains("tools/imagestream.image.openshift.io/nope"));
    }

    #[tokio::test]
    async fn invalid_name_fails_before_fetch() {
        let (fake, mut cache) = cache_with(FakeCluster::new("tools"));
        assert!(cache.get(&["python"]).await.is_err());
        assert!(fake.fetch_calls().is_empty());
    }

    #[test]
    fn put_overwrites_slot() {
        let (_fake, mut cache) = cache_with(FakeCluster::new("tools"));
        cache.put(image_stream("tools", "app")).unwrap();
        let mut updated = image_stream("tools", "app");
        updated["status"] = json!({"dockerImageRepository": "registry/app"});
        cache.put(updated).unwrap();

        let id = ResourceIdentity::new("tools", "is", "app");
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&id).unwrap().body()["status"].is_object());
    }

    #[test]
    fn put_all_expands_lists() {
        let (_fake, mut cache) = cache_with(FakeCluster::new("tools"));
        let list = json!({
            "kind": "List",
            "items": [image_stream("tools", "a"), image_stream("prod", "b")]
        });
        let entries = cache.put_all([list]).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(cache
            .lookup(&ResourceIdentity::new("prod", "ImageStream", "b"))
            .is_some());
    }

    #[test]
    fn put_rejects_nameless_body() {
        let (_fake, mut cache) = cache_with(FakeCluster::new("tools"));
        assert!(cache.put(json!({"kind": "ImageStream"})).is_err());
        assert!(cache.is_empty());
    }
}
