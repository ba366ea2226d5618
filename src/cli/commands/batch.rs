//! Batch loading shared by `build` and `plan`

use crate::cache::{CacheEntry, ResourceCache};
use crate::cli::args::ResourceArgs;
use crate::cluster::{ClusterClient, OcClient};
use crate::config::Config;
use crate::error::{BcschedError, BcschedResult};
use crate::resource::{kinds, narrow_build_configs, ResourceIdentity};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Cache primed with the batch, plus the build configs to work on
pub struct Prepared {
    pub cache: ResourceCache,
    pub build_configs: Vec<ResourceIdentity>,
}

/// Connect to the cluster, load the batch file and pick the build configs.
///
/// Only the namespace lookup may touch `oc` here, and only when neither
/// `namespace` nor `cluster.namespace` is set.
pub async fn prepare(
    resources: &ResourceArgs,
    config: &Config,
    namespace: Option<String>,
) -> BcschedResult<Prepared> {
    let client = OcClient::connect(&config.cluster, namespace).await?;
    debug!("Using {} in {}", client.client_name(), client.default_namespace());

    let mut cache = ResourceCache::new(Arc::new(client));
    let documents = match &resources.file {
        Some(path) => read_documents(path).await?,
        None => Vec::new(),
    };
    let batch = cache.put_all(documents)?;
    debug!(objects = batch.len(), "Batch loaded");

    let build_configs = select_build_configs(&resources.names, &batch, cache.default_namespace())?;
    Ok(Prepared {
        cache,
        build_configs,
    })
}

/// Read a JSON resource, `List`, or array of resources
async fn read_documents(path: &Path) -> BcschedResult<Vec<Value>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| BcschedError::io(format!("reading batch from {}", path.display()), e))?;
    let document: Value = serde_json::from_str(&content)?;
    Ok(vec![document])
}

/// Build configs named on the command line, or every one in the batch
pub fn select_build_configs(
    names: &[String],
    batch: &[CacheEntry],
    default_namespace: &str,
) -> BcschedResult<Vec<ResourceIdentity>> {
    let selected = if names.is_empty() {
        narrow_build_configs(batch.iter().map(CacheEntry::identity))
    } else {
        names
            .iter()
            .map(|name| parse_build_config(name, default_namespace))
            .collect::<BcschedResult<Vec<_>>>()?
    };

    if selected.is_empty() {
        return Err(BcschedError::User(
            "No build configs given; name them or pass a --file containing some".to_string(),
        ));
    }
    Ok(selected)
}

/// A bare name is shorthand for a build config
fn parse_build_config(name: &str, default_namespace: &str) -> BcschedResult<ResourceIdentity> {
    if name.contains('/') {
        ResourceIdentity::parse(name, default_namespace)
    } else {
        Ok(ResourceIdentity::new(default_namespace, kinds::BUILD_CONFIG, name))
    }
}
