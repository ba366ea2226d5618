//! Typed views over build-config bodies
//!
//! Only the fields the dependency graph reads are modelled; everything
//! else in the body is ignored.

use crate::error::{BcschedError, BcschedResult};
use crate::resource::identity::{kinds, normalize_kind, ResourceIdentity};
use serde::Deserialize;
use serde_json::Value;

/// Reference to another object (`{kind, name, namespace?}`)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObjectReference {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl ObjectReference {
    pub fn is_image_stream_tag(&self) -> bool {
        normalize_kind(&self.kind) == kinds::IMAGE_STREAM_TAG
    }

    /// The image stream behind an `ImageStreamTag` reference (`name:tag` → `name`)
    pub fn image_stream(&self, default_namespace: &str) -> ResourceIdentity {
        let stream = self
            .name
            .split_once(':')
            .map_or(self.name.as_str(), |(stream, _tag)| stream);
        let namespace = self
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(default_namespace);
        ResourceIdentity::new(namespace, kinds::IMAGE_STREAM, stream)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigSpec {
    #[serde(default)]
    pub output: BuildOutput,
    #[serde(default)]
    pub strategy: BuildStrategy,
    #[serde(default)]
    pub source: BuildSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildOutput {
    #[serde(default)]
    pub to: Option<ObjectReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategy {
    #[serde(default)]
    pub source_strategy: Option<StrategyFrom>,
    #[serde(default)]
    pub docker_strategy: Option<StrategyFrom>,
}

impl BuildStrategy {
    /// The strategy's base image, if it declares one
    pub fn base_image(&self) -> Option<&ObjectReference> {
        self.source_strategy
            .as_ref()
            .or(self.docker_strategy.as_ref())
            .and_then(|s| s.from.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyFrom {
    #[serde(default)]
    pub from: Option<ObjectReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSource {
    #[serde(default)]
    pub images: Vec<SourceImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceImage {
    pub from: ObjectReference,
}

impl BuildConfigSpec {
    /// Decode `spec` out of a build-config body
    pub fn from_body(identity: &ResourceIdentity, body: &Value) -> BcschedResult<Self> {
        match body.get("spec") {
            Some(spec) => Self::deserialize(spec)
                .map_err(|e| BcschedError::malformed(identity.to_string(), e.to_string())),
            None => Err(BcschedError::malformed(identity.to_string(), "missing 'spec'")),
        }
    }

    /// Every image this build reads: the strategy image, then source images
    pub fn input_images(&self) -> Vec<&ObjectReference> {
        self.strategy
            .base_image()
            .into_iter()
            .chain(self.source.images.iter().map(|image| &image.from))
            .collect()
    }
}
