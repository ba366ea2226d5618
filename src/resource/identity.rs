//! Canonical resource addressing
//!
//! Every cluster resource is addressed by `namespace/kind/name`, with the
//! kind normalized so `ImageStream`, `is` and `imagestream.image.openshift.io`
//! all name the same thing.

use crate::error::{BcschedError, BcschedResult};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Canonical long-form kinds used by the scheduler
pub mod kinds {
    pub const IMAGE_STREAM: &str = "imagestream.image.openshift.io";
    pub const IMAGE_STREAM_TAG: &str = "imagestreamtag.image.openshift.io";
    pub const BUILD_CONFIG: &str = "buildconfig.build.openshift.io";
    pub const BUILD: &str = "build.build.openshift.io";
}

/// Normalize a kind to its canonical spelling.
///
/// Known OpenShift kinds map to their fully-qualified resource name; every
/// other kind is lower-cased so `Secret` and `secret` compare equal.
pub fn normalize_kind(kind: &str) -> String {
    let lower = kind.to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "imagestream" | "imagestreams" | "is" | kinds::IMAGE_STREAM => kinds::IMAGE_STREAM,
        "imagestreamtag" | "imagestreamtags" | "istag" | kinds::IMAGE_STREAM_TAG => {
            kinds::IMAGE_STREAM_TAG
        }
        "buildconfig" | "buildconfigs" | "bc" | kinds::BUILD_CONFIG => kinds::BUILD_CONFIG,
        "build" | "builds" | kinds::BUILD => kinds::BUILD,
        _ => return lower,
    };
    canonical.to_string()
}

/// Identifies a resource in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentity {
    namespace: String,
    kind: String,
    name: String,
}

impl ResourceIdentity {
    /// Create an identity, normalizing the kind
    pub fn new(
        namespace: impl Into<String>,
        kind: impl AsRef<str>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind: normalize_kind(kind.as_ref()),
            name: name.into(),
        }
    }

    /// Parse a raw name: `namespace/kind/name` or `kind/name`.
    ///
    /// With three or more segments the name is everything after the second
    /// `/`. A two-segment name takes `default_namespace`.
    pub fn parse(raw: &str, default_namespace: &str) -> BcschedResult<Self> {
        let invalid = || BcschedError::InvalidName {
            name: raw.to_string(),
        };

        let mut parts = raw.splitn(3, '/');
        let first = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let second = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

        match parts.next() {
            Some(name) if !name.is_empty() => Ok(Self::new(first, second, name)),
            Some(_) => Err(invalid()),
            None => Ok(Self::new(default_namespace, first, second)),
        }
    }

    /// Compute the identity of a decoded resource body
    pub fn from_body(body: &Value, default_namespace: &str) -> BcschedResult<Self> {
        let kind = body
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| BcschedError::malformed(describe(body), "missing 'kind'"))?;
        let metadata = body.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| BcschedError::malformed(describe(body), "missing 'metadata.name'"))?;
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
            .unwrap_or(default_namespace);

        Ok(Self::new(namespace, kind, name))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `kind/name`, the form the `oc` CLI accepts within a namespace
    pub fn short_name(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    pub fn is_build_config(&self) -> bool {
        self.kind == kinds::BUILD_CONFIG
    }

    pub fn is_build(&self) -> bool {
        self.kind == kinds::BUILD
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

impl Serialize for ResourceIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Keep only the build configs out of a list of identities
pub fn narrow_build_configs<'a, I>(identities: I) -> Vec<ResourceIdentity>
where
    I: IntoIterator<Item = &'a ResourceIdentity>,
{
    identities
        .into_iter()
        .filter(|id| id.is_build_config())
        .cloned()
        .collect()
}

fn describe(body: &Value) -> String {
    let kind = body.get("kind").and_then(Value::as_str).unwrap_or("<unknown kind>");
    let name = body
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    format!("{}/{}", kind, name)
}
