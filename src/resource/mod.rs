//! Cluster resource model
//!
//! Identity and the typed build-config views the scheduler reads.

pub mod build_config;
pub mod identity;

pub use build_config::{BuildConfigSpec, ObjectReference};
pub use identity::{kinds, narrow_build_configs, normalize_kind, ResourceIdentity};

use serde_json::Value;

/// Flatten a decoded document into individual resources.
///
/// A `List` (anything carrying an `items` array) yields its items; any
/// other object yields itself.
pub fn flatten(document: Value) -> Vec<Value> {
    match document {
        Value::Object(mut obj) if matches!(obj.get("items"), Some(Value::Array(_))) => {
            match obj.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        Value::Array(items) => items.into_iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}
