//! Node object model shared with the cluster store.
//!
//! The store owns node objects; this crate only reads and rewrites their
//! label and annotation maps. Maps are always materialized, so an absent map
//! and an empty map are the same thing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label and annotation mapping with deterministic iteration order.
pub type LabelMap = BTreeMap<String, String>;

/// Node name, the identity reconcile requests are keyed by.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned unique identifier of a node object.
///
/// Unlike the name, the UID never survives object recreation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeUid(String);

impl NodeUid {
    /// Create a node UID.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Get the UID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque version token the store bumps on every write.
///
/// Tokens are only ever compared for equality; their internal ordering is a
/// store implementation detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceVersion(String);

impl ResourceVersion {
    /// Create a resource version token.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cluster node as this operator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name.
    pub name: NodeName,
    /// Store-assigned unique identifier.
    pub uid: NodeUid,
    /// Version token of the last persisted write.
    pub resource_version: ResourceVersion,
    /// Spec generation counter.
    pub generation: i64,
    /// Label map.
    #[serde(default)]
    pub labels: LabelMap,
    /// Annotation map.
    #[serde(default)]
    pub annotations: LabelMap,
}

impl Node {
    /// Create a node with empty label and annotation maps.
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: NodeName::new(name),
            uid: NodeUid::new(uid),
            resource_version: ResourceVersion::new("0"),
            generation: 0,
            labels: LabelMap::new(),
            annotations: LabelMap::new(),
        }
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Set the resource version.
    pub fn with_resource_version(mut self, version: impl Into<String>) -> Self {
        self.resource_version = ResourceVersion::new(version);
        self
    }

    /// Set the generation counter.
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = generation;
        self
    }
}
