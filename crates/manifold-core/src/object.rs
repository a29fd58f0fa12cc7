//! Fields shared by every decoded resource

use serde::{Deserialize, Serialize};

use crate::id::ResourceId;

/// The identity-bearing `metadata` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Empty when the manifest does not set a namespace
    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub name: String,
}

/// Common shape of every resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseObject {
    /// File path or stream label the document came from (diagnostics only)
    pub source: String,

    /// `apiVersion`, empty when absent
    pub api_version: String,

    /// Kind discriminant as written in the manifest
    pub kind: String,

    pub metadata: Metadata,

    /// Document bytes exactly as they appeared in the stream
    pub bytes: Vec<u8>,
}

impl BaseObject {
    /// Identity derived from namespace, kind and name
    pub fn id(&self) -> ResourceId {
        ResourceId::new(
            self.metadata.namespace.as_str(),
            &self.kind,
            self.metadata.name.as_str(),
        )
    }
}
