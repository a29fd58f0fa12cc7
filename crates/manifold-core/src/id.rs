//! Canonical resource identity
//!
//! Every resource is identified by its `(namespace, kind, name)` triple,
//! rendered as `namespace:kind/name`. Cluster-scoped resources (or resources
//! that do not specify a namespace) render with the `<cluster>` placeholder.

use std::fmt;
use std::str::FromStr;

use crate::error::ManifestError;

/// Namespace placeholder used when rendering cluster-scoped identities
pub const CLUSTER_SCOPE: &str = "<cluster>";

/// Identity of a resource, unique within one load
///
/// Ordering compares namespace, then kind, then name, so a sorted set of ids
/// groups resources by namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    namespace: String,
    kind: String,
    name: String,
}

impl ResourceId {
    /// Create an id from its parts
    ///
    /// The kind is lowercased, so `Deployment` and `deployment` denote the
    /// same resource. An empty namespace means cluster-scoped or unspecified.
    pub fn new(namespace: impl Into<String>, kind: &str, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.to_lowercase(),
            name: name.into(),
        }
    }

    /// Namespace, empty for cluster-scoped resources
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Lowercased kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the id has no namespace
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = if self.namespace.is_empty() {
            CLUSTER_SCOPE
        } else {
            &self.namespace
        };
        write!(f, "{}:{}/{}", namespace, self.kind, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = ManifestError;

    /// Parse the `namespace:kind/name` form produced by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ManifestError::InvalidId {
            id: s.to_string(),
            reason: reason.to_string(),
        };

        let (namespace, rest) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected <namespace>:<kind>/<name>"))?;
        let (kind, name) = rest
            .split_once('/')
            .ok_or_else(|| invalid("expected <kind>/<name> after the namespace"))?;

        if namespace.is_empty() {
            return Err(invalid("namespace is empty; use <cluster> for cluster scope"));
        }
        let namespace = if namespace == CLUSTER_SCOPE {
            ""
        } else {
            namespace
        };
        if let Some(reason) = invalid_part(namespace, kind, name) {
            return Err(invalid(reason));
        }

        Ok(Self::new(namespace, kind, name))
    }
}

/// Why the parts cannot form an id that survives rendering and parsing
pub(crate) fn invalid_part(namespace: &str, kind: &str, name: &str) -> Option<&'static str> {
    if namespace.contains(':') || namespace == CLUSTER_SCOPE {
        return Some("namespace must not contain ':' or be the cluster placeholder");
    }
    if kind.is_empty() || !kind.chars().all(is_kind_char) {
        return Some("kind must be non-empty and alphanumeric");
    }
    if name.is_empty() || name.contains('/') {
        return Some("name must be non-empty and contain no '/'");
    }
    None
}

fn is_kind_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
