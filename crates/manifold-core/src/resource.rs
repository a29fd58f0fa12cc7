//! Decoded resources
//!
//! A [`Resource`] is one manifest document decoded into the shape of its
//! kind. Kinds without a dedicated shape decode to [`Resource::Generic`], so
//! unknown or custom kinds always flow through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::id::ResourceId;
use crate::object::BaseObject;

/// A container in a pod template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default)]
    pub init_containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    #[serde(default)]
    pub spec: PodSpec,
}

/// `spec` of Deployments, DaemonSets and StatefulSets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    #[serde(default)]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub template: PodTemplate,
}

/// A workload controller running a pod template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workload {
    pub base: BaseObject,
    pub spec: WorkloadSpec,
}

impl Workload {
    /// Every container in the pod template, init containers first
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        let spec = &self.spec.template.spec;
        spec.init_containers.iter().chain(spec.containers.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    #[serde(default)]
    pub spec: JobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobSpec {
    #[serde(default)]
    pub schedule: String,

    #[serde(default)]
    pub job_template: JobTemplate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CronJob {
    pub base: BaseObject,
    pub spec: CronJobSpec,
}

/// Key/value payload of ConfigMaps and Secrets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    #[serde(default)]
    pub data: BTreeMap<String, Value>,

    #[serde(default)]
    pub binary_data: BTreeMap<String, Value>,

    /// Only meaningful for Secrets
    #[serde(default)]
    pub string_data: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigData {
    pub base: BaseObject,
    pub payload: ConfigPayload,
}

impl ConfigData {
    /// Keys across `data`, `binaryData` and `stringData`, sorted and deduplicated
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .payload
            .data
            .keys()
            .chain(self.payload.binary_data.keys())
            .chain(self.payload.string_data.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// A `kind: List` document
///
/// Lists are containers, not resources of their own: the multidoc parser
/// replaces a list with its items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct List {
    pub base: BaseObject,
    pub items: Vec<Resource>,
}

/// One decoded manifest
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Deployment(Workload),
    DaemonSet(Workload),
    StatefulSet(Workload),
    CronJob(CronJob),
    ConfigMap(ConfigData),
    Secret(ConfigData),
    Namespace(BaseObject),
    List(List),
    /// Any kind without a dedicated representation
    Generic(BaseObject),
}

impl Resource {
    /// Fields shared by every variant
    pub fn base(&self) -> &BaseObject {
        match self {
            Self::Deployment(w) | Self::DaemonSet(w) | Self::StatefulSet(w) => &w.base,
            Self::CronJob(c) => &c.base,
            Self::ConfigMap(c) | Self::Secret(c) => &c.base,
            Self::List(l) => &l.base,
            Self::Namespace(b) | Self::Generic(b) => b,
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn base_mut(&mut self) -> &mut BaseObject {
        match self {
            Self::Deployment(w) | Self::DaemonSet(w) | Self::StatefulSet(w) => &mut w.base,
            Self::CronJob(c) => &mut c.base,
            Self::ConfigMap(c) | Self::Secret(c) => &mut c.base,
            Self::List(l) => &mut l.base,
            Self::Namespace(b) | Self::Generic(b) => b,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.base().id()
    }

    /// Raw document bytes, for re-applying the resource as written
    pub fn bytes(&self) -> &[u8] {
        &self.base().bytes
    }

    pub fn kind(&self) -> &str {
        &self.base().kind
    }

    pub fn api_version(&self) -> &str {
        &self.base().api_version
    }

    /// Namespace as written, empty if unset
    pub fn namespace(&self) -> &str {
        &self.base().metadata.namespace
    }

    pub fn name(&self) -> &str {
        &self.base().metadata.name
    }

    /// File path or stream label this resource was loaded from
    pub fn source(&self) -> &str {
        &self.base().source
    }

    /// Whether the kind fell back to the generic representation
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    /// The workload view of Deployments, DaemonSets and StatefulSets
    pub fn as_workload(&self) -> Option<&Workload> {
        match self {
            Self::Deployment(w) | Self::DaemonSet(w) | Self::StatefulSet(w) => Some(w),
            _ => None,
        }
    }

    /// Copy of this resource with the raw bytes cleared
    ///
    /// Decoded resources compare equal on meaning only once their payloads
    /// are stripped, since formatting differs between otherwise identical
    /// documents.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn without_payload(&self) -> Resource {
        let mut stripped = self.clone();
        stripped.clear_payload();
        stripped
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn clear_payload(&mut self) {
        if let Self::List(list) = self {
            for item in &mut list.items {
                item.clear_payload();
            }
        }
        self.base_mut().bytes = Vec::new();
    }
}
