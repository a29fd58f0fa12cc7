//! Kind registry
//!
//! Maps `kind` discriminants to the constructor building the matching
//! [`Resource`] variant. The registry is an ordinary value handed to the
//! [`Decoder`](crate::decode::Decoder); there is no global table.

use std::collections::HashMap;

use serde_yaml::Value;

use crate::object::BaseObject;
use crate::resource::{ConfigData, CronJob, Resource, Workload};

/// Builds a resource from its decoded base and the full document value
pub type KindConstructor = fn(BaseObject, Value) -> Result<Resource, serde_yaml::Error>;

/// Immutable mapping from kind to constructor
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    constructors: HashMap<String, KindConstructor>,
}

impl KindRegistry {
    /// A registry without any kinds: everything decodes as generic
    pub fn empty() -> Self {
        Self::default()
    }

    /// The kinds with dedicated representations
    pub fn standard() -> Self {
        Self::empty()
            .register("Deployment", deployment)
            .register("DaemonSet", daemon_set)
            .register("StatefulSet", stateful_set)
            .register("CronJob", cron_job)
            .register("ConfigMap", config_map)
            .register("Secret", secret)
            .register("Namespace", namespace)
    }

    /// Register (or replace) the constructor for a kind
    pub fn register(mut self, kind: impl Into<String>, constructor: KindConstructor) -> Self {
        self.constructors.insert(kind.into(), constructor);
        self
    }

    /// Constructor for a kind, if one is registered
    pub fn get(&self, kind: &str) -> Option<KindConstructor> {
        self.constructors.get(kind).copied()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

/// Fallback constructor for unregistered kinds
pub fn generic(base: BaseObject, _value: Value) -> Result<Resource, serde_yaml::Error> {
    Ok(Resource::Generic(base))
}

fn spec_of(value: &mut Value) -> Value {
    value
        .as_mapping_mut()
        .and_then(|m| m.remove("spec"))
        .unwrap_or(Value::Null)
}

fn workload(base: BaseObject, mut value: Value) -> Result<Workload, serde_yaml::Error> {
    let spec = match spec_of(&mut value) {
        Value::Null => Default::default(),
        spec => serde_yaml::from_value(spec)?,
    };
    Ok(Workload { base, spec })
}

fn deployment(base: BaseObject, value: Value) -> Result<Resource, serde_yaml::Error> {
    workload(base, value).map(Resource::Deployment)
}

fn daemon_set(base: BaseObject, value: Value) -> Result<Resource, serde_yaml::Error> {
    workload(base, value).map(Resource::DaemonSet)
}

fn stateful_set(base: BaseObject, value: Value) -> Result<Resource, serde_yaml::Error> {
    workload(base, value).map(Resource::StatefulSet)
}

fn cron_job(base: BaseObject, mut value: Value) -> Result<Resource, serde_yaml::Error> {
    let spec = match spec_of(&mut value) {
        Value::Null => Default::default(),
        spec => serde_yaml::from_value(spec)?,
    };
    Ok(Resource::CronJob(CronJob { base, spec }))
}

fn config_data(base: BaseObject, value: Value) -> Result<ConfigData, serde_yaml::Error> {
    let payload = serde_yaml::from_value(value)?;
    Ok(ConfigData { base, payload })
}

fn config_map(base: BaseObject, value: Value) -> Result<Resource, serde_yaml::Error> {
    config_data(base, value).map(Resource::ConfigMap)
}

fn secret(base: BaseObject, value: Value) -> Result<Resource, serde_yaml::Error> {
    config_data(base, value).map(Resource::Secret)
}

fn namespace(base: BaseObject, _value: Value) -> Result<Resource, serde_yaml::Error> {
    Ok(Resource::Namespace(base))
}
