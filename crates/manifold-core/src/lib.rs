//! Manifold Core - resource identity and manifest stream parsing
//!
//! This crate provides the building blocks used to turn manifest files into
//! uniquely identified resources:
//! - `ResourceId`: the canonical `(namespace, kind, name)` identity
//! - `Resource`: a decoded manifest, one variant per known kind
//! - `KindRegistry`: the kind to constructor mapping used by the decoder
//! - `split_documents`: multi-document YAML splitting
//! - `parse_multidoc`: split, decode and collect a stream into `Resources`

pub mod decode;
pub mod error;
pub mod id;
pub mod multidoc;
pub mod object;
pub mod registry;
pub mod resource;
pub mod split;

pub use decode::{Decoder, LIST_KIND};
pub use error::{DecodeError, DuplicateResourceError, ManifestError, Result};
pub use id::{CLUSTER_SCOPE, ResourceId};
pub use multidoc::{MultidocParser, Resources, parse_multidoc};
pub use object::{BaseObject, Metadata};
pub use registry::{KindConstructor, KindRegistry};
pub use resource::{
    ConfigData, ConfigPayload, Container, CronJob, CronJobSpec, List, PodSpec, PodTemplate,
    Resource, Workload, WorkloadSpec,
};
pub use split::{Document, Documents, split_documents};
