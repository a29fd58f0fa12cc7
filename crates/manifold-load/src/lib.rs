//! Manifold Load - manifest tree loading
//!
//! Loads every manifest file below a target directory into one map of
//! resources keyed by id, skipping Helm-style charts:
//!
//! ```no_run
//! let resources = manifold_load::load("./repo", "apps")?;
//! for (id, resource) in &resources {
//!     println!("{id} from {}", resource.source());
//! }
//! # Ok::<(), manifold_load::LoadError>(())
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod loader;

pub use chart::ChartTracker;
pub use config::{DEFAULT_CHART_MARKER, LoadOptions};
pub use error::{LoadError, Result};
pub use loader::{Loader, load};

pub use manifold_core::{Resource, ResourceId, Resources};
