//! Loader configuration
//!
//! Options can be built in code or read from YAML:
//!
//! ```yaml
//! chartMarker: Chart.yaml
//! extensions: [yaml, yml]
//! followLinks: false
//! skipMalformed: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LoadError, Result};

/// Marker file identifying a chart root
pub const DEFAULT_CHART_MARKER: &str = "Chart.yaml";

/// Options controlling which files are loaded and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    /// File whose presence makes a directory a chart root
    #[serde(default = "default_chart_marker")]
    pub chart_marker: String,

    /// Extensions of manifest files, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,

    /// Skip documents that fail to decode instead of failing the load
    #[serde(default)]
    pub skip_malformed: bool,
}

fn default_chart_marker() -> String {
    DEFAULT_CHART_MARKER.to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chart_marker: default_chart_marker(),
            extensions: default_extensions(),
            follow_links: false,
            skip_malformed: false,
        }
    }
}

impl LoadOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let options: Self = serde_yaml::from_str(content).map_err(|e| LoadError::InvalidConfig {
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Set the chart marker file name
    pub fn with_chart_marker(mut self, marker: impl Into<String>) -> Self {
        self.chart_marker = marker.into();
        self
    }

    /// Set the manifest extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    /// Check the options are usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(LoadError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.chart_marker.trim().is_empty() {
            return invalid("chartMarker must not be empty");
        }
        if self.chart_marker.contains(['/', '\\']) || self.chart_marker == ".." {
            return invalid("chartMarker must be a plain file name");
        }
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return invalid("at least one manifest extension is required");
        }
        Ok(())
    }

    /// Whether a file name has one of the manifest extensions
    ///
    /// Comparison ignores case and a leading dot in the configured extension.
    pub fn is_manifest(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
    }
}
