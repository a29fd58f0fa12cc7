//! Chart detection
//!
//! A chart is a directory directly containing the chart marker file
//! (`Chart.yaml` by default). Its files are templates and values, not
//! manifests, so the loader skips everything at or below a chart root.
//!
//! The tracker walks the root once up front and answers queries from what
//! it recorded, without touching the filesystem again. It is never mutated
//! afterwards and can be shared freely.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{DEFAULT_CHART_MARKER, LoadOptions};
use crate::error::{LoadError, Result};

/// Classifies directories under a root as chart roots or not
///
/// Anything the walk did not record as a chart root, including paths
/// created after construction, is not one.
#[derive(Debug, Clone)]
pub struct ChartTracker {
    root: PathBuf,
    marker: String,
    /// Directories directly containing the marker
    roots: HashSet<PathBuf>,
}

impl ChartTracker {
    /// Walk `root` looking for `Chart.yaml` markers
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_marker(root, DEFAULT_CHART_MARKER)
    }

    /// Walk `root` looking for a custom marker file
    pub fn with_marker(root: impl AsRef<Path>, marker: impl Into<String>) -> Result<Self> {
        Self::scan(root.as_ref(), marker.into(), false)
    }

    /// Walk `root` using the marker and link policy of `options`
    pub fn with_options(root: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        Self::scan(root.as_ref(), options.chart_marker.clone(), options.follow_links)
    }

    fn scan(root: &Path, marker: String, follow_links: bool) -> Result<Self> {
        let root = absolute(root).map_err(|e| LoadError::io(root, e))?;
        let mut roots = HashSet::new();
        let mut directories = 0usize;

        for entry in WalkDir::new(&root).follow_links(follow_links) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                directories += 1;
            } else if entry.depth() > 0 && entry.file_name() == marker.as_str() {
                if let Some(parent) = entry.path().parent() {
                    roots.insert(parent.to_path_buf());
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            charts = roots.len(),
            directories,
            "scanned for charts"
        );

        Ok(Self { root, marker, roots })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether `path` is a chart root
    pub fn is_chart(&self, path: impl AsRef<Path>) -> bool {
        self.roots.contains(&resolve(path.as_ref()))
    }

    /// Whether `path` is a chart root or lies inside one
    ///
    /// Ancestors are checked up to and including the tracker root.
    pub fn in_chart(&self, path: impl AsRef<Path>) -> bool {
        let path = resolve(path.as_ref());
        for ancestor in path.ancestors() {
            if !ancestor.starts_with(&self.root) {
                break;
            }
            if self.roots.contains(ancestor) {
                return true;
            }
        }
        false
    }

    /// Recorded chart roots, sorted
    pub fn chart_roots(&self) -> Vec<&Path> {
        let mut roots: Vec<&Path> = self.roots.iter().map(PathBuf::as_path).collect();
        roots.sort();
        roots
    }

}

/// Absolute, lexically clean form of `path`
pub(crate) fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path).map(|p| normalize(&p))
}

fn resolve(path: &Path) -> PathBuf {
    absolute(path).unwrap_or_else(|_| normalize(path))
}

/// Lexically clean a path so walk entries and queries compare equal
///
/// Drops `.` components and trailing separators and resolves `..` against
/// preceding normal components. The filesystem is not consulted.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
