//! Directory loading
//!
//! Walks a target below a root, skips charts and non-manifest files, and
//! parses every remaining file into one map of resources. Ids must be
//! unique across all files of a load.

use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use manifold_core::{Decoder, DuplicateResourceError, MultidocParser, Resources};
use walkdir::WalkDir;

use crate::chart::{self, ChartTracker};
use crate::config::LoadOptions;
use crate::error::{LoadError, Result};

/// Load `target` below `root` with default options
pub fn load(root: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Resources> {
    Loader::default().load(root, target)
}

/// Loads manifest trees
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
    parser: MultidocParser,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self::with_decoder(options, Decoder::default())
    }

    /// Create a loader decoding with a custom kind registry
    pub fn with_decoder(options: LoadOptions, decoder: Decoder) -> Self {
        let parser = MultidocParser::new(decoder).skip_malformed(options.skip_malformed);
        Self { options, parser }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load one file or directory
    ///
    /// A relative `target` is taken relative to `root`.
    pub fn load(&self, root: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Resources> {
        self.load_all(root, [target])
    }

    /// Load several targets into one map
    ///
    /// Listing a file twice, directly or through a directory, reports its
    /// resources as duplicates.
    pub fn load_all<I, P>(&self, root: impl AsRef<Path>, targets: I) -> Result<Resources>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.options.validate()?;

        let root = root.as_ref();
        let root = chart::absolute(root).map_err(|e| LoadError::io(root, e))?;
        let tracker = ChartTracker::with_options(&root, &self.options)?;

        let mut resources = Resources::new();
        for target in targets {
            let target = resolve_target(&root, target.as_ref())?;
            self.load_target(&tracker, &target, &mut resources)?;
        }

        tracing::debug!(root = %root.display(), count = resources.len(), "loaded manifests");
        Ok(resources)
    }

    fn load_target(&self, tracker: &ChartTracker, target: &Path, resources: &mut Resources) -> Result<()> {
        let metadata = std::fs::metadata(target).map_err(|e| LoadError::io(target, e))?;

        if tracker.in_chart(target) {
            tracing::debug!(path = %target.display(), "target is inside a chart, skipping");
            return Ok(());
        }

        if !metadata.is_dir() {
            if !self.options.is_manifest(target) {
                tracing::debug!(path = %target.display(), "not a manifest file, skipping");
                return Ok(());
            }
            return self.load_file(tracker.root(), target, resources);
        }

        let walker = WalkDir::new(target)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let pruned = entry.file_type().is_dir() && tracker.is_chart(entry.path());
                if pruned {
                    tracing::debug!(path = %entry.path().display(), "skipping chart");
                }
                !pruned
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.options.is_manifest(entry.path()) {
                continue;
            }
            self.load_file(tracker.root(), entry.path(), resources)?;
        }
        Ok(())
    }

    fn load_file(&self, root: &Path, path: &Path, resources: &mut Resources) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        let label = source_label(root, path);

        let parsed = self
            .parser
            .parse(&bytes, &label)
            .map_err(|source| LoadError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::trace!(path = %label, count = parsed.len(), "loaded file");

        for (id, resource) in parsed {
            match resources.entry(id) {
                Entry::Occupied(existing) => {
                    return Err(LoadError::Duplicate(DuplicateResourceError {
                        id: existing.key().clone(),
                        first: existing.get().source().to_string(),
                        second: resource.source().to_string(),
                    }));
                }
                Entry::Vacant(slot) => {
                    slot.insert(resource);
                }
            }
        }
        Ok(())
    }
}

fn resolve_target(root: &Path, target: &Path) -> Result<PathBuf> {
    let joined = root.join(target);
    let resolved = chart::absolute(&joined).map_err(|e| LoadError::io(&joined, e))?;
    if !resolved.starts_with(root) {
        return Err(LoadError::OutsideRoot {
            path: target.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// Root-relative path with `/` separators, or the file name for the root itself
fn source_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
    }
    parts.join("/")
}
