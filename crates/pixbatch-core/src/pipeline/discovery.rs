//! File discovery for finding images under a source directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
    excluded_dirs: Vec<String>,
}

/// One discovered source image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Full path to the file
    pub path: PathBuf,
    /// Path relative to the discovery root; only its stem is used to derive
    /// the output filename, since all outputs land in one flat directory
    pub relative_path: PathBuf,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            excluded_dirs: Vec::new(),
        }
    }

    /// Prune the named directories (and their subtrees) from recursive
    /// walks. Outputs are JPEGs and therefore eligible inputs, so a
    /// pipeline must keep its own output directories out of its input set.
    pub fn with_excluded_dirs(mut self, dirs: impl IntoIterator<Item = String>) -> Self {
        self.excluded_dirs = dirs.into_iter().collect();
        self
    }

    /// Discover all supported image files under `root`.
    ///
    /// Non-recursive mode lists only direct children; recursive mode walks
    /// every subdirectory. Returns an empty vec (never an error) when
    /// nothing matches — the caller decides whether that is fatal.
    pub fn discover(&self, root: &Path, recursive: bool) -> Vec<ImageRecord> {
        let mut walker = WalkDir::new(root).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && self.is_supported(path) {
                let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                files.push(ImageRecord {
                    path: path.to_path_buf(),
                    relative_path,
                });
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a directory entry is one of the excluded subtrees.
    /// The walk root itself is never excluded, whatever its name.
    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.excluded_dirs.iter().any(|dir| dir == name))
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}
