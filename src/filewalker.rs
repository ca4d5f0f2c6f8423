use crate::error::MergeWarning;
use ignore::WalkBuilder;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Ordered, absolute list of files taking part in a merge.
///
/// The first file's extension is canonical for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileList {
    files: Vec<PathBuf>,
}

impl ResolvedFileList {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Extension of the first file including the dot, e.g. `.rb`.
    pub fn extension(&self) -> String {
        self.files.first().map(|p| dotted_extension(p)).unwrap_or_default()
    }
}

/// Outcome of expanding the configured entries.
#[derive(Debug, Default)]
pub struct Resolution {
    pub files: ResolvedFileList,
    /// Basenames of entries that were neither a file nor a directory.
    pub unresolved: Vec<String>,
}

/// Expands file and directory entries into an ordered list of files.
///
/// Directories contribute their immediate regular-file children, sorted by
/// name. Hidden children and subdirectories are skipped.
pub fn resolve_paths(entries: &[PathBuf]) -> Resolution {
    let mut resolution = Resolution::default();

    for entry in entries {
        if entry.is_dir() {
            let children = list_directory(entry);
            debug!("{} -> {} file(s)", entry.display(), children.len());
            resolution.files.files.extend(children);
        } else if entry.is_file() {
            resolution.files.files.push(absolute(entry));
        } else {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.display().to_string());
            resolution.unresolved.push(name);
        }
    }

    resolution
}

fn list_directory(dir: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .hidden(true)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for result in builder.build() {
        match result {
            Ok(child) => {
                // Depth 0 is the directory itself.
                if child.depth() == 0 {
                    continue;
                }
                let path = child.path();
                if path.is_file() {
                    files.push(absolute(path));
                }
            }
            Err(err) => {
                warn!("Error listing {}: {err}", dir.display());
            }
        }
    }

    files
}

/// Collects files whose extension differs from the first file's.
pub fn check_extensions(files: &ResolvedFileList) -> Option<MergeWarning> {
    let expected = files.extension();
    let mismatched: Vec<String> = files
        .files()
        .iter()
        .filter(|f| dotted_extension(f) != expected)
        .map(|f| basename(f))
        .collect();

    if mismatched.is_empty() {
        None
    } else {
        Some(MergeWarning::ExtensionMismatch {
            expected,
            files: mismatched,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
