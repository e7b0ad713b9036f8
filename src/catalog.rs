//! Tutorial source catalog.
//!
//! Scans a source directory for files whose names carry a numeric step
//! prefix (`3_something.rs`) and builds the step-number to filename map
//! that both commands work from. The directory is an explicit argument,
//! not process-global state, so catalogs are cheap to build in tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Delimiter separating the step number from the rest of the file name.
const STEP_DELIMITER: u8 = b'_';

/// Errors from catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The source directory does not exist.
    #[error("source directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// The source directory could not be read.
    #[error("failed to read source directory: {0}")]
    Io(#[from] io::Error),

    /// No entry in the directory matched the step naming convention.
    #[error("no step-prefixed sources found in {path}")]
    Empty { path: PathBuf },

    /// Two entries share the same numeric prefix. Directory listing order
    /// is platform-dependent, so "last one wins" would be nondeterministic.
    #[error("duplicate step {step}: '{first}' and '{second}'")]
    DuplicateStep {
        step: u32,
        first: String,
        second: String,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Immutable mapping from step number to source filename.
///
/// Built once per invocation by [`Catalog::scan`] and read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
    steps: BTreeMap<u32, String>,
}

impl Catalog {
    /// Scan `dir` and build the catalog.
    ///
    /// Only the top level of the directory is considered. Entries whose
    /// names do not start with a decimal digit run immediately followed
    /// by `_` are silently ignored; not every file in the directory need
    /// be a tutorial source.
    ///
    /// # Errors
    ///
    /// - `DirectoryNotFound` if `dir` does not exist
    /// - `Io` if the directory cannot be read
    /// - `Empty` if no entry matches the naming convention
    /// - `DuplicateStep` if two entries share a step number
    pub fn scan(dir: &Path) -> CatalogResult<Catalog> {
        if !dir.is_dir() {
            return Err(CatalogError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut steps: BTreeMap<u32, String> = BTreeMap::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| CatalogError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = match entry.file_name().to_str() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let step = match parse_step_prefix(&name) {
                Some(step) => step,
                None => continue,
            };
            if let Some(first) = steps.get(&step) {
                return Err(CatalogError::DuplicateStep {
                    step,
                    first: first.clone(),
                    second: name,
                });
            }
            tracing::trace!("catalog: step {} -> '{}'", step, name);
            steps.insert(step, name);
        }

        if steps.is_empty() {
            return Err(CatalogError::Empty {
                path: dir.to_path_buf(),
            });
        }

        Ok(Catalog {
            dir: dir.to_path_buf(),
            steps,
        })
    }

    /// The scanned source directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filename for `step`, if the catalog has one.
    pub fn file_for(&self, step: u32) -> Option<&str> {
        self.steps.get(&step).map(String::as_str)
    }

    /// Whether the catalog has a file for `step`.
    pub fn contains(&self, step: u32) -> bool {
        self.steps.contains_key(&step)
    }

    /// Lowest step number present. The catalog is never empty.
    pub fn min_step(&self) -> u32 {
        self.steps.keys().next().copied().unwrap_or(0)
    }

    /// Highest step number present. The catalog is never empty.
    pub fn max_step(&self) -> u32 {
        self.steps.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of catalogued steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a successfully scanned catalog.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over `(step, filename)` in ascending step order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.steps.iter().map(|(&step, name)| (step, name.as_str()))
    }
}

/// Parse the numeric step prefix from a file name.
///
/// Returns `None` unless the name starts with a decimal digit run
/// immediately followed by the delimiter. A digit run too large for
/// `u32` is treated as non-matching.
fn parse_step_prefix(name: &str) -> Option<u32> {
    let digits = name.len() - name.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    if name.as_bytes().get(digits) != Some(&STEP_DELIMITER) {
        return None;
    }
    name[..digits].parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
