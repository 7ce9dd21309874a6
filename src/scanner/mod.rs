// =============================================================================
// SOURCE SCANNER - src/scanner/mod.rs
// Discovery of assembly sources eligible for the pipeline
// =============================================================================

//! Lists the regular files directly inside the target directory whose
//! extension is one of the accepted assembly suffixes. Subdirectories
//! are never descended into. Results are ordered lexicographically by
//! path so repeated runs see the same discovery order.
//!
//! An empty result is not an error: the caller treats a directory with
//! no matching sources as a successful no-op run.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Extensions accepted as assembly sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["s", "as", "asm"];

/// One discovered assembly source. Immutable once discovered; owned by
/// the pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as discovered (directory + file name).
    pub path: PathBuf,
    /// File name minus extension; the conflict/grouping key.
    pub base_name: String,
    /// The matched extension, without the dot.
    pub extension: String,
}

/// Scan `dir` for eligible sources.
///
/// Fails with [`BuildError::DirectoryNotFound`] if `dir` does not exist
/// and [`BuildError::NotADirectory`] if it exists but is not a
/// directory. A directory with no matching files yields `Ok(vec![])`.
pub fn scan_sources(dir: &Path) -> Result<Vec<SourceFile>, BuildError> {
    if !dir.exists() {
        return Err(BuildError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(BuildError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut sources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&extension) {
            continue;
        }
        let Some(base_name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        sources.push(SourceFile {
            base_name: base_name.to_string(),
            extension: extension.to_string(),
            path,
        });
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        "scanned {}: {} eligible source(s)",
        dir.display(),
        sources.len()
    );
    Ok(sources)
}
