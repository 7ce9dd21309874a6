// =============================================================================
// BUILD PLANNING - src/plan/mod.rs
// Conflict detection and artifact planning over the scanned sources
// =============================================================================

//! Two pure computations sit between scanning and execution:
//!
//! * conflict detection - group sources by base name and refuse the run
//!   when any base name is claimed more than once, since the colliding
//!   object paths would silently overwrite each other;
//! * artifact planning - derive the object path for each source and the
//!   final target path, and flag which of those already exist on disk.
//!
//! Neither mutates the filesystem. The existence flags are a snapshot
//! and can go stale if something else writes to the directory between
//! planning and execution; that race is accepted, not guarded against.

use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Conflict};
use crate::scanner::SourceFile;

/// Target name used when the directory holds more than one source.
pub const DEFAULT_TARGET_NAME: &str = "a.out";

/// Extension given to assembled object files.
pub const OBJECT_EXTENSION: &str = "o";

/// Sources grouped by base name. Computed once, read-only afterward.
#[derive(Debug)]
pub struct ConflictSet {
    by_base: BTreeMap<String, Vec<PathBuf>>,
}

impl ConflictSet {
    pub fn build(sources: &[SourceFile]) -> Self {
        let mut by_base: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for source in sources {
            by_base
                .entry(source.base_name.clone())
                .or_default()
                .push(source.path.clone());
        }
        Self { by_base }
    }

    /// Every base name claimed by two or more sources.
    pub fn conflicts(&self) -> Vec<Conflict> {
        self.by_base
            .iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .map(|(base_name, paths)| Conflict {
                base_name: base_name.clone(),
                paths: paths.clone(),
            })
            .collect()
    }
}

/// Fail with [`BuildError::DuplicateBaseName`] if any base name is
/// claimed by more than one source. Reports all conflicts at once so
/// the operator can resolve them in a single pass.
pub fn detect_conflicts(sources: &[SourceFile]) -> Result<(), BuildError> {
    let conflicts = ConflictSet::build(sources).conflicts();
    if conflicts.is_empty() {
        debug!("no base-name conflicts among {} source(s)", sources.len());
        Ok(())
    } else {
        Err(BuildError::DuplicateBaseName { conflicts })
    }
}

/// The object file expected for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    pub path: PathBuf,
    /// Whether the path already existed when the plan was made.
    pub existed_before: bool,
}

/// The final linked executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub path: PathBuf,
    /// Whether the path already existed when the plan was made.
    pub existed_before: bool,
}

/// Fixed plan for one run: ordered sources, index-aligned objects, and
/// the target. Constructed once after conflict checking succeeds and
/// never mutated afterward.
#[derive(Debug)]
pub struct BuildPlan {
    pub sources: Vec<SourceFile>,
    pub objects: Vec<ObjectFile>,
    pub target: BuildTarget,
}

impl BuildPlan {
    /// Artifact paths that already existed on disk when the plan was
    /// made. Non-empty means the run will overwrite something.
    pub fn preexisting_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .objects
            .iter()
            .filter(|o| o.existed_before)
            .map(|o| o.path.clone())
            .collect();
        if self.target.existed_before {
            paths.push(self.target.path.clone());
        }
        paths
    }
}

/// Derive the build plan for the scanned sources.
///
/// Each object path is the source path with its extension replaced by
/// [`OBJECT_EXTENSION`], inside the same directory. The target is named
/// after the single source's base name when exactly one source exists,
/// otherwise [`DEFAULT_TARGET_NAME`].
///
/// Must be called with a non-empty, conflict-free source list.
pub fn plan_artifacts(dir: &Path, sources: Vec<SourceFile>) -> BuildPlan {
    debug_assert!(!sources.is_empty());

    let objects: Vec<ObjectFile> = sources
        .iter()
        .map(|source| {
            let path = source.path.with_extension(OBJECT_EXTENSION);
            ObjectFile {
                existed_before: path.exists(),
                path,
            }
        })
        .collect();

    let target_name = if sources.len() == 1 {
        sources[0].base_name.as_str()
    } else {
        DEFAULT_TARGET_NAME
    };
    let target_path = dir.join(target_name);
    let target = BuildTarget {
        existed_before: target_path.exists(),
        path: target_path,
    };

    debug!(
        "planned {} object(s), target {}",
        objects.len(),
        target.path.display()
    );
    BuildPlan {
        sources,
        objects,
        target,
    }
}
