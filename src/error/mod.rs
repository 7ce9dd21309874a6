// =============================================================================
// ERROR TYPES - src/error/mod.rs
// Failure taxonomy for the build pipeline
// =============================================================================

//! Every stage of the pipeline reports failure through [`BuildError`].
//! All variants are terminal for the run: nothing is retried and no
//! fallback tool is substituted. A retry means re-invoking the whole
//! pipeline from the scan.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// A group of source files claiming the same base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub base_name: String,
    pub paths: Vec<PathBuf>,
}

/// Build pipeline error taxonomy.
///
/// `Display`, `Error`, and `From<std::io::Error>` are implemented by hand
/// rather than via `#[derive(thiserror::Error)]`: thiserror unconditionally
/// treats a field named `source` as the error source, but
/// `AssemblyFailed::source` is the offending *file path*, not a cause.
#[derive(Debug)]
pub enum BuildError {
    /// The requested source directory does not exist.
    DirectoryNotFound { path: PathBuf },

    /// The requested source path exists but is not a directory.
    NotADirectory { path: PathBuf },

    /// Two or more sources share a base name. Reports every conflicting
    /// base name with the full set of claimants so the operator can
    /// resolve all of them in one pass.
    DuplicateBaseName { conflicts: Vec<Conflict> },

    /// Pre-existing artifacts found while the overwrite policy forbids
    /// overwriting.
    ExistingArtifacts { paths: Vec<PathBuf> },

    /// The operator declined the interactive overwrite confirmation.
    OverwriteDeclined,

    /// The assembler exited with a non-zero status for one source.
    AssemblyFailed { source: PathBuf, status: ExitStatus },

    /// The linker exited with a non-zero status.
    LinkFailed { status: ExitStatus },

    /// An external tool reported success but its output file is missing.
    ToolOutputMissing { tool: String, path: PathBuf },

    /// An external tool could not be spawned at all.
    ToolLaunch {
        tool: String,
        source: std::io::Error,
    },

    /// An external tool exceeded the configured deadline and was killed.
    ToolTimedOut { tool: String, limit: Duration },

    /// Filesystem error outside the external tool contract.
    Io(std::io::Error),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DirectoryNotFound { path } => {
                write!(f, "source directory {} does not exist", path.display())
            }
            BuildError::NotADirectory { path } => {
                write!(f, "{} is not a directory", path.display())
            }
            BuildError::DuplicateBaseName { conflicts } => {
                write!(f, "{}", render_conflicts(conflicts))
            }
            BuildError::ExistingArtifacts { paths } => write!(
                f,
                "refusing to overwrite existing artifacts: {}",
                render_paths(paths)
            ),
            BuildError::OverwriteDeclined => {
                write!(f, "build cancelled: overwrite not confirmed")
            }
            BuildError::AssemblyFailed { source, status } => {
                write!(f, "assembler failed on {} ({status})", source.display())
            }
            BuildError::LinkFailed { status } => write!(f, "linker failed ({status})"),
            BuildError::ToolOutputMissing { tool, path } => write!(
                f,
                "{tool} exited successfully but did not produce {}",
                path.display()
            ),
            BuildError::ToolLaunch { tool, source } => {
                write!(f, "failed to launch {tool}: {source}")
            }
            BuildError::ToolTimedOut { tool, limit } => {
                write!(f, "{tool} did not finish within {}s", limit.as_secs())
            }
            BuildError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::ToolLaunch { source, .. } => Some(source),
            BuildError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::Io(err)
    }
}

fn render_conflicts(conflicts: &[Conflict]) -> String {
    let mut out = String::from("duplicate base names among sources; rename or remove:");
    for conflict in conflicts {
        out.push_str(&format!("\n  {}:", conflict.base_name));
        for path in &conflict.paths {
            out.push_str(&format!("\n    {}", path.display()));
        }
    }
    out
}

fn render_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
