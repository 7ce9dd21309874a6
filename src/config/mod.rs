// =============================================================================
// BUILD CONFIGURATION - src/config/mod.rs
// =============================================================================

//! Build configuration for one pipeline run.
//!
//! The configuration is assembled once (normally from command-line
//! arguments) and is read-only for the rest of the run. There is no
//! hidden side channel: the overwrite decision in particular is carried
//! here as an explicit policy variant, never inferred from a terminal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default external assembler command.
pub const DEFAULT_ASSEMBLER: &str = "as";

/// Default external linker command.
pub const DEFAULT_LINKER: &str = "ld";

/// Configuration for one build pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Directory scanned for assembly sources (non-recursive).
    pub source_dir: PathBuf,
    /// How to react to artifacts that already exist on disk.
    pub overwrite_policy: OverwritePolicy,
    /// External assembler command, invoked once per source.
    pub assembler: String,
    /// External linker command, invoked exactly once.
    pub linker: String,
    /// Optional per-invocation deadline for external tools. `None`
    /// imposes no timeout; a hung tool then hangs the pipeline.
    pub tool_timeout: Option<Duration>,
}

/// Reaction to pre-existing object files or target executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwritePolicy {
    /// Ask the operator on stdin before overwriting anything.
    Prompt,
    /// Overwrite flagged paths without asking.
    ForceOverwrite,
    /// Fail instead of prompting when anything would be overwritten.
    AbortOnExisting,
}

impl BuildConfiguration {
    /// Configuration with default tools, prompting policy, and no
    /// tool timeout.
    pub fn for_directory(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            overwrite_policy: OverwritePolicy::Prompt,
            assembler: DEFAULT_ASSEMBLER.to_string(),
            linker: DEFAULT_LINKER.to_string(),
            tool_timeout: None,
        }
    }
}
