// =============================================================================
// ASMBUILD - src/lib.rs
// Assembly build orchestration pipeline
// =============================================================================

//! asmbuild turns a directory of assembly sources into a single linked
//! executable: discover eligible sources, refuse ambiguous base names,
//! assemble each source with the external assembler, link the objects
//! with the external linker, and report the result.
//!
//! The pipeline is strictly sequential with no branching back:
//!
//! ```text
//! Scanning -> ConflictChecking -> Planning -> (OverwriteConfirm)
//!          -> Assembling -> Linking -> Done
//! ```
//!
//! Any stage can fail, which terminates the run; there is no resumption
//! from a failure - a retry re-invokes the whole pipeline from the scan.
//! A run either produces the complete object set plus the linked target,
//! or stops early claiming no partial success (partial artifacts may
//! still be on disk, by design, for the operator to inspect).

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

// Module declarations for pipeline components
pub mod config;
pub mod error;
pub mod guard;
pub mod plan;
pub mod scanner;
pub mod stages;
pub mod verify;

// Public pipeline interface exports
pub use crate::config::{BuildConfiguration, OverwritePolicy, DEFAULT_ASSEMBLER, DEFAULT_LINKER};
pub use crate::error::{BuildError, Conflict};
pub use crate::guard::OverwriteGuard;
pub use crate::plan::{BuildPlan, BuildTarget, ConflictSet, ObjectFile, DEFAULT_TARGET_NAME};
pub use crate::scanner::{SourceFile, SOURCE_EXTENSIONS};
pub use crate::stages::{AssembleStage, LinkStage, LINKER_FLAGS};

/// Pipeline stages, in execution order. `Done` is terminal; failure at
/// any stage is the other terminal and carries its reason as a
/// [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Scanning,
    ConflictChecking,
    Planning,
    OverwriteConfirm,
    Assembling,
    Linking,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Scanning => "scanning",
            PipelineStage::ConflictChecking => "conflict checking",
            PipelineStage::Planning => "planning",
            PipelineStage::OverwriteConfirm => "overwrite confirmation",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Linking => "linking",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The directory held no eligible sources. A legitimate no-op, not
    /// a failure; nothing was written.
    NothingToBuild,
    /// All sources assembled and linked.
    Built(BuildReport),
}

/// Report for a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// Path of the linked executable.
    pub target: PathBuf,
    /// Number of object files produced.
    pub objects_assembled: usize,
    /// SHA-256 of the linked executable, lowercase hex.
    pub target_digest: String,
    /// When the build finished.
    pub build_time: DateTime<Utc>,
}

/// Pipeline coordinator. Holds the immutable configuration for one run
/// and threads a single fixed [`BuildPlan`] through the stages; each
/// stage returns a typed result instead of mutating shared state.
#[derive(Debug)]
pub struct AsmBuilder {
    config: BuildConfiguration,
}

impl AsmBuilder {
    pub fn new(config: BuildConfiguration) -> Self {
        Self { config }
    }

    /// Execute the whole pipeline once.
    pub async fn run(&self) -> Result<BuildOutcome, BuildError> {
        let dir = &self.config.source_dir;

        // Stage 1: discover eligible sources
        self.enter(PipelineStage::Scanning);
        let sources = scanner::scan_sources(dir)?;
        if sources.is_empty() {
            info!("no assembly sources in {}, nothing to build", dir.display());
            return Ok(BuildOutcome::NothingToBuild);
        }

        // Stage 2: refuse ambiguous base names before any side effect
        self.enter(PipelineStage::ConflictChecking);
        plan::detect_conflicts(&sources)?;

        // Stage 3: fix object paths and the target path for the run
        self.enter(PipelineStage::Planning);
        let build_plan = plan::plan_artifacts(dir, sources);

        // Stage 4: gate on pre-existing artifacts
        self.enter(PipelineStage::OverwriteConfirm);
        OverwriteGuard::new(self.config.overwrite_policy).confirm(&build_plan)?;

        // Stage 5: assemble each source, aborting on the first failure
        self.enter(PipelineStage::Assembling);
        AssembleStage::new(&self.config).run(&build_plan).await?;

        // Stage 6: one link invocation over the full object set
        self.enter(PipelineStage::Linking);
        LinkStage::new(&self.config).run(&build_plan).await?;
        let target_digest = verify::digest_target(&build_plan.target.path).await?;

        self.enter(PipelineStage::Done);
        Ok(BuildOutcome::Built(BuildReport {
            target: build_plan.target.path.clone(),
            objects_assembled: build_plan.objects.len(),
            target_digest,
            build_time: Utc::now(),
        }))
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("pipeline stage: {stage}");
    }
}
