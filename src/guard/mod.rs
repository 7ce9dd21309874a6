// =============================================================================
// OVERWRITE GUARD - src/guard/mod.rs
// Confirmation gate for pre-existing build artifacts
// =============================================================================

//! When the planner flagged artifacts that already exist on disk, the
//! pipeline blocks here until the run is explicitly authorized to
//! overwrite them. The decision comes from the configured
//! [`OverwritePolicy`]; only the `Prompt` variant touches the terminal.
//!
//! The guard is advisory: it takes no locks and no snapshots, so a
//! concurrent process can still race with the later stages.

use log::{debug, warn};
use std::io::{self, BufRead, Write};

use crate::config::OverwritePolicy;
use crate::error::BuildError;
use crate::plan::BuildPlan;

/// Gate between planning and assembly.
#[derive(Debug)]
pub struct OverwriteGuard {
    policy: OverwritePolicy,
}

impl OverwriteGuard {
    pub fn new(policy: OverwritePolicy) -> Self {
        Self { policy }
    }

    /// Authorize (or refuse) overwriting the plan's pre-existing
    /// artifacts. Skipped silently when nothing would be overwritten.
    pub fn confirm(&self, plan: &BuildPlan) -> Result<(), BuildError> {
        let existing = plan.preexisting_paths();
        if existing.is_empty() {
            debug!("no pre-existing artifacts, skipping overwrite confirmation");
            return Ok(());
        }

        for path in &existing {
            warn!("will overwrite {}", path.display());
        }

        match self.policy {
            OverwritePolicy::ForceOverwrite => Ok(()),
            OverwritePolicy::AbortOnExisting => {
                Err(BuildError::ExistingArtifacts { paths: existing })
            }
            OverwritePolicy::Prompt => {
                let stdin = io::stdin();
                let answer = prompt_operator(&mut stdin.lock(), &mut io::stderr())?;
                if answer {
                    Ok(())
                } else {
                    Err(BuildError::OverwriteDeclined)
                }
            }
        }
    }
}

/// Blocking yes/continue prompt. Accepts `y`/`yes` (case-insensitive);
/// anything else, including end of input, declines.
fn prompt_operator<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    write!(output, "overwrite the files listed above? [y/N] ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
