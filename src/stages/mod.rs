// =============================================================================
// EXECUTION STAGES - src/stages/mod.rs
// External assembler and linker invocation
// =============================================================================

//! The two stages that actually touch the filesystem. Both treat their
//! external tool as opaque: success means "exit status zero and the
//! output file exists", anything else is failure.
//!
//! Failure policy, in both stages: abort the run on the first failure
//! and leave whatever was already written on disk. Partial artifacts are
//! deliberately not cleaned up so the operator can inspect them; a
//! re-run overwrites them.

use log::{debug, error, info};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::BuildConfiguration;
use crate::error::BuildError;
use crate::plan::BuildPlan;

/// Fixed linker flag set: freestanding, statically linked output.
pub const LINKER_FLAGS: &[&str] = &["-nostdlib", "-static"];

/// Runs the external assembler once per source, in plan order.
#[derive(Debug)]
pub struct AssembleStage {
    assembler: String,
    tool_timeout: Option<Duration>,
}

impl AssembleStage {
    pub fn new(config: &BuildConfiguration) -> Self {
        Self {
            assembler: config.assembler.clone(),
            tool_timeout: config.tool_timeout,
        }
    }

    /// Assemble every source in the plan. The first non-zero exit
    /// status aborts the stage; remaining sources are never attempted
    /// and earlier objects stay on disk.
    pub async fn run(&self, plan: &BuildPlan) -> Result<(), BuildError> {
        for (source, object) in plan.sources.iter().zip(&plan.objects) {
            debug!(
                "assembling {} -> {}",
                source.path.display(),
                object.path.display()
            );
            let mut command = Command::new(&self.assembler);
            command.arg(&source.path).arg("-o").arg(&object.path);

            let status = run_tool(&self.assembler, command, self.tool_timeout).await?;
            if !status.success() {
                error!("assembler failed on {}", source.path.display());
                return Err(BuildError::AssemblyFailed {
                    source: source.path.clone(),
                    status,
                });
            }
            if !object.path.exists() {
                return Err(BuildError::ToolOutputMissing {
                    tool: self.assembler.clone(),
                    path: object.path.clone(),
                });
            }
        }
        info!("assembled {} object(s)", plan.objects.len());
        Ok(())
    }
}

/// Runs the external linker exactly once over the full object set.
#[derive(Debug)]
pub struct LinkStage {
    linker: String,
    tool_timeout: Option<Duration>,
}

impl LinkStage {
    pub fn new(config: &BuildConfiguration) -> Self {
        Self {
            linker: config.linker.clone(),
            tool_timeout: config.tool_timeout,
        }
    }

    /// Link all objects into the target. No retry; a partially written
    /// target from a failed link is left as-is.
    pub async fn run(&self, plan: &BuildPlan) -> Result<(), BuildError> {
        debug!(
            "linking {} object(s) -> {}",
            plan.objects.len(),
            plan.target.path.display()
        );
        let mut command = Command::new(&self.linker);
        command.args(LINKER_FLAGS);
        for object in &plan.objects {
            command.arg(&object.path);
        }
        command.arg("-o").arg(&plan.target.path);

        let status = run_tool(&self.linker, command, self.tool_timeout).await?;
        if !status.success() {
            error!("linker failed for {}", plan.target.path.display());
            return Err(BuildError::LinkFailed { status });
        }
        if !plan.target.path.exists() {
            return Err(BuildError::ToolOutputMissing {
                tool: self.linker.clone(),
                path: plan.target.path.clone(),
            });
        }
        info!("linked {}", plan.target.path.display());
        Ok(())
    }
}

/// Spawn one external tool and wait for it, honoring the optional
/// deadline. On expiry the child is killed and the run fails; the tool
/// may still have written partial output.
async fn run_tool(
    tool: &str,
    mut command: Command,
    deadline: Option<Duration>,
) -> Result<ExitStatus, BuildError> {
    let mut child = command.spawn().map_err(|source| BuildError::ToolLaunch {
        tool: tool.to_string(),
        source,
    })?;

    match deadline {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(BuildError::ToolTimedOut {
                    tool: tool.to_string(),
                    limit,
                })
            }
        },
        None => Ok(child.wait().await?),
    }
}
