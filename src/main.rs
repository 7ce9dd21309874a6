// =============================================================================
// ASMBUILD CLI - src/main.rs
// Command-line interface for the assembly build pipeline
// =============================================================================

//! Command-line front end. Parses arguments, initializes logging,
//! converts the arguments into a [`BuildConfiguration`], runs the
//! pipeline, and reports the outcome. Exit code 0 covers both a
//! successful build and the empty-directory no-op; every failure exits
//! with code 1.

use anyhow::Result as AnyhowResult;
use clap::Parser;
use env_logger::Builder as LogBuilder;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use asmbuild::{
    AsmBuilder, BuildConfiguration, BuildOutcome, BuildReport, OverwritePolicy,
    DEFAULT_ASSEMBLER, DEFAULT_LINKER,
};

/// Command-line arguments for the build pipeline.
#[derive(Parser, Debug)]
#[command(name = "asmbuild")]
#[command(about = "Assemble and link a directory of assembly sources")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct BuilderArgs {
    /// Directory containing the assembly sources (.s, .as, .asm)
    directory: PathBuf,

    /// Overwrite pre-existing artifacts without prompting
    #[arg(long, conflicts_with = "abort_on_existing")]
    force: bool,

    /// Fail instead of prompting when artifacts already exist
    #[arg(long)]
    abort_on_existing: bool,

    /// External assembler command
    #[arg(long, default_value = DEFAULT_ASSEMBLER)]
    assembler: String,

    /// External linker command
    #[arg(long, default_value = DEFAULT_LINKER)]
    linker: String,

    /// Kill an assembler/linker invocation after this many seconds
    #[arg(long, value_name = "SECS")]
    tool_timeout: Option<u64>,

    /// Verbose logging output
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let args = parse_args();

    initialize_logging(args.verbose);
    info!("asmbuild {} starting", env!("CARGO_PKG_VERSION"));

    let build_config = create_build_configuration(&args);
    let builder = AsmBuilder::new(build_config);

    match builder.run().await? {
        BuildOutcome::NothingToBuild => {
            info!("nothing to build in {}", args.directory.display());
        }
        BuildOutcome::Built(report) => {
            display_build_report(&report);
        }
    }

    Ok(())
}

/// Parse arguments, mapping usage errors to exit code 1. Help and
/// version output still exit 0.
fn parse_args() -> BuilderArgs {
    match BuilderArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    }
}

/// Initialize logging based on verbosity level.
fn initialize_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    LogBuilder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();
}

/// Convert command-line arguments to a build configuration.
fn create_build_configuration(args: &BuilderArgs) -> BuildConfiguration {
    let overwrite_policy = if args.force {
        OverwritePolicy::ForceOverwrite
    } else if args.abort_on_existing {
        OverwritePolicy::AbortOnExisting
    } else {
        OverwritePolicy::Prompt
    };

    BuildConfiguration {
        source_dir: args.directory.clone(),
        overwrite_policy,
        assembler: args.assembler.clone(),
        linker: args.linker.clone(),
        tool_timeout: args.tool_timeout.map(Duration::from_secs),
    }
}

/// Display the report for a successful build.
fn display_build_report(report: &BuildReport) {
    info!("build successful");
    info!("  Target: {}", report.target.display());
    info!("  Objects: {}", report.objects_assembled);
    info!("  SHA-256: {}", report.target_digest);
    info!(
        "  Build Time: {}",
        report.build_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
