// =============================================================================
// PIPELINE INTEGRATION TESTS - tests/pipeline.rs
// End-to-end runs against fake assembler/linker scripts
// =============================================================================

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use asmbuild::{AsmBuilder, BuildConfiguration, BuildError, BuildOutcome, OverwritePolicy};
use tempfile::TempDir;

/// Write an executable shell script into `dir`.
fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Fake assembler honoring the `assembler <source> -o <object>`
/// contract. Appends each invocation's source path to `log`.
fn fake_assembler(tools: &Path, log: &Path) -> PathBuf {
    write_tool(
        tools,
        "fake-as",
        &format!(
            "echo \"$1\" >> \"{log}\"\ncp \"$1\" \"$3\"\n",
            log = log.display()
        ),
    )
}

/// Fake linker honoring `linker -nostdlib -static <obj...> -o <target>`.
/// Concatenates the objects into the target (deterministic output) and
/// appends one line to `log` per invocation.
fn fake_linker(tools: &Path, log: &Path) -> PathBuf {
    write_tool(
        tools,
        "fake-ld",
        &format!(
            concat!(
                "out=\"\"\nprev=\"\"\n",
                "for a in \"$@\"; do\n",
                "  if [ \"$prev\" = \"-o\" ]; then out=\"$a\"; fi\n",
                "  prev=\"$a\"\n",
                "done\n",
                ": > \"$out\"\n",
                "skip=0\n",
                "for a in \"$@\"; do\n",
                "  if [ \"$skip\" = 1 ]; then skip=0; continue; fi\n",
                "  case \"$a\" in\n",
                "    -o) skip=1 ;;\n",
                "    -nostdlib|-static) ;;\n",
                "    *) cat \"$a\" >> \"$out\" ;;\n",
                "  esac\n",
                "done\n",
                "echo link >> \"{log}\"\n",
            ),
            log = log.display()
        ),
    )
}

struct Fixture {
    tools: TempDir,
    build: TempDir,
    assembler: PathBuf,
    linker: PathBuf,
    as_log: PathBuf,
    ld_log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tools = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let as_log = tools.path().join("as.log");
        let ld_log = tools.path().join("ld.log");
        let assembler = fake_assembler(tools.path(), &as_log);
        let linker = fake_linker(tools.path(), &ld_log);
        Self {
            tools,
            build,
            assembler,
            linker,
            as_log,
            ld_log,
        }
    }

    fn dir(&self) -> &Path {
        self.build.path()
    }

    fn source(&self, name: &str, body: &str) {
        fs::write(self.dir().join(name), body).unwrap();
    }

    fn config(&self, policy: OverwritePolicy) -> BuildConfiguration {
        BuildConfiguration {
            source_dir: self.dir().to_path_buf(),
            overwrite_policy: policy,
            assembler: self.assembler.display().to_string(),
            linker: self.linker.display().to_string(),
            tool_timeout: None,
        }
    }

    fn assembler_invocations(&self) -> usize {
        match fs::read_to_string(&self.as_log) {
            Ok(log) => log.lines().count(),
            Err(_) => 0,
        }
    }

    fn linker_invocations(&self) -> usize {
        match fs::read_to_string(&self.ld_log) {
            Ok(log) => log.lines().count(),
            Err(_) => 0,
        }
    }
}

#[tokio::test]
async fn empty_directory_is_a_successful_noop() {
    let fx = Fixture::new();
    let builder = AsmBuilder::new(fx.config(OverwritePolicy::ForceOverwrite));

    let outcome = builder.run().await.unwrap();
    assert!(matches!(outcome, BuildOutcome::NothingToBuild));
    assert_eq!(fx.assembler_invocations(), 0);
    assert_eq!(fx.linker_invocations(), 0);
    assert_eq!(fs::read_dir(fx.dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn duplicate_base_names_fail_with_no_side_effects() {
    let fx = Fixture::new();
    fx.source("foo.s", "gas flavor\n");
    fx.source("foo.asm", "nasm flavor\n");

    let builder = AsmBuilder::new(fx.config(OverwritePolicy::ForceOverwrite));
    let err = builder.run().await.unwrap_err();

    match err {
        BuildError::DuplicateBaseName { conflicts } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].base_name, "foo");
            assert_eq!(conflicts[0].paths.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.assembler_invocations(), 0);
    assert_eq!(fx.linker_invocations(), 0);
    assert!(!fx.dir().join("foo.o").exists());
}

#[tokio::test]
async fn single_source_target_is_named_after_the_source() {
    let fx = Fixture::new();
    fx.source("main.s", "mov\n");

    let builder = AsmBuilder::new(fx.config(OverwritePolicy::ForceOverwrite));
    let outcome = builder.run().await.unwrap();

    match outcome {
        BuildOutcome::Built(report) => {
            assert_eq!(report.target, fx.dir().join("main"));
            assert_eq!(report.objects_assembled, 1);
            assert_eq!(report.target_digest.len(), 64);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(fx.dir().join("main.o").exists());
    assert!(fx.dir().join("main").exists());
    assert_eq!(fx.linker_invocations(), 1);
}

#[tokio::test]
async fn multiple_sources_target_uses_the_default_name() {
    let fx = Fixture::new();
    fx.source("a.s", "one\n");
    fx.source("b.s", "two\n");

    let builder = AsmBuilder::new(fx.config(OverwritePolicy::ForceOverwrite));
    let outcome = builder.run().await.unwrap();

    match outcome {
        BuildOutcome::Built(report) => {
            assert_eq!(report.target, fx.dir().join("a.out"));
            assert_eq!(report.objects_assembled, 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Objects were linked in discovery order: a.s before b.s.
    assert_eq!(fs::read_to_string(fx.dir().join("a.out")).unwrap(), "one\ntwo\n");
}

#[tokio::test]
async fn assembly_failure_aborts_before_later_sources_and_link() {
    let fx = Fixture::new();
    fx.source("a.s", "ok\n");
    fx.source("b.s", "bad\n");
    fx.source("c.s", "never reached\n");

    // Assembler that fails on b.s but otherwise behaves.
    let failing = write_tool(
        fx.tools.path(),
        "failing-as",
        &format!(
            concat!(
                "echo \"$1\" >> \"{log}\"\n",
                "case \"$1\" in *b.s) exit 1 ;; esac\n",
                "cp \"$1\" \"$3\"\n",
            ),
            log = fx.as_log.display()
        ),
    );
    let mut config = fx.config(OverwritePolicy::ForceOverwrite);
    config.assembler = failing.display().to_string();

    let err = AsmBuilder::new(config).run().await.unwrap_err();
    match err {
        BuildError::AssemblyFailed { source, status } => {
            assert!(source.ends_with("b.s"));
            assert!(!status.success());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // First object remains, third was never attempted, no link happened.
    assert!(fx.dir().join("a.o").exists());
    assert!(!fx.dir().join("c.o").exists());
    assert_eq!(fx.assembler_invocations(), 2);
    assert_eq!(fx.linker_invocations(), 0);
}

#[tokio::test]
async fn rerun_with_force_overwrite_is_idempotent() {
    let fx = Fixture::new();
    fx.source("a.s", "one\n");
    fx.source("b.s", "two\n");

    let builder = AsmBuilder::new(fx.config(OverwritePolicy::ForceOverwrite));
    let first = builder.run().await.unwrap();
    let bytes_first = fs::read(fx.dir().join("a.out")).unwrap();

    let second = builder.run().await.unwrap();
    let bytes_second = fs::read(fx.dir().join("a.out")).unwrap();

    assert!(matches!(first, BuildOutcome::Built(_)));
    assert!(matches!(second, BuildOutcome::Built(_)));
    assert_eq!(bytes_first, bytes_second);
    assert_eq!(fx.linker_invocations(), 2);
}

#[tokio::test]
async fn abort_on_existing_fails_before_any_subprocess() {
    let fx = Fixture::new();
    fx.source("a.s", "one\n");
    fx.source("b.s", "two\n");
    fs::write(fx.dir().join("a.o"), b"stale object").unwrap();

    let builder = AsmBuilder::new(fx.config(OverwritePolicy::AbortOnExisting));
    let err = builder.run().await.unwrap_err();

    match err {
        BuildError::ExistingArtifacts { paths } => {
            assert_eq!(paths, vec![fx.dir().join("a.o")]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.assembler_invocations(), 0);
    assert_eq!(fx.linker_invocations(), 0);
    // The stale artifact is untouched.
    assert_eq!(fs::read(fx.dir().join("a.o")).unwrap(), b"stale object");
}

#[tokio::test]
async fn hung_tool_is_killed_when_a_timeout_is_configured() {
    let fx = Fixture::new();
    fx.source("slow.s", "zzz\n");

    let hung = write_tool(fx.tools.path(), "hung-as", "sleep 30\n");
    let mut config = fx.config(OverwritePolicy::ForceOverwrite);
    config.assembler = hung.display().to_string();
    config.tool_timeout = Some(Duration::from_millis(200));

    let err = AsmBuilder::new(config).run().await.unwrap_err();
    assert!(matches!(err, BuildError::ToolTimedOut { .. }));
    assert_eq!(fx.linker_invocations(), 0);
}

#[tokio::test]
async fn missing_directory_fails_the_scan() {
    let fx = Fixture::new();
    let mut config = fx.config(OverwritePolicy::ForceOverwrite);
    config.source_dir = fx.dir().join("does-not-exist");

    let err = AsmBuilder::new(config).run().await.unwrap_err();
    assert!(matches!(err, BuildError::DirectoryNotFound { .. }));
}

#[tokio::test]
async fn successful_tool_with_missing_output_is_a_contract_violation() {
    let fx = Fixture::new();
    fx.source("a.s", "one\n");

    // Assembler that exits 0 without writing the object.
    let liar = write_tool(fx.tools.path(), "liar-as", "exit 0\n");
    let mut config = fx.config(OverwritePolicy::ForceOverwrite);
    config.assembler = liar.display().to_string();

    let err = AsmBuilder::new(config).run().await.unwrap_err();
    assert!(matches!(err, BuildError::ToolOutputMissing { .. }));
    assert_eq!(fx.linker_invocations(), 0);
}
