//! Test execution engine.
//!
//! Runs one test file through parse, optional skip check, execution and
//! comparison, and manages the artifacts written next to the test file.

use crate::diff::DiffEngine;
use crate::error::{FormatError, HarnessError};
use crate::executor::ScriptExecutor;
use crate::pattern::{self, ExpectPattern};
use crate::section::{self, Expectation, TestDefinition};
use crate::settings::ExecutionSettings;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Suffix of the captured-output artifact.
pub const OUT_SUFFIX: &str = "out";
/// Suffix of the diff artifact.
pub const DIFF_SUFFIX: &str = "diff";
/// Suffix of the transient skip-check script.
pub const SKIP_SUFFIX: &str = "skip";

/// Outcome classification of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        })
    }
}

/// What happened when a test ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestOutcome {
    Pass {
        name: String,
    },
    Fail {
        name: String,
        /// Delta between expected and actual output.
        diff: String,
        /// Output of the script exactly as captured.
        output: String,
    },
    Skip {
        name: String,
        /// Trimmed output of the skip check.
        reason: String,
    },
}

impl TestOutcome {
    pub fn name(&self) -> &str {
        match self {
            TestOutcome::Pass { name }
            | TestOutcome::Fail { name, .. }
            | TestOutcome::Skip { name, .. } => name,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            TestOutcome::Pass { .. } => Status::Pass,
            TestOutcome::Fail { .. } => Status::Fail,
            TestOutcome::Skip { .. } => Status::Skip,
        }
    }
}

/// Result of running a single test file.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub file: PathBuf,
    #[serde(flatten)]
    pub outcome: TestOutcome,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Paths of the files written next to a test file `<name>.phpt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Executed FILE script (`<name>.phpt.php`).
    pub script: PathBuf,
    /// Captured output (`<name>.phpt.out`).
    pub out: PathBuf,
    /// Diff on failure (`<name>.phpt.diff`).
    pub diff: PathBuf,
    /// Skip-check script (`<name>.phpt.skip`).
    pub skip: PathBuf,
}

impl Artifacts {
    pub fn for_test(path: &Path, script_extension: &str) -> Self {
        Self {
            script: with_suffix(path, script_extension),
            out: with_suffix(path, OUT_SUFFIX),
            diff: with_suffix(path, DIFF_SUFFIX),
            skip: with_suffix(path, SKIP_SUFFIX),
        }
    }

    fn all(&self) -> [&Path; 4] {
        [&self.script, &self.out, &self.diff, &self.skip]
    }

    /// Delete whatever a previous run of the same file left behind.
    fn remove_stale(&self) -> Result<(), HarnessError> {
        for path in self.all() {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed stale artifact"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(HarnessError::io(path, e)),
            }
        }
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// A file written for the duration of a scope.
///
/// The file is removed when the guard drops unless [`ArtifactGuard::retain`]
/// was called, so early returns and errors cannot leak it.
struct ArtifactGuard {
    path: PathBuf,
    keep: bool,
}

impl ArtifactGuard {
    fn write(path: &Path, contents: &str) -> Result<Self, HarnessError> {
        fs::write(path, contents).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            keep: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn retain(mut self) {
        self.keep = true;
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove artifact");
        }
    }
}

/// Convert CRLF to LF and trim surrounding whitespace.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Parse a test file and check its INI and EXPECTF sections without running
/// anything.
pub fn validate(content: &str) -> Result<TestDefinition, FormatError> {
    let definition = section::parse(content)?;
    if let Some(ini) = definition.ini() {
        ExecutionSettings::parse_ini(ini)?;
    }
    if let Expectation::Pattern(text) = definition.expectation() {
        ExpectPattern::compile(&normalize(text))?;
    }
    Ok(definition)
}

/// Runs test files with a given executor and diff engine.
pub struct TestRunner<'a> {
    executor: &'a dyn ScriptExecutor,
    differ: &'a dyn DiffEngine,
    defaults: ExecutionSettings,
    script_extension: String,
}

impl<'a> TestRunner<'a> {
    pub fn new(
        executor: &'a dyn ScriptExecutor,
        differ: &'a dyn DiffEngine,
        defaults: ExecutionSettings,
    ) -> Self {
        Self {
            executor,
            differ,
            defaults,
            script_extension: "php".to_string(),
        }
    }

    pub fn with_script_extension(mut self, extension: impl Into<String>) -> Self {
        self.script_extension = extension.into();
        self
    }

    /// Run the test file at `path`.
    ///
    /// A malformed file is an `Err`, never a failed test.
    pub fn run_file(&self, path: &Path) -> Result<TestReport, HarnessError> {
        let start = Instant::now();
        let content = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let outcome = self.run_content(path, &content)?;
        info!(
            file = %path.display(),
            status = %outcome.status(),
            name = outcome.name(),
            "test finished"
        );
        Ok(TestReport {
            file: path.to_path_buf(),
            outcome,
            duration: start.elapsed(),
        })
    }

    fn run_content(&self, path: &Path, content: &str) -> Result<TestOutcome, HarnessError> {
        let format_error = |source: FormatError| HarnessError::Format {
            path: path.to_path_buf(),
            source,
        };

        let artifacts = Artifacts::for_test(path, &self.script_extension);
        artifacts.remove_stale()?;

        debug!(file = %path.display(), "parsing");
        let definition = section::parse(content).map_err(format_error)?;
        let overrides = definition
            .ini()
            .map(ExecutionSettings::parse_ini)
            .transpose()
            .map_err(format_error)?
            .unwrap_or_default();
        let expected = match definition.expectation() {
            Expectation::Literal(text) => Expected::Literal(normalize(text)),
            Expectation::Pattern(text) => {
                let text = normalize(text);
                let pattern = ExpectPattern::compile(&text).map_err(format_error)?;
                Expected::Pattern(text, pattern)
            }
        };
        let name = definition.name().to_string();

        if let Some(skip_script) = definition.skip_check() {
            debug!(file = %path.display(), "running skip check");
            let reason = {
                let guard = ArtifactGuard::write(&artifacts.skip, skip_script)?;
                self.executor.execute(guard.path(), &self.defaults)?
            };
            let reason = reason.trim();
            if !reason.is_empty() {
                return Ok(TestOutcome::Skip {
                    name,
                    reason: reason.to_string(),
                });
            }
        }

        if !overrides.is_empty() {
            debug!(file = %path.display(), overrides = overrides.len(), "applying INI settings");
        }
        let settings = self.defaults.merged(&overrides);
        debug!(file = %path.display(), settings = settings.len(), "executing");
        let script = ArtifactGuard::write(&artifacts.script, definition.script())?;
        let raw = self.executor.execute(script.path(), &settings)?;

        fs::write(&artifacts.out, &raw).map_err(|e| HarnessError::io(&artifacts.out, e))?;
        let actual = normalize(&raw);

        let (matched, expected_text) = match &expected {
            Expected::Literal(text) => (*text == actual, text.clone()),
            Expected::Pattern(text, matcher) => (
                matcher.is_match(&actual),
                pattern::resolve_lines(text, &actual),
            ),
        };

        if matched {
            drop(script);
            return Ok(TestOutcome::Pass { name });
        }

        // Failing tests keep their script for inspection.
        script.retain();
        let diff = self.differ.diff(&expected_text, &actual);
        fs::write(&artifacts.diff, &diff).map_err(|e| HarnessError::io(&artifacts.diff, e))?;

        Ok(TestOutcome::Fail {
            name,
            diff,
            output: raw,
        })
    }
}

enum Expected {
    Literal(String),
    Pattern(String, ExpectPattern),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::LineDiff;
    use crate::error::ExecutionFailure;
    use std::cell::RefCell;
    use tempfile::{TempDir, tempdir};

    struct Call {
        source: String,
        settings: ExecutionSettings,
    }

    /// Answers every execution with `respond(source)` and records the call.
    struct FakeExecutor<F> {
        respond: F,
        calls: RefCell<Vec<Call>>,
    }

    impl<F: Fn(&str) -> String> FakeExecutor<F> {
        fn new(respond: F) -> Self {
            Self {
                respond,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl<F: Fn(&str) -> String> ScriptExecutor for FakeExecutor<F> {
        fn execute(
            &self,
            script: &Path,
            settings: &ExecutionSettings,
        ) -> Result<String, ExecutionFailure> {
            let source = fs::read_to_string(script).map_err(ExecutionFailure::Capture)?;
            let output = (self.respond)(&source);
            self.calls.borrow_mut().push(Call {
                source,
                settings: settings.clone(),
            });
            Ok(output)
        }
    }

    struct BrokenExecutor;

    impl ScriptExecutor for BrokenExecutor {
        fn execute(&self, _: &Path, _: &ExecutionSettings) -> Result<String, ExecutionFailure> {
            Err(ExecutionFailure::Spawn {
                program: "php".to_string(),
                source: std::io::Error::new(ErrorKind::NotFound, "not found"),
            })
        }
    }

    /// Pretend interpreter: `print(1+1)` prints 2, `echo X` prints X.
    fn interpret(source: &str) -> String {
        source
            .lines()
            .map(|line| match line.trim() {
                "print(1+1)" => "2".to_string(),
                l => l.strip_prefix("echo ").unwrap_or("").to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_test(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn defaults() -> ExecutionSettings {
        [("max_execution_time", "60"), ("display_errors", "1")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_artifact_paths() {
        let artifacts = Artifacts::for_test(Path::new("t/a.phpt"), "php");
        assert_eq!(artifacts.script, PathBuf::from("t/a.phpt.php"));
        assert_eq!(artifacts.out, PathBuf::from("t/a.phpt.out"));
        assert_eq!(artifacts.diff, PathBuf::from("t/a.phpt.diff"));
        assert_eq!(artifacts.skip, PathBuf::from("t/a.phpt.skip"));
    }

    #[test]
    fn test_normalize_line_endings_and_trim() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb");
        assert_eq!(normalize("\n  x \n"), "x");
    }

    #[test]
    fn test_passing_test_removes_script() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "add.phpt",
            "--TEST--\nadds numbers\n--FILE--\nprint(1+1)\n--EXPECT--\n2\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(
            report.outcome,
            TestOutcome::Pass {
                name: "adds numbers".to_string()
            }
        );

        let artifacts = Artifacts::for_test(&path, "php");
        assert!(!artifacts.script.exists());
        assert!(!artifacts.diff.exists());
        assert_eq!(fs::read_to_string(&artifacts.out).unwrap(), "2");
    }

    #[test]
    fn test_failing_test_keeps_script_and_writes_diff() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "add.phpt",
            "--TEST--\nadds numbers\n--FILE--\nprint(1+1)\n--EXPECT--\n3\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        let TestOutcome::Fail { name, diff, output } = report.outcome else {
            panic!("expected failure, got {:?}", report.outcome);
        };
        assert_eq!(name, "adds numbers");
        assert_eq!(output, "2");
        assert!(diff.contains("- 3"), "diff was: {diff}");
        assert!(diff.contains("+ 2"), "diff was: {diff}");

        let artifacts = Artifacts::for_test(&path, "php");
        assert_eq!(fs::read_to_string(&artifacts.script).unwrap(), "print(1+1)\n");
        assert_eq!(fs::read_to_string(&artifacts.diff).unwrap(), diff);
        assert_eq!(fs::read_to_string(&artifacts.out).unwrap(), "2");
    }

    #[test]
    fn test_expectf_matches_digits() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "count.phpt",
            "--TEST--\ncount\n--FILE--\necho Count: 17\n--EXPECTF--\nCount: %d\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(report.outcome.status(), Status::Pass);
    }

    #[test]
    fn test_expectf_rejects_missing_digits() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "count.phpt",
            "--TEST--\ncount\n--FILE--\necho Count: \n--EXPECTF--\nCount: %d\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(report.outcome.status(), Status::Fail);
        assert!(Artifacts::for_test(&path, "php").diff.exists());
    }

    #[test]
    fn test_expectf_diff_hides_matching_lines() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "lines.phpt",
            "--TEST--\nlines\n--FILE--\necho id 42\necho oops\n--EXPECTF--\nid %d\nfine\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        let TestOutcome::Fail { diff, .. } = report.outcome else {
            panic!("expected failure");
        };
        assert!(!diff.contains("id"), "diff was: {diff}");
        assert!(diff.contains("002- fine"), "diff was: {diff}");
        assert!(diff.contains("002+ oops"), "diff was: {diff}");
    }

    #[test]
    fn test_crlf_output_matches_lf_expectation() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "crlf.phpt",
            "--TEST--\ncrlf\r\n--FILE--\nanything\n--EXPECT--\r\na\r\nb\r\n",
        );
        let executor = FakeExecutor::new(|_: &str| "a\r\nb\r\n".to_string());
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(report.outcome.status(), Status::Pass);
        assert_eq!(report.outcome.name(), "crlf");
    }

    #[test]
    fn test_failure_reports_raw_output() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "raw.phpt",
            "--TEST--
raw
--FILE--
anything
--EXPECT--
c
",
        );
        let executor = FakeExecutor::new(|_: &str| "  a\r\nb\r\n".to_string());
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        let TestOutcome::Fail { diff, output, .. } = report.outcome else {
            panic!("expected failure, got {:?}", report.outcome);
        };
        assert_eq!(output, "  a\r\nb\r\n");
        assert!(diff.contains("+ a"), "diff was: {diff}");
        assert!(!diff.contains('\r'), "diff was: {diff}");

        let artifacts = Artifacts::for_test(&path, "php");
        assert_eq!(fs::read_to_string(&artifacts.out).unwrap(), "  a\r\nb\r\n");
    }

    #[test]
    fn test_skipif_output_skips_without_running_file() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "skip.phpt",
            "--TEST--\nskipped\n--SKIPIF--\necho missing feature\n--FILE--\necho ran\n--EXPECT--\nran\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(
            report.outcome,
            TestOutcome::Skip {
                name: "skipped".to_string(),
                reason: "missing feature".to_string()
            }
        );
        assert_eq!(executor.count(), 1);
        assert_eq!(executor.calls.borrow()[0].source, "echo missing feature\n");

        let artifacts = Artifacts::for_test(&path, "php");
        assert!(!artifacts.skip.exists());
        assert!(!artifacts.script.exists());
        assert!(!artifacts.out.exists());
    }

    #[test]
    fn test_empty_skipif_output_runs_file() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "noskip.phpt",
            "--TEST--\nnot skipped\n--SKIPIF--\nnothing to say\n--FILE--\necho ran\n--EXPECT--\nran\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let report = runner.run_file(&path).unwrap();
        assert_eq!(report.outcome.status(), Status::Pass);
        assert_eq!(executor.count(), 2);
        assert!(!Artifacts::for_test(&path, "php").skip.exists());
    }

    #[test]
    fn test_skip_check_uses_defaults_and_file_uses_ini() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "ini.phpt",
            "--TEST--\nini\n--SKIPIF--\n--INI--\nmax_execution_time=5\nprecision=14\n--FILE--\necho ok\n--EXPECT--\nok\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        runner.run_file(&path).unwrap();
        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].settings, defaults());

        let main = &calls[1].settings;
        assert_eq!(main.get("max_execution_time"), Some("5"));
        assert_eq!(main.get("precision"), Some("14"));
        assert_eq!(main.get("display_errors"), Some("1"));
    }

    #[test]
    fn test_stale_artifacts_are_removed_first() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "stale.phpt",
            "--TEST--\nstale\n--FILE--\necho ok\n--EXPECT--\nok\n",
        );
        let artifacts = Artifacts::for_test(&path, "php");
        for stale in artifacts.all() {
            fs::write(stale, "left over").unwrap();
        }

        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());
        runner.run_file(&path).unwrap();

        assert!(!artifacts.script.exists());
        assert!(!artifacts.diff.exists());
        assert!(!artifacts.skip.exists());
        assert_eq!(fs::read_to_string(&artifacts.out).unwrap(), "ok");
    }

    #[test]
    fn test_stale_diff_removed_when_test_is_skipped() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "s.phpt",
            "--TEST--\ns\n--SKIPIF--\necho later\n--FILE--\necho x\n--EXPECT--\nx\n",
        );
        let artifacts = Artifacts::for_test(&path, "php");
        fs::write(&artifacts.diff, "old").unwrap();

        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());
        runner.run_file(&path).unwrap();
        assert!(!artifacts.diff.exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "again.phpt",
            "--TEST--\nagain\n--FILE--\nprint(1+1)\n--EXPECT--\n3\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let first = runner.run_file(&path).unwrap();
        let second = runner.run_file(&path).unwrap();
        assert_eq!(first.outcome, second.outcome);

        let artifacts = Artifacts::for_test(&path, "php");
        assert_eq!(fs::read_to_string(&artifacts.script).unwrap(), "print(1+1)\n");
    }

    #[test]
    fn test_format_error_is_not_a_failure() {
        let dir = tempdir().unwrap();
        let path = write_test(&dir, "bad.phpt", "--TEST--\nt\n--BOGUS--\nx\n");
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let err = runner.run_file(&path).unwrap_err();
        assert!(err.is_format());
        assert!(matches!(
            err,
            HarnessError::Format {
                source: FormatError::UnknownSection { line: 3, .. },
                ..
            }
        ));
        assert_eq!(executor.count(), 0);
        assert!(!Artifacts::for_test(&path, "php").out.exists());
    }

    #[test]
    fn test_malformed_rerun_removes_previous_artifacts() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "edit.phpt",
            "--TEST--
edit
--FILE--
print(1+1)
--EXPECT--
3
",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let first = runner.run_file(&path).unwrap();
        assert_eq!(first.outcome.status(), Status::Fail);
        let artifacts = Artifacts::for_test(&path, "php");
        assert!(artifacts.script.exists());
        assert!(artifacts.diff.exists());
        assert!(artifacts.out.exists());
        fs::write(&artifacts.skip, "left over").unwrap();

        fs::write(&path, "--TEST--
edit
--BOGUS--
x
").unwrap();
        let err = runner.run_file(&path).unwrap_err();
        assert!(err.is_format());
        for stale in artifacts.all() {
            assert!(!stale.exists(), "{} survived", stale.display());
        }
    }

    #[test]
    fn test_invalid_ini_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "ini.phpt",
            "--TEST--\nt\n--INI--\nnot a setting\n--FILE--\nx\n--EXPECT--\nx\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults());

        let err = runner.run_file(&path).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Format {
                source: FormatError::InvalidSetting { .. },
                ..
            }
        ));
        assert_eq!(executor.count(), 0);
    }

    #[test]
    fn test_executor_failure_is_an_error_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "broken.phpt",
            "--TEST--\nt\n--FILE--\nx\n--EXPECT--\nx\n",
        );
        let runner = TestRunner::new(&BrokenExecutor, &LineDiff, defaults());

        let err = runner.run_file(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Execution(_)));
        assert!(!Artifacts::for_test(&path, "php").script.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let runner = TestRunner::new(&BrokenExecutor, &LineDiff, defaults());
        let err = runner.run_file(&dir.path().join("nope.phpt")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    #[test]
    fn test_custom_script_extension() {
        let dir = tempdir().unwrap();
        let path = write_test(
            &dir,
            "ext.phpt",
            "--TEST--\next\n--FILE--\necho a\n--EXPECT--\nb\n",
        );
        let executor = FakeExecutor::new(interpret);
        let runner = TestRunner::new(&executor, &LineDiff, defaults()).with_script_extension("sh");
        runner.run_file(&path).unwrap();
        assert!(dir.path().join("ext.phpt.sh").exists());
        assert!(!dir.path().join("ext.phpt.php").exists());
    }

    #[test]
    fn test_validate_checks_ini_and_pattern() {
        let ok = "--TEST--\nt\n--INI--\na=1\n--FILE--\nx\n--EXPECTF--\n%d\n";
        assert_eq!(validate(ok).unwrap().name(), "t");

        let bad_ini = "--TEST--\nt\n--INI--\nnope\n--FILE--\nx\n--EXPECT--\nx\n";
        assert!(matches!(
            validate(bad_ini),
            Err(FormatError::InvalidSetting { line: 1, .. })
        ));

        assert_eq!(
            validate("--FILE--\nx\n--EXPECT--\nx\n"),
            Err(FormatError::MissingSection("TEST"))
        );
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = TestOutcome::Skip {
            name: "n".to_string(),
            reason: "r".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skip");
        assert_eq!(json["reason"], "r");
    }
}
