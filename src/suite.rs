//! Sequential execution of a set of test files.

use crate::error::HarnessError;
use crate::runner::{Status, TestReport, TestRunner};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A test file that could not be processed.
#[derive(Debug)]
pub struct FileError {
    pub file: PathBuf,
    pub error: HarnessError,
}

/// Aggregate of a suite run.
///
/// Harness errors are kept apart from the outcome counts.
#[derive(Debug, Default)]
pub struct SuiteResult {
    pub reports: Vec<TestReport>,
    pub errors: Vec<FileError>,
}

impl SuiteResult {
    /// Number of tests that produced an outcome.
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn passed(&self) -> usize {
        self.count(Status::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(Status::Fail)
    }

    pub fn skipped(&self) -> usize {
        self.count(Status::Skip)
    }

    fn count(&self, status: Status) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.status() == status)
            .count()
    }

    /// True when nothing failed and no file was malformed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.errors.is_empty()
    }
}

/// Run `files` one after another, in the given order.
///
/// `filter`, when set, keeps only files whose name contains it. `progress` is
/// called once per file as soon as it finishes.
pub fn run_suite<F>(
    runner: &TestRunner<'_>,
    files: &[PathBuf],
    filter: Option<&str>,
    mut progress: F,
) -> SuiteResult
where
    F: FnMut(&Path, Result<&TestReport, &HarnessError>),
{
    let mut result = SuiteResult::default();

    let selected = files.iter().filter(|path| {
        filter.is_none_or(|f| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().contains(f))
        })
    });

    for path in selected {
        match runner.run_file(path) {
            Ok(report) => {
                progress(path, Ok(&report));
                result.reports.push(report);
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "test file could not be processed");
                progress(path, Err(&e));
                result.errors.push(FileError {
                    file: path.clone(),
                    error: e,
                });
            }
        }
    }

    info!(
        total = result.total(),
        passed = result.passed(),
        failed = result.failed(),
        skipped = result.skipped(),
        errors = result.errors.len(),
        "suite finished"
    );
    result
}
