//! Rendering suite results for humans and machines.

use crate::error::HarnessError;
use crate::runner::{TestOutcome, TestReport};
use crate::suite::SuiteResult;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Progress line(s) for one finished test file.
pub fn human_line(path: &Path, result: Result<&TestReport, &HarnessError>, verbose: bool) -> String {
    let mut out = String::new();
    match result {
        Ok(report) => {
            let _ = write!(out, "[{}] {}", report.outcome.status(), report.outcome.name());
            if verbose {
                let _ = write!(out, " ({:.2?})", report.duration);
            }
            match &report.outcome {
                TestOutcome::Pass { .. } => {}
                TestOutcome::Fail { diff, .. } => {
                    for line in diff.lines() {
                        let _ = write!(out, "\n    {line}");
                    }
                }
                TestOutcome::Skip { reason, .. } => {
                    for line in reason.lines() {
                        let _ = write!(out, "\n    {line}");
                    }
                }
            }
        }
        Err(e) => {
            let _ = write!(out, "[ERROR] {}: {e}", path.display());
        }
    }
    out
}

/// Final summary line.
pub fn human_summary(result: &SuiteResult) -> String {
    let mut summary = format!(
        "{} failed, {} passed, {} skipped",
        result.failed(),
        result.passed(),
        result.skipped()
    );
    if !result.errors.is_empty() {
        let _ = write!(summary, ", {} error(s)", result.errors.len());
    }
    summary
}

/// JSON document for a whole run.
pub fn json_report(result: &SuiteResult, started_at: DateTime<Utc>) -> serde_json::Value {
    let errors: Vec<_> = result
        .errors
        .iter()
        .map(|e| {
            serde_json::json!({
                "file": e.file.display().to_string(),
                "error": e.error.to_string(),
            })
        })
        .collect();

    serde_json::json!({
        "started_at": started_at.to_rfc3339(),
        "total": result.total(),
        "passed": result.passed(),
        "failed": result.failed(),
        "skipped": result.skipped(),
        "results": result.reports,
        "errors": errors,
    })
}

/// Format results as JUnit XML.
pub fn junit_xml(result: &SuiteResult, total_time: Duration) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let tests = result.total() + result.errors.len();
    let _ = writeln!(
        xml,
        "<testsuites tests=\"{tests}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
        result.failed(),
        result.errors.len(),
        result.skipped(),
        total_time.as_secs_f64()
    );
    let _ = writeln!(
        xml,
        "  <testsuite name=\"phptest\" tests=\"{tests}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
        result.failed(),
        result.errors.len(),
        result.skipped(),
        total_time.as_secs_f64()
    );

    for report in &result.reports {
        let _ = write!(
            xml,
            "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
            escape_xml(report.outcome.name()),
            escape_xml(&report.file.display().to_string()),
            report.duration.as_secs_f64()
        );
        match &report.outcome {
            TestOutcome::Pass { .. } => xml.push_str("/>\n"),
            TestOutcome::Skip { reason, .. } => {
                let _ = writeln!(xml, ">\n      <skipped message=\"{}\"/>", escape_xml(reason));
                xml.push_str("    </testcase>\n");
            }
            TestOutcome::Fail { diff, output, .. } => {
                let _ = writeln!(xml, ">\n      <failure message=\"output mismatch\">");
                let _ = writeln!(xml, "{}", escape_xml(diff));
                xml.push_str("      </failure>\n");
                let _ = writeln!(xml, "      <system-out>{}</system-out>", escape_xml(output));
                xml.push_str("    </testcase>\n");
            }
        }
    }

    for file_error in &result.errors {
        let file = file_error.file.display().to_string();
        let _ = writeln!(
            xml,
            "    <testcase name=\"{}\" classname=\"{}\" time=\"0.000\">",
            escape_xml(&file),
            escape_xml(&file)
        );
        let _ = writeln!(
            xml,
            "      <error message=\"{}\"/>",
            escape_xml(&file_error.error.to_string())
        );
        xml.push_str("    </testcase>\n");
    }

    xml.push_str("  </testsuite>\n");
    xml.push_str("</testsuites>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
