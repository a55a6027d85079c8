//! Expected/actual output diffs.

use difference::{Changeset, Difference};
use std::fmt::Write as _;

/// Produces a human-readable delta between two texts.
pub trait DiffEngine {
    /// Return the delta, or an empty string when the texts are equal.
    fn diff(&self, expected: &str, actual: &str) -> String;
}

/// Line-oriented diff.
///
/// Only changed lines are listed, each prefixed with its 1-based line number
/// in its own text and `-` (expected only) or `+` (actual only):
///
/// ```text
/// 002- expected line
/// 002+ actual line
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDiff;

impl DiffEngine for LineDiff {
    fn diff(&self, expected: &str, actual: &str) -> String {
        if expected == actual {
            return String::new();
        }

        let changeset = Changeset::new(expected, actual, "\n");
        let mut out = String::new();
        let mut expected_line = 1usize;
        let mut actual_line = 1usize;

        for change in &changeset.diffs {
            match change {
                Difference::Same(text) => {
                    let lines = text.split('\n').count();
                    expected_line += lines;
                    actual_line += lines;
                }
                Difference::Rem(text) => {
                    for line in text.split('\n') {
                        let _ = writeln!(out, "{expected_line:03}- {line}");
                        expected_line += 1;
                    }
                }
                Difference::Add(text) => {
                    for line in text.split('\n') {
                        let _ = writeln!(out, "{actual_line:03}+ {line}");
                        actual_line += 1;
                    }
                }
            }
        }

        out
    }
}
