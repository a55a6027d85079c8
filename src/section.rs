//! Test definition parser.
//!
//! A test file is a sequence of `--NAME--` headers, each followed by the
//! verbatim text of that section. Parsing happens in two steps: [`tokenize`]
//! classifies each line, and [`parse`] folds the tokens into a
//! [`TestDefinition`], checking structure as it goes.

use crate::error::FormatError;
use std::collections::BTreeMap;
use std::fmt;

/// Header boundary marker.
const MARKER: &str = "--";

/// The known sections of a test file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Test,
    Skipif,
    Ini,
    File,
    Expect,
    Expectf,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Test,
        Section::Skipif,
        Section::Ini,
        Section::File,
        Section::Expect,
        Section::Expectf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Test => "TEST",
            Section::Skipif => "SKIPIF",
            Section::Ini => "INI",
            Section::File => "FILE",
            Section::Expect => "EXPECT",
            Section::Expectf => "EXPECTF",
        }
    }

    pub fn from_name(name: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One classified line of a test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A `--NAME--` line; holds the text between the markers.
    Header(&'a str),
    /// Any other line, including its line ending.
    Content(&'a str),
}

/// Split `input` into lines (keeping line endings) and classify each one.
///
/// Yields `(line_number, token)` with 1-based line numbers.
pub fn tokenize(input: &str) -> impl Iterator<Item = (usize, Token<'_>)> {
    input
        .split_inclusive('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, classify(line)))
}

fn classify(line: &str) -> Token<'_> {
    let bare = line.trim_end_matches(['\r', '\n']);
    if bare.len() >= 2 * MARKER.len() && bare.starts_with(MARKER) && bare.ends_with(MARKER) {
        Token::Header(&bare[MARKER.len()..bare.len() - MARKER.len()])
    } else {
        Token::Content(line)
    }
}

/// What the test output is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation<'a> {
    /// Exact text (EXPECT).
    Literal(&'a str),
    /// Placeholder pattern (EXPECTF).
    Pattern(&'a str),
}

/// A parsed test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    sections: BTreeMap<Section, String>,
}

impl TestDefinition {
    /// Raw content of a section, if present.
    pub fn section(&self, section: Section) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    /// Display name of the test (TEST section, trimmed).
    pub fn name(&self) -> &str {
        self.section(Section::Test).unwrap_or_default().trim()
    }

    /// Script source (FILE section).
    pub fn script(&self) -> &str {
        self.section(Section::File).unwrap_or_default()
    }

    pub fn skip_check(&self) -> Option<&str> {
        self.section(Section::Skipif)
    }

    pub fn ini(&self) -> Option<&str> {
        self.section(Section::Ini)
    }

    pub fn expectation(&self) -> Expectation<'_> {
        match self.section(Section::Expectf) {
            Some(pattern) => Expectation::Pattern(pattern),
            None => Expectation::Literal(self.section(Section::Expect).unwrap_or_default()),
        }
    }
}

/// Parse the content of a test file.
pub fn parse(input: &str) -> Result<TestDefinition, FormatError> {
    let mut sections: BTreeMap<Section, String> = BTreeMap::new();
    let mut current: Option<Section> = None;

    for (line, token) in tokenize(input) {
        match token {
            Token::Header(name) => {
                let section = Section::from_name(name).ok_or_else(|| {
                    FormatError::UnknownSection {
                        name: name.to_string(),
                        line,
                    }
                })?;
                if sections.insert(section, String::new()).is_some() {
                    return Err(FormatError::DuplicateSection {
                        name: name.to_string(),
                        line,
                    });
                }
                current = Some(section);
            }
            Token::Content(text) => {
                let section = current.ok_or(FormatError::NoSection { line })?;
                if let Some(buf) = sections.get_mut(&section) {
                    buf.push_str(text);
                }
            }
        }
    }

    for required in [Section::File, Section::Test] {
        if !sections.contains_key(&required) {
            return Err(FormatError::MissingSection(required.name()));
        }
    }

    match (
        sections.contains_key(&Section::Expect),
        sections.contains_key(&Section::Expectf),
    ) {
        (false, false) => Err(FormatError::MissingExpectation),
        (true, true) => Err(FormatError::AmbiguousExpectation),
        _ => Ok(TestDefinition { sections }),
    }
}
