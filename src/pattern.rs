//! EXPECTF pattern compiler.
//!
//! An EXPECTF section is literal text sprinkled with `%`-placeholders. The
//! text is escaped chunk by chunk and each placeholder is replaced by its
//! regex fragment, so everything outside a placeholder matches literally.

use crate::error::FormatError;
use regex::Regex;

/// The closed set of placeholders understood in EXPECTF sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `%d`: one or more digits.
    Digits,
    /// `%s`: one or more characters, excluding line breaks.
    Text,
    /// `%i`: optionally signed integer.
    Integer,
    /// `%x`: hexadecimal digits.
    Hex,
    /// `%f`: floating point number.
    Float,
    /// `%c`: a single character other than a line break.
    Char,
    /// `%w`: zero or more whitespace characters.
    Whitespace,
    /// `%a`: one or more characters, line breaks included.
    Any,
    /// `%%`: a literal percent sign.
    Percent,
}

impl Placeholder {
    pub const ALL: [Placeholder; 9] = [
        Placeholder::Digits,
        Placeholder::Text,
        Placeholder::Integer,
        Placeholder::Hex,
        Placeholder::Float,
        Placeholder::Char,
        Placeholder::Whitespace,
        Placeholder::Any,
        Placeholder::Percent,
    ];

    /// The character following `%`.
    pub fn code(self) -> char {
        match self {
            Placeholder::Digits => 'd',
            Placeholder::Text => 's',
            Placeholder::Integer => 'i',
            Placeholder::Hex => 'x',
            Placeholder::Float => 'f',
            Placeholder::Char => 'c',
            Placeholder::Whitespace => 'w',
            Placeholder::Any => 'a',
            Placeholder::Percent => '%',
        }
    }

    pub fn fragment(self) -> &'static str {
        match self {
            Placeholder::Digits => r"[0-9]+",
            Placeholder::Text => r"[^\r\n]+",
            Placeholder::Integer => r"[+-]?[0-9]+",
            Placeholder::Hex => r"[0-9a-fA-F]+",
            Placeholder::Float => r"[+-]?\.?[0-9]+\.?[0-9]*(?:[Ee][+-]?[0-9]+)?",
            Placeholder::Char => r"[^\r\n]",
            Placeholder::Whitespace => r"[ \t\n\r\x0B\x0C]*",
            Placeholder::Any => r"(?s:.+)",
            Placeholder::Percent => "%",
        }
    }

    pub fn from_code(code: char) -> Option<Placeholder> {
        Placeholder::ALL.into_iter().find(|p| p.code() == code)
    }
}

/// A compiled EXPECTF expectation.
#[derive(Debug, Clone)]
pub struct ExpectPattern {
    regex: Regex,
}

impl ExpectPattern {
    /// Compile an EXPECTF text into an anchored matcher.
    pub fn compile(text: &str) -> Result<Self, FormatError> {
        let source = format!(r"\A{}\z", translate(text));
        let regex = Regex::new(&source).map_err(|e| FormatError::InvalidPattern(e.to_string()))?;
        Ok(Self { regex })
    }

    /// Whether `candidate` matches the whole pattern.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

}

/// Translate EXPECTF text into (unanchored) regex source.
fn translate(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%'
            && let Some(placeholder) = chars.peek().copied().and_then(Placeholder::from_code)
        {
            chars.next();
            out.push_str(&regex::escape(&literal));
            literal.clear();
            out.push_str(placeholder.fragment());
        } else {
            literal.push(c);
        }
    }
    out.push_str(&regex::escape(&literal));
    out
}

/// Rewrite `expected` line by line, replacing every pattern line that matches
/// the corresponding `actual` line with the actual text.
///
/// Used before diffing so that only genuinely mismatching lines show up.
/// Multi-line placeholders (`%a`) are left untouched.
pub fn resolve_lines(expected: &str, actual: &str) -> String {
    let actual_lines: Vec<&str> = actual.lines().collect();
    expected
        .lines()
        .enumerate()
        .map(|(idx, line)| match actual_lines.get(idx) {
            Some(candidate)
                if !line.contains("%a")
                    && ExpectPattern::compile(line).is_ok_and(|p| p.is_match(candidate)) =>
            {
                *candidate
            }
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
