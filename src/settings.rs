//! Interpreter settings passed to each script execution.

use crate::error::FormatError;
use std::collections::BTreeMap;

/// Settings applied when no configuration overrides them.
pub const BUILTIN_DEFAULTS: &[(&str, &str)] = &[
    ("display_errors", "1"),
    ("error_reporting", "E_ALL"),
    ("html_errors", "0"),
    ("log_errors", "0"),
    ("max_execution_time", "60"),
    ("output_buffering", "0"),
];

/// An ordered name → value map of interpreter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSettings {
    values: BTreeMap<String, String>,
}

impl ExecutionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in default set.
    pub fn builtin() -> Self {
        BUILTIN_DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return a copy of `self` with every entry of `overrides` applied on top.
    pub fn merged(&self, overrides: &ExecutionSettings) -> ExecutionSettings {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.set(k, v);
        }
        out
    }

    /// Parse the body of an INI section.
    ///
    /// Each non-blank line is `key=value`; whitespace around both parts is
    /// trimmed and one layer of surrounding double quotes is stripped from the
    /// value. Lines starting with `;` or `#` are comments. A repeated key keeps
    /// the last value.
    pub fn parse_ini(text: &str) -> Result<ExecutionSettings, FormatError> {
        let mut settings = ExecutionSettings::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(FormatError::InvalidSetting {
                    line: idx + 1,
                    text: line.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(FormatError::InvalidSetting {
                    line: idx + 1,
                    text: line.to_string(),
                });
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            settings.set(key, value);
        }
        Ok(settings)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExecutionSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = ExecutionSettings::new();
        for (k, v) in iter {
            settings.set(k, v);
        }
        settings
    }
}
