//! Schema definitions for the suite configuration file.
//!
//! A suite is configured by an optional `phptest.yaml` (or `phptest.toml`)
//! in the test root. Every field has a default, so an empty file, or no file
//! at all, runs tests with the `php` binary and the built-in settings.

use crate::settings::ExecutionSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Suite-level configuration loaded from the test root.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuiteConfig {
    /// Schema version. Only [`SCHEMA_VERSION`] is accepted.
    #[serde(default = "default_version")]
    pub version: u32,

    /// The interpreter that executes FILE and SKIPIF scripts.
    #[serde(default)]
    pub interpreter: Interpreter,

    /// Suffix appended to the test file name for the executed script
    /// artifact (`<name>.phpt.<script_extension>`).
    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// Whether the interpreter inherits the host environment (default: true).
    #[serde(default = "default_true")]
    pub inherit_env: bool,

    /// Extra environment variables for every script run.
    /// Values support `${VAR}` interpolation.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Default interpreter settings, applied on top of the built-in set.
    /// INI sections in test files override these per test.
    #[serde(default)]
    pub settings: BTreeMap<String, SettingValue>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            interpreter: Interpreter::default(),
            script_extension: default_script_extension(),
            inherit_env: true,
            env: HashMap::new(),
            settings: BTreeMap::new(),
        }
    }
}

impl SuiteConfig {
    /// Built-in settings with this suite's `settings` applied on top.
    pub fn default_settings(&self) -> ExecutionSettings {
        let overrides: ExecutionSettings = self
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        ExecutionSettings::builtin().merged(&overrides)
    }
}

/// The configuration format version this crate reads.
pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

fn default_script_extension() -> String {
    "php".to_string()
}

fn default_true() -> bool {
    true
}

/// Interpreter invocation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Interpreter {
    /// Program to run. Supports `${VAR}` interpolation.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the settings and the script path.
    #[serde(default)]
    pub args: Vec<String>,

    /// How settings are handed to the interpreter.
    #[serde(default)]
    pub settings: SettingsMode,

    /// Flag preceding each `key=value` pair in `flag` mode.
    #[serde(default = "default_setting_flag")]
    pub setting_flag: String,

    /// Arguments used to probe that the interpreter runs at all.
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            settings: SettingsMode::default(),
            setting_flag: default_setting_flag(),
            version_args: default_version_args(),
        }
    }
}

fn default_program() -> String {
    "php".to_string()
}

fn default_setting_flag() -> String {
    "-d".to_string()
}

fn default_version_args() -> Vec<String> {
    vec!["-v".to_string()]
}

/// Delivery of settings to the interpreter process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettingsMode {
    /// One `<setting_flag> key=value` argument pair per setting.
    #[default]
    Flag,
    /// One environment variable per setting.
    Env,
}

/// A scalar setting value as written in YAML or TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", u8::from(*b)),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::Str(s) => f.write_str(s),
        }
    }
}

/// Generate the JSON Schema for the suite configuration file.
pub fn generate_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SuiteConfig)
}
