//! Suite configuration and test file discovery.

use crate::schema::{SCHEMA_VERSION, SuiteConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(
        "unsupported config version {found} in {} (expected {})",
        path.display(),
        SCHEMA_VERSION
    )]
    Version { path: PathBuf, found: u32 },
}

/// Suite configuration file names, in lookup order.
pub const SUITE_CONFIG_FILENAMES: [&str; 2] = ["phptest.yaml", "phptest.toml"];

/// Extension of test definition files (case-sensitive).
pub const TEST_EXTENSION: &str = ".phpt";

/// Load suite configuration from a directory.
///
/// Returns `None` if no configuration file exists, `Err` if one exists but
/// is invalid.
pub fn load_suite_config(dir: &Path) -> Result<Option<SuiteConfig>, LoadError> {
    let Some(path) = SUITE_CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
    else {
        return Ok(None);
    };

    let contents = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;

    let config: SuiteConfig = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str(&contents).map_err(|source| LoadError::Toml {
            path: path.clone(),
            source,
        })?
    } else {
        serde_yaml::from_str(&contents).map_err(|source| LoadError::Yaml {
            path: path.clone(),
            source,
        })?
    };
    if config.version != SCHEMA_VERSION {
        return Err(LoadError::Version {
            path,
            found: config.version,
        });
    }
    Ok(Some(config))
}

/// Whether `name` looks like a test definition file.
pub fn is_test_file_name(name: &str) -> bool {
    !name.starts_with('.') && name.ends_with(TEST_EXTENSION)
}

/// Find test files in a directory, or return the single file given.
///
/// Entries come back in directory-listing order; hidden entries are skipped.
pub fn find_tests(path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut tests = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_test_file_name(name) && entry.file_type()?.is_file() {
            tests.push(entry.path());
        }
    }
    Ok(tests)
}
