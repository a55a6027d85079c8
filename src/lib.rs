//! phptest: a file-driven functional test runner.
//!
//! Each `.phpt` file holds a script, optional interpreter settings, an
//! optional skip check and the expected output. [`runner::TestRunner`] runs a
//! single file; [`suite::run_suite`] runs many.

pub mod diff;
pub mod env;
pub mod error;
pub mod executor;
pub mod loader;
pub mod pattern;
pub mod report;
pub mod runner;
pub mod schema;
pub mod section;
pub mod settings;
pub mod suite;
