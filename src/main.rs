use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use phptest::diff::LineDiff;
use phptest::executor::{InterpreterExecutor, ScriptExecutor};
use phptest::runner::{self, TestRunner};
use phptest::{loader, report, schema, suite};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Exit status when any test failed.
const EXIT_FAILED: u8 = 1;
/// Exit status for harness errors: malformed tests, setup problems.
const EXIT_ERROR: u8 = 2;

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// `[STATUS] name` progress lines and a summary
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
    /// JUnit XML output for CI systems
    Junit,
}

#[derive(Parser)]
#[command(name = "phptest")]
#[command(about = "A file-driven functional test runner for interpreter scripts")]
#[command(version)]
struct Cli {
    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run .phpt tests
    Run {
        /// Path to a test directory or a single .phpt file
        path: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "human")]
        output: OutputFormat,
        /// Only run test files whose name contains this string
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Parse test files without running them
    Validate {
        /// Path to a test directory or a single .phpt file
        path: PathBuf,
    },
    /// Scaffold a new test file
    Init {
        /// Output path for the new test file
        #[arg(default_value = "tests/example.phpt")]
        path: PathBuf,
    },
    /// Output the suite configuration schema
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            path,
            output,
            filter,
        } => run(&path, output, filter.as_deref(), cli.verbose > 0),
        Command::Validate { path } => validate(&path),
        Command::Init { path } => init(&path),
        Command::Schema => {
            let schema = schema::generate_schema();
            match serde_json::to_string_pretty(&schema) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error serializing schema: {e}");
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(path: &Path, output: OutputFormat, filter: Option<&str>, verbose: bool) -> ExitCode {
    // The suite config lives next to the tests.
    let test_root = if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };

    let config = match loader::load_suite_config(test_root) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error loading suite config: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let executor = match InterpreterExecutor::from_config(&config) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Error in suite config: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if let Err(e) = executor.check_available() {
        eprintln!("Setup failed: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    let files = match loader::find_tests(path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error finding tests: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if files.is_empty() {
        eprintln!("No test files found at: {}", path.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let runner = TestRunner::new(&executor, &LineDiff, config.default_settings())
        .with_script_extension(config.script_extension.as_str());

    let started_at = Utc::now();
    let run_start = Instant::now();
    let human = matches!(output, OutputFormat::Human);
    let result = suite::run_suite(&runner, &files, filter, |file, outcome| {
        if human {
            println!("{}", report::human_line(file, outcome, verbose));
        }
    });
    let total_time = run_start.elapsed();

    match output {
        OutputFormat::Human => {
            println!("\n{}", report::human_summary(&result));
        }
        OutputFormat::Json => {
            let json = report::json_report(&result, started_at);
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error serializing results: {e}");
                    return ExitCode::from(EXIT_ERROR);
                }
            }
        }
        OutputFormat::Junit => {
            print!("{}", report::junit_xml(&result, total_time));
        }
    }

    if !result.errors.is_empty() {
        ExitCode::from(EXIT_ERROR)
    } else if result.failed() > 0 {
        ExitCode::from(EXIT_FAILED)
    } else {
        ExitCode::SUCCESS
    }
}

fn validate(path: &Path) -> ExitCode {
    let files = match loader::find_tests(path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error finding tests: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if files.is_empty() {
        eprintln!("No test files found at: {}", path.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut errors = 0;
    for file in &files {
        let checked = fs::read_to_string(file)
            .map_err(|e| e.to_string())
            .and_then(|content| runner::validate(&content).map_err(|e| e.to_string()));
        match checked {
            Ok(definition) => println!("✓ {} ({})", file.display(), definition.name()),
            Err(e) => {
                eprintln!("✗ {}: {e}", file.display());
                errors += 1;
            }
        }
    }

    if errors > 0 {
        eprintln!("\n{errors} test file(s) failed validation");
        return ExitCode::from(EXIT_ERROR);
    }
    println!("\nAll {} test file(s) valid", files.len());
    ExitCode::SUCCESS
}

fn init(path: &Path) -> ExitCode {
    let template = r#"--TEST--
example: arithmetic
--SKIPIF--
<?php if (!function_exists('array_sum')) echo 'array_sum not available'; ?>
--INI--
precision=14
--FILE--
<?php
echo array_sum([1, 2, 3]), "\n";
echo "time: ", time(), "\n";
--EXPECTF--
6
time: %d
"#;
    if path.exists() {
        eprintln!("Error: file already exists: {}", path.display());
        return ExitCode::from(EXIT_ERROR);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
        && let Err(e) = fs::create_dir_all(parent)
    {
        eprintln!("Error creating directory: {e}");
        return ExitCode::from(EXIT_ERROR);
    }
    if let Err(e) = fs::write(path, template) {
        eprintln!("Error writing file: {e}");
        return ExitCode::from(EXIT_ERROR);
    }
    println!("Created: {}", path.display());
    ExitCode::SUCCESS
}
