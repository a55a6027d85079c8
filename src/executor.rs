//! Script execution.
//!
//! The orchestrator only needs "run this file with these settings and give me
//! everything it printed"; [`ScriptExecutor`] is that seam. The shipped
//! implementation, [`InterpreterExecutor`], spawns the configured interpreter
//! as a child process.

use crate::env::{InterpolateError, interpolate, interpolate_all};
use crate::error::{ExecutionFailure, SetupError};
use crate::schema::{SettingsMode, SuiteConfig};
use crate::settings::ExecutionSettings;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs a script file and returns its combined stdout and stderr.
pub trait ScriptExecutor {
    /// Execute `script` with `settings` applied, blocking until it exits.
    fn execute(
        &self,
        script: &Path,
        settings: &ExecutionSettings,
    ) -> Result<String, ExecutionFailure>;

    /// Verify that the executor can run anything at all.
    fn check_available(&self) -> Result<(), SetupError> {
        Ok(())
    }
}

/// Executes scripts with an external interpreter binary.
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    program: String,
    args: Vec<String>,
    mode: SettingsMode,
    setting_flag: String,
    version_args: Vec<String>,
    env: HashMap<String, String>,
    inherit_env: bool,
}

impl InterpreterExecutor {
    /// Build an executor from the suite configuration, expanding `${VAR}`
    /// references in the program path and environment values.
    pub fn from_config(config: &SuiteConfig) -> Result<Self, InterpolateError> {
        let env = interpolate_all(&config.env)?;
        let program = interpolate(&config.interpreter.program, &env)?;

        Ok(Self {
            program,
            args: config.interpreter.args.clone(),
            mode: config.interpreter.settings,
            setting_flag: config.interpreter.setting_flag.clone(),
            version_args: config.interpreter.version_args.clone(),
            env,
            inherit_env: config.inherit_env,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the interpreter for `script`.
    fn arguments(&self, script: &Path, settings: &ExecutionSettings) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        if self.mode == SettingsMode::Flag {
            for (name, value) in settings.iter() {
                args.push(OsString::from(&self.setting_flag));
                args.push(OsString::from(format!("{name}={value}")));
            }
        }
        args.push(script.as_os_str().to_owned());
        args
    }

    fn command(&self, script: &Path, settings: &ExecutionSettings) -> Command {
        // The child runs next to the script, so hand it an absolute path.
        let script = std::path::absolute(script).unwrap_or_else(|_| script.to_path_buf());
        let mut cmd = Command::new(&self.program);
        cmd.args(self.arguments(&script, settings));

        if let Some(dir) = script.parent() {
            cmd.current_dir(dir);
        }

        if !self.inherit_env {
            cmd.env_clear();
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if self.mode == SettingsMode::Env {
            for (name, value) in settings.iter() {
                cmd.env(name, value);
            }
        }

        cmd.stdin(Stdio::null());
        cmd
    }
}

impl ScriptExecutor for InterpreterExecutor {
    fn execute(
        &self,
        script: &Path,
        settings: &ExecutionSettings,
    ) -> Result<String, ExecutionFailure> {
        // Both streams go to one file so their interleaving is preserved.
        let mut capture = tempfile::tempfile().map_err(ExecutionFailure::Capture)?;
        let stdout = capture.try_clone().map_err(ExecutionFailure::Capture)?;
        let stderr = capture.try_clone().map_err(ExecutionFailure::Capture)?;

        let mut cmd = self.command(script, settings);
        cmd.stdout(Stdio::from(stdout));
        cmd.stderr(Stdio::from(stderr));

        debug!(
            program = %self.program,
            script = %script.display(),
            settings = settings.len(),
            "spawning interpreter"
        );
        let mut child = cmd.spawn().map_err(|source| ExecutionFailure::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let status = child.wait().map_err(|source| ExecutionFailure::Wait {
            program: self.program.clone(),
            source,
        })?;
        debug!(status = %status, "interpreter exited");

        let mut bytes = Vec::new();
        capture
            .seek(SeekFrom::Start(0))
            .map_err(ExecutionFailure::Capture)?;
        capture
            .read_to_end(&mut bytes)
            .map_err(ExecutionFailure::Capture)?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn check_available(&self) -> Result<(), SetupError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.version_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if !self.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(&self.env);

        match cmd.status() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(SetupError {
                program: self.program.clone(),
                reason: format!("probe exited with {status}"),
            }),
            Err(e) => Err(SetupError {
                program: self.program.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
