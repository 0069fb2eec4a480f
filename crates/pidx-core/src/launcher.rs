use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::HarnessError;

/// Which executable a launch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Write,
    Read,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Write => "write",
            Phase::Read => "read",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `mpirun -np N <exe> <args>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Launcher program (`mpirun`, `srun`, ...)
    pub launcher: String,
    /// Extra launcher arguments placed before `-np`
    pub launcher_args: Vec<String>,
    /// Number of processes
    pub procs: u32,
    pub executable: PathBuf,
    pub args: Vec<String>,
}

impl LaunchCommand {
    pub fn new(launcher: impl Into<String>, procs: u32, executable: impl Into<PathBuf>) -> Self {
        Self {
            launcher: launcher.into(),
            launcher_args: Vec::new(),
            procs,
            executable: executable.into(),
            args: Vec::new(),
        }
    }

    pub fn launcher_args(mut self, args: Vec<String>) -> Self {
        self.launcher_args = args;
        self
    }

    /// Append `flag value` to the executable arguments.
    pub fn opt(mut self, flag: &str, value: impl fmt::Display) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    /// Arguments handed to the launcher program.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.launcher_args.clone();
        argv.push("-np".to_string());
        argv.push(self.procs.to_string());
        argv.push(self.executable.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.launcher)?;
        for arg in self.argv() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What came back from a launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutput {
    /// False when the launcher only recorded the command
    pub executed: bool,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Captured stdout followed by stderr
    pub output: String,
}

impl LaunchOutput {
    pub fn not_executed() -> Self {
        Self::default()
    }
}

/// Seam between the test driver and the way commands are run.
pub trait Launcher {
    /// Launcher name for logs (e.g., "process", "script")
    fn name(&self) -> &str;

    /// Run (or record) one command.
    fn launch(&self, phase: Phase, cmd: &LaunchCommand) -> Result<LaunchOutput, HarnessError>;

    /// Whether launches actually run and produce output worth verifying.
    fn executes(&self) -> bool {
        true
    }
}

/// Runs commands as child processes and appends their output to per-phase logs.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    write_log: PathBuf,
    read_log: PathBuf,
}

impl ProcessLauncher {
    pub fn new(write_log: impl Into<PathBuf>, read_log: impl Into<PathBuf>) -> Self {
        Self {
            write_log: write_log.into(),
            read_log: read_log.into(),
        }
    }

    pub fn log_path(&self, phase: Phase) -> &Path {
        match phase {
            Phase::Write => &self.write_log,
            Phase::Read => &self.read_log,
        }
    }
}

impl Launcher for ProcessLauncher {
    fn name(&self) -> &str {
        "process"
    }

    fn launch(&self, phase: Phase, cmd: &LaunchCommand) -> Result<LaunchOutput, HarnessError> {
        let result = Command::new(&cmd.launcher)
            .args(cmd.argv())
            .output()
            .map_err(|source| HarnessError::Launch {
                command: cmd.to_string(),
                source,
            })?;

        let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&result.stderr));

        let log = self.log_path(phase);
        append_to(log, output.as_bytes())?;
        debug!(phase = %phase, status = ?result.status, log = %log.display(), "launch finished");

        Ok(LaunchOutput {
            executed: true,
            exit_code: result.status.code(),
            output,
        })
    }
}

/// Records commands into a shell script instead of running them.
#[derive(Debug, Clone)]
pub struct ScriptLauncher {
    script: PathBuf,
}

impl ScriptLauncher {
    /// Start a fresh script at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let script = path.into();
        fs::write(&script, "#!/bin/sh\n\n").map_err(|e| HarnessError::file(&script, e))?;
        Ok(Self { script })
    }

    pub fn path(&self) -> &Path {
        &self.script
    }
}

impl Launcher for ScriptLauncher {
    fn name(&self) -> &str {
        "script"
    }

    fn launch(&self, _phase: Phase, cmd: &LaunchCommand) -> Result<LaunchOutput, HarnessError> {
        append_to(&self.script, format!("{cmd}\n").as_bytes())?;
        Ok(LaunchOutput::not_executed())
    }

    fn executes(&self) -> bool {
        false
    }
}

fn append_to(path: &Path, bytes: &[u8]) -> Result<(), HarnessError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| HarnessError::file(path, e))?;
    file.write_all(bytes).map_err(|e| HarnessError::file(path, e))
}
