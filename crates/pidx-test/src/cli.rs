use std::path::PathBuf;

use clap::Parser;
use pidx_core::{Dims3, HarnessConfig, HarnessError, VarType};

/// PIDX write/read regression harness.
///
/// Writes a dataset with `mpirun -np <wcores> idx_write`, reads every
/// variable back with `mpirun -np <rcores> idx_read` and checks the reported
/// sample counts. The exit code is the number of failed reads.
#[derive(Parser, Debug)]
#[command(name = "pidx-test", about = "PIDX write/read test harness")]
pub struct CliArgs {
    /// Number of writer processes
    #[arg(short = 'w', long = "wcores", default_value_t = 8)]
    pub wcores: u32,

    /// Number of reader processes
    #[arg(short = 'r', long = "rcores", default_value_t = 8)]
    pub rcores: u32,

    /// Process launcher program
    #[arg(short = 'm', long = "mpirun")]
    pub mpirun: Option<String>,

    /// Collect profiling lines into <PFILE>_write.prof / <PFILE>_read.prof
    #[arg(short = 'p', long = "pfile")]
    pub pfile: Option<String>,

    /// Script mode: record commands into a shell script instead of running them
    #[arg(short = 't', long = "travis")]
    pub travis: bool,

    /// Script written in script mode
    #[arg(long = "script")]
    pub script: Option<PathBuf>,

    /// JSON configuration file (missing keys keep their defaults)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Write executable
    #[arg(long = "write-exe")]
    pub write_exe: Option<PathBuf>,

    /// Read executable
    #[arg(long = "read-exe")]
    pub read_exe: Option<PathBuf>,

    /// Variable type to test (repeatable, e.g. 1*float32)
    #[arg(long = "var-type")]
    pub var_types: Vec<String>,

    /// Per-process patch size (e.g. 12x12x12)
    #[arg(long = "patch-size")]
    pub patch_size: Option<String>,

    /// Variables written per test
    #[arg(long = "vars")]
    pub n_vars: Option<u32>,

    /// Timesteps written per test
    #[arg(long = "timesteps")]
    pub timesteps: Option<u32>,

    /// Also run the non-power-of-two suite
    #[arg(long = "non-pow2")]
    pub non_pow2: bool,

    /// Pass the restructuring box (-r) to the write executable
    #[arg(long = "restructure")]
    pub restructure: bool,

    /// Verbosity (repeat for higher levels)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output results as JSON to stdout (suppresses text output)
    #[arg(long = "json")]
    pub json: bool,

    /// Output results as JSON to file (text output still printed)
    #[arg(long = "json-file")]
    pub json_file: Option<PathBuf>,
}

impl CliArgs {
    /// Layer command-line overrides on top of `config`.
    pub fn apply_to(&self, mut config: HarnessConfig) -> Result<HarnessConfig, HarnessError> {
        if let Some(ref m) = self.mpirun {
            config.mpirun = m.clone();
        }
        if let Some(ref p) = self.write_exe {
            config.write_executable = p.clone();
        }
        if let Some(ref p) = self.read_exe {
            config.read_executable = p.clone();
        }
        if let Some(ref p) = self.script {
            config.script_path = p.clone();
        }
        if !self.var_types.is_empty() {
            config.var_types = self
                .var_types
                .iter()
                .map(|s| s.parse::<VarType>())
                .collect::<Result<_, _>>()?;
        }
        if let Some(ref s) = self.patch_size {
            config.patch_size = s.parse::<Dims3>()?;
        }
        if let Some(n) = self.n_vars {
            config.n_vars = n;
        }
        if let Some(t) = self.timesteps {
            config.timesteps = t;
        }
        config.non_pow2 |= self.non_pow2;
        config.restructure |= self.restructure;

        Ok(config)
    }

    /// Build the effective configuration: defaults, then `--config`, then flags.
    pub fn build_config(&self) -> Result<HarnessConfig, HarnessError> {
        let base = match self.config {
            Some(ref path) => HarnessConfig::from_json_file(path)?,
            None => HarnessConfig::default(),
        };
        self.apply_to(base)
    }
}
