use pidx_core::decomp::check_read_decomposition;
use pidx_core::profile::{self, ProfileFiles};
use pidx_core::{
    Dims3, HarnessConfig, HarnessError, InvalidDecomposition, LaunchCommand, LaunchOutput,
    Launcher, Phase, VarType, Verdict, vars, verify,
};
use tracing::{info, warn};

use crate::report;

/// Global box of the non-power-of-two suite.
pub const NON_POW2_GLOBAL: Dims3 = Dims3::new(124, 48, 36);

/// One `execute_test` call: a write decomposition checked against every read grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub write_procs: u32,
    pub read_procs: u32,
    pub global: Dims3,
    pub local: Dims3,
    pub restructure: Dims3,
    pub timesteps: u32,
    pub n_vars: u32,
    pub var_type: VarType,
    /// Restructuring relation announced before the case (`r == l`, ...)
    pub label: Option<&'static str>,
}

impl TestCase {
    /// Samples every read of this case must report as correct.
    pub fn expected_samples(&self) -> Result<u64, HarnessError> {
        self.global
            .volume()
            .and_then(|v| v.checked_mul(self.var_type.samples_per_element()))
            .ok_or_else(|| {
                HarnessError::ExtentOverflow(format!("{} * {}", self.global, self.var_type))
            })
    }
}

/// One read-back launch and its verdict.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// 1-based timestep
    pub timestep: u32,
    pub variable: u32,
    pub command: String,
    /// `None` when the launcher did not execute the command
    pub verdict: Option<Verdict>,
}

impl ReadOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.is_none_or(|v| v.passed())
    }
}

/// Write + reads for one candidate read grid.
#[derive(Debug, Clone)]
pub struct GridRun {
    pub read_grid: Dims3,
    pub read_local: Dims3,
    pub write_command: String,
    pub write_exit_code: Option<i32>,
    pub reads: Vec<ReadOutcome>,
}

/// Result of one `execute_test` call.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub case: TestCase,
    pub invalid: Option<InvalidDecomposition>,
    pub grids: Vec<GridRun>,
}

impl CaseOutcome {
    /// Reads launched, or 1 for an invalid case.
    pub fn n_tests(&self) -> u32 {
        if self.invalid.is_some() {
            return 1;
        }
        self.grids.iter().map(|g| g.reads.len() as u32).sum()
    }

    /// Passing reads; an invalid case has none, even if earlier grids ran.
    pub fn successes(&self) -> u32 {
        if self.invalid.is_some() {
            return 0;
        }
        self.grids
            .iter()
            .flat_map(|g| &g.reads)
            .filter(|r| r.passed())
            .count() as u32
    }

    /// An invalid decomposition counts as exactly one failure.
    pub fn failures(&self) -> u32 {
        self.n_tests() - self.successes()
    }
}

/// All cases of one suite (`pow2` or `non-pow2`) for one variable type.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub name: &'static str,
    pub var_type: VarType,
    pub cases: Vec<CaseOutcome>,
}

impl SuiteOutcome {
    pub fn failures(&self) -> u32 {
        self.cases.iter().map(|c| c.failures()).sum()
    }

    pub fn n_tests(&self) -> u32 {
        self.cases.iter().map(|c| c.n_tests()).sum()
    }

    pub fn successes(&self) -> u32 {
        self.cases.iter().map(|c| c.successes()).sum()
    }
}

/// Drives the write/read executables through a [`Launcher`].
pub struct Harness<'a> {
    config: &'a HarnessConfig,
    launcher: &'a dyn Launcher,
    launcher_args: Vec<String>,
    profile: Option<ProfileFiles>,
    print_text: bool,
}

impl<'a> Harness<'a> {
    pub fn new(config: &'a HarnessConfig, launcher: &'a dyn Launcher) -> Self {
        Self {
            config,
            launcher,
            launcher_args: Vec::new(),
            profile: None,
            print_text: true,
        }
    }

    /// Extra arguments placed between the launcher program and `-np`.
    pub fn with_launcher_args(mut self, args: Vec<String>) -> Self {
        self.launcher_args = args;
        self
    }

    pub fn with_profile(mut self, profile: Option<ProfileFiles>) -> Self {
        self.profile = profile;
        self
    }

    pub fn print_text(mut self, print_text: bool) -> Self {
        self.print_text = print_text;
        self
    }

    fn write_command(&self, case: &TestCase) -> LaunchCommand {
        let mut cmd = LaunchCommand::new(
            &self.config.mpirun,
            case.write_procs,
            &self.config.write_executable,
        )
        .launcher_args(self.launcher_args.clone())
        .opt("-g", case.global)
        .opt("-l", case.local);
        if self.config.restructure {
            cmd = cmd.opt("-r", case.restructure);
        }
        cmd.opt("-t", case.timesteps)
            .opt("-v", self.config.vars_file.display())
            .opt("-f", &self.config.data_file)
    }

    fn read_command(
        &self,
        case: &TestCase,
        read_local: Dims3,
        timestep: u32,
        var: u32,
    ) -> LaunchCommand {
        LaunchCommand::new(
            &self.config.mpirun,
            case.read_procs,
            &self.config.read_executable,
        )
        .launcher_args(self.launcher_args.clone())
        .opt("-g", case.global)
        .opt("-l", read_local)
        .opt("-t", timestep)
        .opt("-v", var)
        .opt("-f", &self.config.data_file)
    }

    fn capture_profile(&self, phase: Phase, out: &LaunchOutput) -> Result<(), HarnessError> {
        let Some(ref files) = self.profile else {
            return Ok(());
        };
        let target = match phase {
            Phase::Write => &files.write,
            Phase::Read => &files.read,
        };
        profile::append_profile(&out.output, target)?;
        Ok(())
    }

    /// Write once per read grid, then read back and verify every timestep/variable.
    pub fn execute_test(&self, case: TestCase) -> Result<CaseOutcome, HarnessError> {
        let read_grids = self.config.procs.grids(case.read_procs)?;
        let expected = case.expected_samples()?;
        let mut outcome = CaseOutcome {
            case: case.clone(),
            invalid: None,
            grids: Vec::new(),
        };

        for &read_grid in read_grids {
            let read_local = match check_read_decomposition(
                case.global,
                case.local,
                case.write_procs,
                case.read_procs,
                read_grid,
            ) {
                Ok(local) => local,
                Err(invalid) => {
                    if self.print_text {
                        report::print_invalid(&invalid);
                    }
                    outcome.invalid = Some(invalid);
                    return Ok(outcome);
                }
            };

            if case.var_type.is_small_domain_only() {
                warn!(
                    "testing {} this datatype can be tested only on small domains",
                    case.var_type
                );
            }

            let var_type = &case.var_type;
            vars::write_vars_file(&self.config.vars_file, case.n_vars, var_type, var_type)?;

            let write_cmd = self.write_command(&case);
            info!("EXECUTE write: {}", write_cmd);
            let write_out = self.launcher.launch(Phase::Write, &write_cmd)?;
            if write_out.executed && write_out.exit_code != Some(0) {
                warn!(exit_code = ?write_out.exit_code, "write executable did not exit cleanly");
            }
            self.capture_profile(Phase::Write, &write_out)?;

            let mut run = GridRun {
                read_grid,
                read_local,
                write_command: write_cmd.to_string(),
                write_exit_code: write_out.exit_code,
                reads: Vec::new(),
            };

            for t in 1..=case.timesteps {
                for var in 0..case.n_vars {
                    let read_cmd = self.read_command(&case, read_local, t - 1, var);
                    info!("EXECUTE read: {}", read_cmd);
                    let read_out = self.launcher.launch(Phase::Read, &read_cmd)?;
                    self.capture_profile(Phase::Read, &read_out)?;

                    let verdict = read_out
                        .executed
                        .then(|| Verdict::new(expected, verify::scan_output(&read_out.output)));

                    let read = ReadOutcome {
                        timestep: t,
                        variable: var,
                        command: read_cmd.to_string(),
                        verdict,
                    };
                    if !read.passed() && self.print_text {
                        report::print_read_failure(&read, &case.var_type);
                    }
                    run.reads.push(read);
                }
            }

            outcome.grids.push(run);
        }

        if self.launcher.executes() && self.print_text {
            report::print_success_ratio(outcome.successes(), outcome.n_tests());
        }

        Ok(outcome)
    }

    /// Every grid of `write_procs`, each process owning one `patch_size` patch.
    pub fn pow_2(
        &self,
        write_procs: u32,
        read_procs: u32,
        var_type: &VarType,
        n_vars: u32,
        timesteps: u32,
    ) -> Result<SuiteOutcome, HarnessError> {
        if self.print_text {
            println!("---RUN TESTS---");
        }

        let patch = self.config.patch_size;
        let mut suite = SuiteOutcome {
            name: "pow2",
            var_type: var_type.clone(),
            cases: Vec::new(),
        };

        for &grid in self.config.procs.grids(write_procs)? {
            let global = grid
                .mul(patch)
                .ok_or_else(|| HarnessError::ExtentOverflow(format!("{grid} * {patch}")))?;
            let case = TestCase {
                write_procs,
                read_procs,
                global,
                local: patch,
                restructure: patch,
                timesteps,
                n_vars,
                var_type: var_type.clone(),
                label: None,
            };
            suite.cases.push(self.execute_test(case)?);
        }

        if suite.failures() == 0 && self.launcher.executes() && self.print_text {
            println!("TEST PASSED");
        }

        Ok(suite)
    }

    /// Fixed 124x48x36 domain cut by the default grid, under three restructuring boxes.
    pub fn non_pow_2(
        &self,
        write_procs: u32,
        read_procs: u32,
        var_type: &VarType,
        n_vars: u32,
        timesteps: u32,
    ) -> Result<SuiteOutcome, HarnessError> {
        if self.print_text {
            println!("---NON-POW 2 TESTS---");
        }

        let grid = self.config.procs.default_grid(write_procs)?;
        let global = NON_POW2_GLOBAL;
        let local = global
            .div_floor(grid)
            .ok_or_else(|| HarnessError::InvalidExtent(grid.to_string()))?;

        let restructures = [
            ("r == l", Dims3::new(64, 32, 32)),
            ("r < l", Dims3::new(64, 32, 16)),
            (
                "r > l",
                local
                    .scale(2)
                    .ok_or_else(|| HarnessError::ExtentOverflow(format!("2 * {local}")))?,
            ),
        ];

        let mut suite = SuiteOutcome {
            name: "non-pow2",
            var_type: var_type.clone(),
            cases: Vec::new(),
        };

        for (label, restructure) in restructures {
            if self.print_text {
                println!("{} {}", label, restructure);
            }
            let case = TestCase {
                write_procs,
                read_procs,
                global,
                local,
                restructure,
                timesteps,
                n_vars,
                var_type: var_type.clone(),
                label: Some(label),
            };
            suite.cases.push(self.execute_test(case)?);
        }

        if suite.failures() == 0 && self.print_text {
            println!("TEST PASSED");
        }

        Ok(suite)
    }
}
