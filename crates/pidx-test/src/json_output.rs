use pidx_core::HarnessConfig;
use serde::Serialize;

use crate::runner::{CaseOutcome, GridRun, ReadOutcome, SuiteOutcome};

// ============================================================================
// JSON document structures
// ============================================================================

#[derive(Serialize)]
pub struct HarnessJsonDocument {
    pub version: String,
    pub began: String,
    pub command_line: String,
    pub machine: String,
    pub parameters: HarnessJsonParameters,
    pub suites: Vec<HarnessJsonSuite>,
    pub summary: HarnessJsonSummary,
    pub finished: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessJsonParameters {
    pub mpirun: String,
    pub write_executable: String,
    pub read_executable: String,
    pub wcores: u32,
    pub rcores: u32,
    pub patch_size: String,
    pub var_types: Vec<String>,
    pub n_vars: u32,
    pub timesteps: u32,
    pub restructure: bool,
    pub script_mode: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessJsonSuite {
    pub name: String,
    pub var_type: String,
    pub failures: u32,
    pub cases: Vec<HarnessJsonCase>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessJsonCase {
    pub global: String,
    pub local: String,
    pub restructure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_samples: Option<u64>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    pub tests: u32,
    pub successes: u32,
    pub grids: Vec<HarnessJsonGrid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessJsonGrid {
    pub read_grid: String,
    pub read_local: String,
    pub write_command: String,
    pub write_exit_code: Option<i32>,
    pub reads: Vec<HarnessJsonRead>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessJsonRead {
    pub timestep: u32,
    pub variable: u32,
    pub command: String,
    pub executed: bool,
    pub correct: Option<i64>,
    pub incorrect: Option<i64>,
    pub passed: bool,
}

#[derive(Serialize)]
pub struct HarnessJsonSummary {
    pub tests: u32,
    pub successes: u32,
    pub failures: u32,
}

// ============================================================================
// Builder
// ============================================================================

pub fn build_harness_json(
    config: &HarnessConfig,
    wcores: u32,
    rcores: u32,
    script_mode: bool,
    suites: &[SuiteOutcome],
    command_line: &str,
    began: String,
) -> HarnessJsonDocument {
    let parameters = HarnessJsonParameters {
        mpirun: config.mpirun.clone(),
        write_executable: config.write_executable.display().to_string(),
        read_executable: config.read_executable.display().to_string(),
        wcores,
        rcores,
        patch_size: config.patch_size.to_string(),
        var_types: config.var_types.iter().map(|v| v.to_string()).collect(),
        n_vars: config.n_vars,
        timesteps: config.timesteps,
        restructure: config.restructure,
        script_mode,
    };

    let summary = HarnessJsonSummary {
        tests: suites.iter().map(|s| s.n_tests()).sum(),
        successes: suites.iter().map(|s| s.successes()).sum(),
        failures: suites.iter().map(|s| s.failures()).sum(),
    };

    HarnessJsonDocument {
        version: env!("CARGO_PKG_VERSION").to_string(),
        began,
        command_line: command_line.to_string(),
        machine: get_machine_string(),
        parameters,
        suites: suites.iter().map(suite_to_json).collect(),
        summary,
        finished: current_time_string(),
    }
}

fn suite_to_json(suite: &SuiteOutcome) -> HarnessJsonSuite {
    HarnessJsonSuite {
        name: suite.name.to_string(),
        var_type: suite.var_type.to_string(),
        failures: suite.failures(),
        cases: suite.cases.iter().map(case_to_json).collect(),
    }
}

fn case_to_json(outcome: &CaseOutcome) -> HarnessJsonCase {
    let case = &outcome.case;
    HarnessJsonCase {
        global: case.global.to_string(),
        local: case.local.to_string(),
        restructure: case.restructure.to_string(),
        label: case.label.map(str::to_string),
        expected_samples: case.expected_samples().ok(),
        valid: outcome.invalid.is_none(),
        invalid_reason: outcome.invalid.as_ref().map(|i| i.to_string()),
        tests: outcome.n_tests(),
        successes: outcome.successes(),
        grids: outcome.grids.iter().map(grid_to_json).collect(),
    }
}

fn grid_to_json(run: &GridRun) -> HarnessJsonGrid {
    HarnessJsonGrid {
        read_grid: run.read_grid.to_string(),
        read_local: run.read_local.to_string(),
        write_command: run.write_command.clone(),
        write_exit_code: run.write_exit_code,
        reads: run.reads.iter().map(read_to_json).collect(),
    }
}

fn read_to_json(read: &ReadOutcome) -> HarnessJsonRead {
    HarnessJsonRead {
        timestep: read.timestep,
        variable: read.variable,
        command: read.command.clone(),
        executed: read.verdict.is_some(),
        correct: read.verdict.map(|v| v.counts.correct),
        incorrect: read.verdict.map(|v| v.counts.incorrect),
        passed: read.passed(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn current_time_string() -> String {
    unsafe {
        let mut t: libc::time_t = 0;
        libc::time(&mut t);
        let tm = libc::localtime(&t);
        if tm.is_null() {
            return String::new();
        }
        let mut buf = [0u8; 64];
        let fmt = b"%a %b %d %H:%M:%S %Y\0";
        let len = libc::strftime(
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
            fmt.as_ptr() as *const libc::c_char,
            tm,
        );
        String::from_utf8_lossy(&buf[..len]).to_string()
    }
}

pub fn get_machine_string() -> String {
    unsafe {
        let mut uts: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut uts) != 0 {
            return String::new();
        }
        let nodename = std::ffi::CStr::from_ptr(uts.nodename.as_ptr());
        let sysname = std::ffi::CStr::from_ptr(uts.sysname.as_ptr());
        let release = std::ffi::CStr::from_ptr(uts.release.as_ptr());
        format!(
            "{} {} {}",
            nodename.to_string_lossy(),
            sysname.to_string_lossy(),
            release.to_string_lossy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TestCase;
    use pidx_core::{Dims3, SampleCounts, Verdict};

    #[test]
    fn test_build_harness_json_serializes() {
        let config = HarnessConfig::default();
        let case = TestCase {
            write_procs: 8,
            read_procs: 8,
            global: Dims3::new(24, 24, 24),
            local: Dims3::new(12, 12, 12),
            restructure: Dims3::new(12, 12, 12),
            timesteps: 1,
            n_vars: 1,
            var_type: "1*float32".parse().unwrap(),
            label: None,
        };
        let suite = SuiteOutcome {
            name: "pow2",
            var_type: case.var_type.clone(),
            cases: vec![CaseOutcome {
                case,
                invalid: None,
                grids: vec![GridRun {
                    read_grid: Dims3::new(2, 2, 2),
                    read_local: Dims3::new(12, 12, 12),
                    write_command: "mpirun -np 8 idx_write".into(),
                    write_exit_code: Some(0),
                    reads: vec![ReadOutcome {
                        timestep: 1,
                        variable: 0,
                        command: "mpirun -np 8 idx_read".into(),
                        verdict: Some(Verdict::new(
                            13824,
                            SampleCounts { correct: 13824, incorrect: 0 },
                        )),
                    }],
                }],
            }],
        };

        let command = "pidx-test -w 8";
        let doc = build_harness_json(&config, 8, 8, false, &[suite], command, String::new());
        assert_eq!(doc.summary.tests, 1);
        assert_eq!(doc.summary.failures, 0);

        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"patchSize\": \"12x12x12\""));
        assert!(json.contains("\"expectedSamples\": 13824"));
        assert!(!json.contains("invalidReason"));
    }
}
