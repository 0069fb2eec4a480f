use pidx_core::{HarnessConfig, InvalidDecomposition, VarType};

use crate::runner::{ReadOutcome, SuiteOutcome};

/// Print the effective configuration.
pub fn print_config(config: &HarnessConfig, wcores: u32, rcores: u32, launcher: &str) {
    println!("pidx-test");
    println!("  launcher       = {} ({})", config.mpirun, launcher);
    println!("  write_exe      = {}", config.write_executable.display());
    println!("  read_exe       = {}", config.read_executable.display());
    println!("  wcores         = {}", wcores);
    println!("  rcores         = {}", rcores);
    println!("  patch_size     = {}", config.patch_size);
    println!("  n_vars         = {}", config.n_vars);
    println!("  timesteps      = {}", config.timesteps);
    let types: Vec<String> = config.var_types.iter().map(|v| v.to_string()).collect();
    println!("  var_types      = {}", types.join(", "));
    println!("  non_pow2       = {}", config.non_pow2);
    println!("  restructure    = {}", config.restructure);
    println!();
}

pub fn print_invalid(invalid: &InvalidDecomposition) {
    println!("{}", invalid);
}

/// Failure lines for one read run.
pub fn print_read_failure(read: &ReadOutcome, var_type: &VarType) {
    if let Some(ref verdict) = read.verdict {
        println!("{}", verdict.failure_message());
    }
    println!(
        "Test t={} v={} type={} FAILED",
        read.timestep, read.variable, var_type
    );
}

pub fn print_success_ratio(successes: u32, n_tests: u32) {
    println!("Success {}/{}", successes, n_tests);
}

/// Totals over every suite that ran.
pub fn print_summary(suites: &[SuiteOutcome], executed: bool) {
    if suites.is_empty() {
        return;
    }

    println!();
    println!("Summary of all suites:");
    println!(
        "{:<10} {:<12} {:>7} {:>7} {:>9} {:>9}",
        "suite", "type", "cases", "tests", "success", "failures"
    );
    println!(
        "{:<10} {:<12} {:>7} {:>7} {:>9} {:>9}",
        "-----", "----", "-----", "-----", "-------", "--------"
    );
    for suite in suites {
        println!(
            "{:<10} {:<12} {:>7} {:>7} {:>9} {:>9}",
            suite.name,
            suite.var_type.to_string(),
            suite.cases.len(),
            suite.n_tests(),
            suite.successes(),
            suite.failures(),
        );
    }

    let failures: u32 = suites.iter().map(|s| s.failures()).sum();
    if !executed {
        println!("Commands recorded, nothing executed");
    } else if failures == 0 {
        println!("ALL TESTS PASSED");
    } else {
        println!("{} test(s) FAILED", failures);
    }
}
