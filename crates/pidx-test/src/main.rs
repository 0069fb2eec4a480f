mod cli;
mod json_output;
mod report;
mod runner;

use std::process::ExitCode;

use clap::Parser;
use pidx_core::{HarnessError, Launcher, ProcessLauncher, ProfileFiles, ScriptLauncher};
use tracing_subscriber::EnvFilter;

use cli::CliArgs;
use runner::Harness;

/// Exit code for setup problems (bad arguments, missing executables).
const EXIT_SETUP: u8 = 2;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let (filtered_args, launch_options) = pidx_core::extract_launch_options(raw_args);
    let args = CliArgs::parse_from(filtered_args);

    init_logging(args.verbose);

    let result = run(&args, launch_options.launcher_args());
    if let Err(ref e) = result {
        eprintln!("ERROR: {}", e);
        if let HarnessError::UnknownProcessCount { available, .. } = e {
            eprintln!("Procs configuration not available use one these: {:?}", available);
            eprintln!("Or add a new configuration to the harness config file");
        }
    }
    ExitCode::from(exit_code(&result))
}

/// Failed test count clamped to 255; any error is a setup failure.
fn exit_code(result: &Result<u32, HarnessError>) -> u8 {
    match result {
        Ok(failures) => u8::try_from(*failures).unwrap_or(u8::MAX),
        Err(_) => EXIT_SETUP,
    }
}

/// Run every configured suite. Returns the number of failed tests.
fn run(args: &CliArgs, launcher_args: Vec<String>) -> Result<u32, HarnessError> {
    // Extract JSON flags
    let json_stdout = args.json;
    let json_mode = json_stdout || args.json_file.is_some();
    let print_text = !json_stdout;

    // Save command line for JSON output
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");

    let mut config = args.build_config()?;
    config.resolve_executables()?;

    // Both process counts must be in the grid table before anything runs
    config.procs.grids(args.wcores)?;
    config.procs.grids(args.rcores)?;

    let launcher: Box<dyn Launcher> = if args.travis {
        if print_text {
            println!("----RUNNING IN TRAVIS TEST MODE----");
        }
        Box::new(ScriptLauncher::create(&config.script_path)?)
    } else {
        Box::new(ProcessLauncher::new(&config.write_log, &config.read_log))
    };

    let profile = args.pfile.as_deref().map(ProfileFiles::from_prefix);
    if let Some(ref files) = profile {
        files.reset()?;
    }

    if print_text {
        report::print_config(&config, args.wcores, args.rcores, launcher.name());
    }

    let began = json_output::current_time_string();
    let harness = Harness::new(&config, launcher.as_ref())
        .with_launcher_args(launcher_args)
        .with_profile(profile)
        .print_text(print_text);

    let mut suites = Vec::new();
    for var_type in &config.var_types {
        suites.push(harness.pow_2(
            args.wcores,
            args.rcores,
            var_type,
            config.n_vars,
            config.timesteps,
        )?);
        if config.non_pow2 {
            suites.push(harness.non_pow_2(
                args.wcores,
                args.rcores,
                var_type,
                config.n_vars,
                config.timesteps,
            )?);
        }
    }

    if print_text {
        report::print_summary(&suites, launcher.executes());
    }

    // JSON output
    if json_mode {
        let doc = json_output::build_harness_json(
            &config,
            args.wcores,
            args.rcores,
            args.travis,
            &suites,
            &command_line,
            began,
        );
        match serde_json::to_string_pretty(&doc) {
            Ok(json_str) => {
                if json_stdout {
                    println!("{}", json_str);
                }
                if let Some(ref path) = args.json_file {
                    std::fs::write(path, &json_str)
                        .unwrap_or_else(|e| eprintln!("ERROR: failed to write JSON file: {}", e));
                }
            }
            Err(e) => eprintln!("ERROR: failed to serialize JSON: {}", e),
        }
    }

    Ok(suites.iter().map(|s| s.failures()).sum())
}

/// Map `-v` occurrences to a tracing filter; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pidx_test={level},pidx_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_counts_failures() {
        assert_eq!(exit_code(&Ok(0)), 0);
        assert_eq!(exit_code(&Ok(3)), 3);
        assert_eq!(exit_code(&Ok(255)), 255);
    }

    #[test]
    fn test_exit_code_clamps_instead_of_wrapping() {
        assert_eq!(exit_code(&Ok(256)), 255);
        assert_eq!(exit_code(&Ok(512)), 255);
        assert_eq!(exit_code(&Ok(u32::MAX)), 255);
    }

    #[test]
    fn test_exit_code_for_setup_errors() {
        let unknown = HarnessError::UnknownProcessCount {
            count: 7,
            available: vec![4, 8],
        };
        assert_eq!(exit_code(&Err(unknown)), EXIT_SETUP);

        let missing = HarnessError::ExecutableNotFound {
            role: "write",
            path: "/nonexistent/idx_write".into(),
        };
        assert_eq!(exit_code(&Err(missing)), 2);
    }
}
