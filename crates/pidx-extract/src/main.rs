mod cli;
mod json_output;
mod parser;
mod report;
mod runner;

use std::process::ExitCode;

use clap::Parser;
use pidx_core::HarnessError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), HarnessError> {
    // Save command line for JSON output
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let began = json_output::current_time_string();

    if args.output.is_file() {
        warn!("{} already exists, overwriting", args.output.display());
    }

    let aggregate = runner::aggregate(&args.input_dir, args.continue_on_error)?;
    report::write_table_file(&args.output, &aggregate.rows)?;

    if args.summary {
        report::print_summary(&aggregate.rows, aggregate.skipped.len());
    }

    // JSON output
    if let Some(ref path) = args.json_file {
        let doc = json_output::build_extract_json(
            &args.input_dir.display().to_string(),
            &aggregate.rows,
            &aggregate.skipped,
            &command_line,
            began,
        );
        match serde_json::to_string_pretty(&doc) {
            Ok(json_str) => {
                std::fs::write(path, &json_str).map_err(|e| HarnessError::file(path, e))?;
            }
            Err(e) => eprintln!("ERROR: failed to serialize JSON: {}", e),
        }
    }

    Ok(())
}

/// Map `-v` occurrences to a tracing filter; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pidx_extract={level},pidx_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
