use std::path::PathBuf;

use clap::Parser;

/// Aggregate PIDX benchmark logs into one plotting table.
///
/// Every regular, non-hidden file in INPUT_DIR is parsed; each becomes one
/// row of OUTPUT with the mean timings of its non-warm-up iterations.
#[derive(Parser, Debug)]
#[command(name = "pidx-extract", about = "PIDX benchmark log aggregator")]
pub struct CliArgs {
    /// Directory holding one benchmark log per run
    pub input_dir: PathBuf,

    /// Table to write (overwritten if present)
    pub output: PathBuf,

    /// Skip logs that fail to parse instead of stopping
    #[arg(long = "continue-on-error")]
    pub continue_on_error: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print a per-file summary to stdout
    #[arg(short = 's', long = "summary")]
    pub summary: bool,

    /// Also write per-series mean/stddev/max as JSON
    #[arg(long = "json-file")]
    pub json_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let args = CliArgs::parse_from(["pidx-extract", "logs", "table.txt"]);
        assert_eq!(args.input_dir, PathBuf::from("logs"));
        assert_eq!(args.output, PathBuf::from("table.txt"));
        assert!(!args.continue_on_error);
        assert_eq!(args.verbose, 0);
        assert!(args.json_file.is_none());
    }

    #[test]
    fn test_optional_flags() {
        let args = CliArgs::parse_from([
            "pidx-extract",
            "-vv",
            "--continue-on-error",
            "--json-file",
            "stats.json",
            "logs",
            "table.txt",
        ]);
        assert!(args.continue_on_error);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.json_file, Some(PathBuf::from("stats.json")));
    }

    #[test]
    fn test_output_required() {
        assert!(CliArgs::try_parse_from(["pidx-extract", "logs"]).is_err());
    }
}
