use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use pidx_core::HarnessError;
use tracing::{debug, info, warn};

use crate::parser::{BenchmarkLog, parse_log};
use crate::report::LogSummary;

/// Result of aggregating one input directory.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub rows: Vec<(BenchmarkLog, LogSummary)>,
    /// File name and error of every log skipped with `continue_on_error`.
    pub skipped: Vec<(String, String)>,
}

/// Regular, non-hidden files directly under `dir`, sorted by name.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let entries = fs::read_dir(dir).map_err(|e| HarnessError::file(dir, e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::file(dir, e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden {
            continue;
        }
        // Follows symlinks
        let path = entry.path();
        if path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

pub fn parse_file(path: &Path) -> Result<BenchmarkLog, HarnessError> {
    let file = File::open(path).map_err(|e| HarnessError::file(path, e))?;
    parse_log(BufReader::new(file), path)
}

/// Parse every log under `dir`. Without `continue_on_error` the first bad
/// log aborts the run.
pub fn aggregate(dir: &Path, continue_on_error: bool) -> Result<Aggregate, HarnessError> {
    let mut result = Aggregate::default();

    for path in collect_inputs(dir)? {
        info!("{}", path.display());
        match parse_file(&path) {
            Ok(log) => {
                debug!(
                    file = %path.display(),
                    iterations = log.iterations,
                    "parsed benchmark log"
                );
                let summary = LogSummary::from_log(&log);
                result.rows.push((log, summary));
            }
            Err(e) if continue_on_error => {
                warn!("skipping {}: {}", path.display(), e);
                result.skipped.push((path.display().to_string(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::SAMPLE_LOG;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_inputs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.log", SAMPLE_LOG);
        write(dir.path(), "a.log", SAMPLE_LOG);
        write(dir.path(), ".hidden", SAMPLE_LOG);
        fs::create_dir(dir.path().join("nested")).unwrap();

        let inputs = collect_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.log", "b.log"]);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(collect_inputs(&missing), Err(HarnessError::File { .. })));
    }

    #[test]
    fn test_bad_log_aborts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.log", SAMPLE_LOG);
        write(dir.path(), "b.log", "nothing useful here\n");

        match aggregate(dir.path(), false) {
            Err(HarnessError::MissingMarker { path, .. }) => {
                assert_eq!(path.file_name().unwrap(), "b.log");
            }
            other => panic!("expected MissingMarker, got {other:?}"),
        }
    }

    #[test]
    fn test_continue_on_error_skips_bad_log() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.log", SAMPLE_LOG);
        write(dir.path(), "b.log", "nothing useful here\n");
        write(dir.path(), "c.log", SAMPLE_LOG);

        let result = aggregate(dir.path(), true).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].0.ends_with("b.log"));
        assert_eq!(result.rows[0].0.iterations, 2);
    }
}
