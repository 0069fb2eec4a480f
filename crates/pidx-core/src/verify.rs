use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::HarnessError;

/// Marker the read executable prints after checking every sample.
pub const SAMPLE_COUNT_MARKER: &str = "Correct Sample Count";

/// Correct/incorrect sample counts reported by one read run.
///
/// `incorrect == -1` means no marker line was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCounts {
    pub correct: i64,
    pub incorrect: i64,
}

impl Default for SampleCounts {
    fn default() -> Self {
        Self {
            correct: 0,
            incorrect: -1,
        }
    }
}

impl SampleCounts {
    /// A read passes when every expected sample was correct and none were wrong.
    pub fn passes(&self, expected: u64) -> bool {
        self.correct >= 0 && self.correct as u64 == expected && self.incorrect == 0
    }
}

/// Decode one marker line, e.g. `Correct Sample Count 1728 Incorrect Sample Count 0`.
pub fn parse_marker_line(line: &str) -> Option<SampleCounts> {
    if !line.contains(SAMPLE_COUNT_MARKER) {
        return None;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let correct = words.get(3)?.parse().ok()?;
    let incorrect = words.get(7)?.parse().ok()?;
    Some(SampleCounts { correct, incorrect })
}

/// Scan output for the marker; the last marker line wins.
pub fn scan_sample_counts<R: BufRead>(reader: R) -> Result<SampleCounts, HarnessError> {
    let mut counts = SampleCounts::default();
    for line in reader.lines() {
        if let Some(c) = parse_marker_line(&line?) {
            counts = c;
        }
    }
    Ok(counts)
}

/// Same as [`scan_sample_counts`] on in-memory output.
pub fn scan_output(output: &str) -> SampleCounts {
    output
        .lines()
        .filter_map(parse_marker_line)
        .last()
        .unwrap_or_default()
}

/// Scan a log file for the marker.
pub fn scan_file(path: &Path) -> Result<SampleCounts, HarnessError> {
    let file = File::open(path).map_err(|e| HarnessError::file(path, e))?;
    scan_sample_counts(BufReader::new(file)).map_err(|e| match e {
        HarnessError::Io(source) => HarnessError::file(path, source),
        other => other,
    })
}

/// Outcome of verifying one read run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub expected: u64,
    pub counts: SampleCounts,
}

impl Verdict {
    pub fn new(expected: u64, counts: SampleCounts) -> Self {
        Self { expected, counts }
    }

    pub fn passed(&self) -> bool {
        self.counts.passes(self.expected)
    }

    /// Failure line in the form the harness has always printed.
    pub fn failure_message(&self) -> String {
        format!(
            "Test FAILED: count {} correct {} incorrect {}",
            self.expected, self.counts.correct, self.counts.incorrect
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_marker_line() {
        let c = parse_marker_line("Correct Sample Count 1728 Incorrect Sample Count 0").unwrap();
        assert_eq!(c, SampleCounts { correct: 1728, incorrect: 0 });
        assert!(parse_marker_line("Time Taken 1.0").is_none());
        assert!(parse_marker_line("Correct Sample Count").is_none());
    }

    #[test]
    fn test_last_marker_wins() {
        let out = "noise\n\
                   Correct Sample Count 10 Incorrect Sample Count 5\n\
                   more noise\n\
                   Correct Sample Count 1728 Incorrect Sample Count 0\n";
        assert_eq!(scan_output(out), SampleCounts { correct: 1728, incorrect: 0 });
        let counts = scan_sample_counts(Cursor::new(out)).unwrap();
        assert!(counts.passes(1728));
    }

    #[test]
    fn test_missing_marker_fails() {
        let counts = scan_output("the reader crashed\n");
        assert_eq!(counts, SampleCounts { correct: 0, incorrect: -1 });
        assert!(!counts.passes(0));

        let v = Verdict::new(1728, counts);
        assert!(!v.passed());
        assert_eq!(v.failure_message(), "Test FAILED: count 1728 correct 0 incorrect -1");
    }

    #[test]
    fn test_wrong_counts_fail() {
        assert!(!SampleCounts { correct: 1727, incorrect: 0 }.passes(1728));
        assert!(!SampleCounts { correct: 1728, incorrect: 1 }.passes(1728));
    }

    #[test]
    fn test_scan_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_out_read.txt");
        std::fs::write(&path, "Correct Sample Count 64 Incorrect Sample Count 0\n").unwrap();
        assert!(scan_file(&path).unwrap().passes(64));
        assert!(scan_file(&dir.path().join("missing")).is_err());
    }
}
