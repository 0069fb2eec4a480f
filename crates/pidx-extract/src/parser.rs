use std::io::BufRead;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use pidx_core::HarnessError;
use tracing::trace;

pub const BLOCKS_PER_FILE: &str = "Blocks Per File";
pub const RESTRUCTURING_SIZE: &str = "Blocks Restructuring Size";
pub const GLOBAL_DATA: &str = "Global Data";
pub const FILE_CREATE: &str = "File Create time";
pub const WRITE_TIME: &str = "Write time";
pub const TIME_TAKEN: &str = "Time Taken";

bitflags! {
    /// Markers encountered so far in one log.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SeenMarkers: u8 {
        const BLOCKS_PER_FILE = 1 << 0;
        const RESTRUCTURING   = 1 << 1;
        const GLOBAL_DATA     = 1 << 2;
        const FILE_CREATE     = 1 << 3;
        const WRITE_TIME      = 1 << 4;
        const TIME_TAKEN      = 1 << 5;

        const REQUIRED = Self::BLOCKS_PER_FILE.bits() | Self::GLOBAL_DATA.bits();
    }
}

/// File layout fields from the `Blocks Per File` line, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockLayout {
    pub blocks_per_file: String,
    pub bits_per_block: String,
    pub file_count: String,
    pub aggregator_factor: String,
    pub aggregator_count: String,
}

/// Problem-size fields from the `Global Data` line, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalData {
    pub cores: String,
    pub extent: [String; 3],
    pub variables: String,
    pub idx_count: String,
    pub idx_box: [String; 3],
}

/// Timing samples after the warm-up iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSeries {
    pub time: Vec<f64>,
    pub throughput: Vec<f64>,
    pub file_create: Vec<f64>,
    pub restructure: Vec<f64>,
    pub block_restructure: Vec<f64>,
    pub hz: Vec<f64>,
    pub aggregation: Vec<f64>,
    pub io: Vec<f64>,
}

/// Everything pulled out of one benchmark log.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkLog {
    pub path: PathBuf,
    pub layout: BlockLayout,
    pub restructure_box: [String; 3],
    pub global: GlobalData,
    pub series: TimingSeries,
    /// Number of kept `Time Taken` lines.
    pub iterations: usize,
}

/// Word-level view of one marker line.
struct MarkerLine<'a> {
    path: &'a Path,
    line_no: usize,
    marker: &'static str,
    words: Vec<&'a str>,
}

impl<'a> MarkerLine<'a> {
    fn new(path: &'a Path, line_no: usize, marker: &'static str, line: &'a str) -> Self {
        Self {
            path,
            line_no,
            marker,
            words: line.split_whitespace().collect(),
        }
    }

    fn word(&self, index: usize) -> Result<&'a str, HarnessError> {
        self.words.get(index).copied().ok_or_else(|| HarnessError::LogParse {
            path: self.path.to_path_buf(),
            line: self.line_no,
            reason: format!(
                "'{}' line has {} words, expected at least {}",
                self.marker,
                self.words.len(),
                index + 1
            ),
        })
    }

    fn text(&self, index: usize) -> Result<String, HarnessError> {
        self.word(index).map(str::to_string)
    }

    fn number(&self, index: usize) -> Result<f64, HarnessError> {
        let word = self.word(index)?;
        word.parse::<f64>().map_err(|_| HarnessError::LogParse {
            path: self.path.to_path_buf(),
            line: self.line_no,
            reason: format!("'{}' field {} is not a number: {:?}", self.marker, index, word),
        })
    }
}

/// Parse one benchmark log. `path` only labels errors.
pub fn parse_log<R: BufRead>(reader: R, path: &Path) -> Result<BenchmarkLog, HarnessError> {
    let mut seen = SeenMarkers::empty();
    let mut layout = BlockLayout::default();
    let mut global = GlobalData::default();
    let mut restructure_box = ["1".to_string(), "1".to_string(), "1".to_string()];
    let mut series = TimingSeries::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| HarnessError::file(path, e))?;
        let line_no = idx + 1;

        // A line may carry more than one marker; each is handled independently.
        if line.contains(BLOCKS_PER_FILE) {
            let m = MarkerLine::new(path, line_no, BLOCKS_PER_FILE, &line);
            layout = BlockLayout {
                blocks_per_file: m.text(3)?,
                bits_per_block: m.text(7)?,
                file_count: m.text(10)?,
                aggregator_factor: m.text(13)?,
                aggregator_count: m.text(16)?,
            };
            seen |= SeenMarkers::BLOCKS_PER_FILE;
        }

        if line.contains(RESTRUCTURING_SIZE) {
            let m = MarkerLine::new(path, line_no, RESTRUCTURING_SIZE, &line);
            restructure_box = [m.text(3)?, m.text(4)?, m.text(5)?];
            seen |= SeenMarkers::RESTRUCTURING;
        }

        if line.contains(GLOBAL_DATA) {
            let m = MarkerLine::new(path, line_no, GLOBAL_DATA, &line);
            global = GlobalData {
                cores: m.text(1)?,
                extent: [m.text(4)?, m.text(5)?, m.text(6)?],
                variables: m.text(8)?,
                idx_count: m.text(11)?,
                idx_box: [m.text(13)?, m.text(15)?, m.text(17)?],
            };
            seen |= SeenMarkers::GLOBAL_DATA;
        }

        if line.contains(FILE_CREATE) && !warm_up(&mut seen, SeenMarkers::FILE_CREATE) {
            let m = MarkerLine::new(path, line_no, FILE_CREATE, &line);
            series.file_create.push(m.number(6)?);
        }

        if line.contains(WRITE_TIME) && !warm_up(&mut seen, SeenMarkers::WRITE_TIME) {
            let m = MarkerLine::new(path, line_no, WRITE_TIME, &line);
            series.restructure.push(m.number(11)?);
            series.block_restructure.push(m.number(13)?);
            series.hz.push(m.number(15)?);
            series.aggregation.push(m.number(17)?);
            series.io.push(m.number(19)?);
        }

        if line.contains(TIME_TAKEN) && !warm_up(&mut seen, SeenMarkers::TIME_TAKEN) {
            let m = MarkerLine::new(path, line_no, TIME_TAKEN, &line);
            series.time.push(m.number(2)?);
            series.throughput.push(m.number(5)?);
            trace!(line = line_no, "kept timing sample");
        }
    }

    if !seen.contains(SeenMarkers::BLOCKS_PER_FILE) {
        return Err(HarnessError::MissingMarker {
            path: path.to_path_buf(),
            marker: BLOCKS_PER_FILE,
        });
    }
    if !seen.contains(SeenMarkers::GLOBAL_DATA) {
        return Err(HarnessError::MissingMarker {
            path: path.to_path_buf(),
            marker: GLOBAL_DATA,
        });
    }
    debug_assert!(seen.contains(SeenMarkers::REQUIRED));

    let iterations = series.time.len();
    Ok(BenchmarkLog {
        path: path.to_path_buf(),
        layout,
        restructure_box,
        global,
        series,
        iterations,
    })
}

/// Returns true for the first occurrence of `marker`, recording it as seen.
fn warm_up(seen: &mut SeenMarkers, marker: SeenMarkers) -> bool {
    let first = !seen.contains(marker);
    seen.insert(marker);
    first
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_LOG: &str = "\
Cores 64 Global Data 256 256 256 Variables 1 IDX Count 8 : 2 x 2 x 2
Blocks Per File 256 Bits per block 15 File Count 4 Aggregation Factor 1 Aggregator Count 64
Blocks Restructuring Size 32 32 32
File Create time (+ header IO) 0.500000
Write time [RST + BRST + HZ + AGG + IO] 0.1 + 0.2 + 0.3 + 0.4 + 0.5 = 1.5
Time Taken: 9.000000 Seconds [1.0]
File Create time (+ header IO) 0.010000
Write time [RST + BRST + HZ + AGG + IO] 1.0 + 2.0 + 3.0 + 4.0 + 5.0 = 15.0
Time Taken: 2.000000 Seconds Throughput 100.0 MiB/sec
File Create time (+ header IO) 0.030000
Write time [RST + BRST + HZ + AGG + IO] 3.0 + 4.0 + 5.0 + 6.0 + 7.0 = 25.0
Time Taken: 4.000000 Seconds Throughput 300.0 MiB/sec
";

    pub(crate) fn parse_str(text: &str) -> Result<BenchmarkLog, HarnessError> {
        parse_log(text.as_bytes(), Path::new("run_64.log"))
    }

    #[test]
    fn test_headers_extracted_by_word_index() {
        let log = parse_str(SAMPLE_LOG).unwrap();
        assert_eq!(log.global.cores, "64");
        assert_eq!(log.global.extent, ["256", "256", "256"]);
        assert_eq!(log.global.variables, "1");
        assert_eq!(log.global.idx_count, "8");
        assert_eq!(log.global.idx_box, ["2", "2", "2"]);
        assert_eq!(log.layout.blocks_per_file, "256");
        assert_eq!(log.layout.bits_per_block, "15");
        assert_eq!(log.layout.file_count, "4");
        assert_eq!(log.layout.aggregator_factor, "1");
        assert_eq!(log.layout.aggregator_count, "64");
        assert_eq!(log.restructure_box, ["32", "32", "32"]);
    }

    #[test]
    fn test_first_timing_occurrence_skipped() {
        let log = parse_str(SAMPLE_LOG).unwrap();
        assert_eq!(log.iterations, 2);
        assert_eq!(log.series.time, vec![2.0, 4.0]);
        assert_eq!(log.series.throughput, vec![100.0, 300.0]);
        assert_eq!(log.series.file_create, vec![0.01, 0.03]);
        assert_eq!(log.series.restructure, vec![1.0, 3.0]);
        assert_eq!(log.series.block_restructure, vec![2.0, 4.0]);
        assert_eq!(log.series.hz, vec![3.0, 5.0]);
        assert_eq!(log.series.aggregation, vec![4.0, 6.0]);
        assert_eq!(log.series.io, vec![5.0, 7.0]);
    }

    #[test]
    fn test_restructure_box_defaults_to_one() {
        let text: String = SAMPLE_LOG
            .lines()
            .filter(|l| !l.contains(RESTRUCTURING_SIZE))
            .map(|l| format!("{l}\n"))
            .collect();
        let log = parse_str(&text).unwrap();
        assert_eq!(log.restructure_box, ["1", "1", "1"]);
    }

    #[test]
    fn test_missing_global_data_is_error() {
        let text: String = SAMPLE_LOG
            .lines()
            .filter(|l| !l.contains(GLOBAL_DATA))
            .map(|l| format!("{l}\n"))
            .collect();
        match parse_str(&text) {
            Err(HarnessError::MissingMarker { marker, .. }) => assert_eq!(marker, GLOBAL_DATA),
            other => panic!("expected MissingMarker, got {other:?}"),
        }
    }

    #[test]
    fn test_short_marker_line_names_line() {
        let text = "Blocks Per File 256 Bits per block\n";
        match parse_str(text) {
            Err(HarnessError::LogParse { line, path, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(path, Path::new("run_64.log"));
            }
            other => panic!("expected LogParse, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_timing_is_error() {
        let text = format!("{SAMPLE_LOG}Time Taken: fast Seconds Throughput 1.0 MiB/sec\n");
        match parse_str(&text) {
            Err(HarnessError::LogParse { line, reason, .. }) => {
                assert_eq!(line, 13);
                assert!(reason.contains("fast"));
            }
            other => panic!("expected LogParse, got {other:?}"),
        }
    }

    #[test]
    fn test_only_warm_up_gives_empty_series() {
        let text = "\
Cores 4 Global Data 8 8 8 Variables 1 IDX Count 1 : 1 x 1 x 1
Blocks Per File 1 Bits per block 15 File Count 1 Aggregation Factor 1 Aggregator Count 4
Time Taken: 1.000000 Seconds Throughput 5.0 MiB/sec
";
        let log = parse_str(text).unwrap();
        assert_eq!(log.iterations, 0);
        assert!(log.series.time.is_empty());
    }
}
