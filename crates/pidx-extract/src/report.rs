use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pidx_core::HarnessError;
use serde::Serialize;

use crate::parser::BenchmarkLog;

/// Column header of the aggregated table.
pub const TABLE_HEADER: &str = "#       core    g_x_g_y_g_z_v#  Bx*By*Bz      BPF_BPB     FC      AF      AC      x*y*z    Time(m)        Thpt(m)       Thpt(max)        Create(m)      rst(m)   brst(m)  hz(m)   agg(m)  io(m)";

/// Mean, population standard deviation and max of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub stddev: f64,
    pub max: f64,
}

impl SummaryStats {
    /// An empty series yields NaN for every field.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: f64::NAN,
                stddev: f64::NAN,
                max: f64::NAN,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            mean,
            stddev: variance.sqrt(),
            max,
        }
    }
}

/// Statistics for every timing series of one log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub time: SummaryStats,
    pub throughput: SummaryStats,
    pub file_create: SummaryStats,
    pub restructure: SummaryStats,
    pub block_restructure: SummaryStats,
    pub hz: SummaryStats,
    pub aggregation: SummaryStats,
    pub io: SummaryStats,
}

impl LogSummary {
    pub fn from_log(log: &BenchmarkLog) -> Self {
        let s = &log.series;
        Self {
            time: SummaryStats::compute(&s.time),
            throughput: SummaryStats::compute(&s.throughput),
            file_create: SummaryStats::compute(&s.file_create),
            restructure: SummaryStats::compute(&s.restructure),
            block_restructure: SummaryStats::compute(&s.block_restructure),
            hz: SummaryStats::compute(&s.hz),
            aggregation: SummaryStats::compute(&s.aggregation),
            io: SummaryStats::compute(&s.io),
        }
    }
}

/// Six decimals, `nan` for missing data.
fn fixed(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// One table row, without the trailing newline.
pub fn format_row(log: &BenchmarkLog, summary: &LogSummary) -> String {
    let g = &log.global;
    let l = &log.layout;
    let r = &log.restructure_box;

    let values = [
        summary.time.mean,
        summary.throughput.mean,
        summary.throughput.max,
        summary.file_create.mean,
        summary.restructure.mean,
        summary.block_restructure.mean,
        summary.hz.mean,
        summary.aggregation.mean,
        summary.io.mean,
    ];
    let values: Vec<String> = values.into_iter().map(fixed).collect();

    format!(
        "{}  {}  {}x{}x{}x{} {}x{}x{}   {}x{}      {}      {}      {} {}x{}x{}        {}",
        log.iterations,
        g.cores,
        g.extent[0],
        g.extent[1],
        g.extent[2],
        g.variables,
        r[0],
        r[1],
        r[2],
        l.blocks_per_file,
        l.bits_per_block,
        l.file_count,
        l.aggregator_factor,
        l.aggregator_count,
        g.idx_box[0],
        g.idx_box[1],
        g.idx_box[2],
        values.join("      "),
    )
}

/// Write the header followed by one row per log.
pub fn write_table<W: Write>(
    out: &mut W,
    rows: &[(BenchmarkLog, LogSummary)],
) -> std::io::Result<()> {
    writeln!(out, "{}", TABLE_HEADER)?;
    for (log, summary) in rows {
        writeln!(out, "{}", format_row(log, summary))?;
    }
    Ok(())
}

pub fn write_table_file(
    path: &Path,
    rows: &[(BenchmarkLog, LogSummary)],
) -> Result<(), HarnessError> {
    let file = File::create(path).map_err(|e| HarnessError::file(path, e))?;
    let mut out = BufWriter::new(file);
    write_table(&mut out, rows)
        .and_then(|_| out.flush())
        .map_err(|e| HarnessError::file(path, e))
}

/// Per-file summary on stdout.
pub fn print_summary(rows: &[(BenchmarkLog, LogSummary)], skipped: usize) {
    println!();
    println!(
        "{:<32} {:>6} {:>14} {:>14} {:>14}",
        "file", "iters", "time(mean)", "thpt(mean)", "thpt(max)"
    );
    for (log, summary) in rows {
        let name = log
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<32} {:>6} {:>14} {:>14} {:>14}",
            name,
            log.iterations,
            fixed(summary.time.mean),
            fixed(summary.throughput.mean),
            fixed(summary.throughput.max),
        );
    }
    if skipped > 0 {
        println!("{} file(s) skipped", skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{SAMPLE_LOG, parse_str};

    #[test]
    fn test_population_stddev() {
        let stats = SummaryStats::compute(&[2.0, 4.0]);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.stddev, 1.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn test_single_value_has_zero_stddev() {
        let stats = SummaryStats::compute(&[7.5]);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.max, 7.5);
    }

    #[test]
    fn test_empty_series_is_nan() {
        let stats = SummaryStats::compute(&[]);
        assert!(stats.mean.is_nan());
        assert!(stats.stddev.is_nan());
        assert!(stats.max.is_nan());
    }

    #[test]
    fn test_row_layout() {
        let log = parse_str(SAMPLE_LOG).unwrap();
        let summary = LogSummary::from_log(&log);
        let row = format_row(&log, &summary);
        assert_eq!(
            row,
            "2  64  256x256x256x1 32x32x32   256x15      4      1      64 2x2x2        \
             3.000000      200.000000      300.000000      0.020000      2.000000      \
             3.000000      4.000000      5.000000      6.000000"
        );
    }

    #[test]
    fn test_missing_samples_print_nan() {
        assert_eq!(fixed(f64::NAN), "nan");
        assert_eq!(fixed(0.5), "0.500000");
    }

    #[test]
    fn test_write_table_starts_with_header() {
        let log = parse_str(SAMPLE_LOG).unwrap();
        let summary = LogSummary::from_log(&log);
        let mut out = Vec::new();
        write_table(&mut out, &[(log, summary)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(TABLE_HEADER));
        assert!(lines.next().unwrap().starts_with("2  64  "));
        assert_eq!(lines.next(), None);
    }
}
