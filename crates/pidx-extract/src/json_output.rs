use serde::Serialize;

use crate::parser::BenchmarkLog;
use crate::report::LogSummary;

// ============================================================================
// JSON document structures
// ============================================================================

#[derive(Serialize)]
pub struct ExtractJsonDocument {
    pub version: String,
    pub began: String,
    pub command_line: String,
    pub machine: String,
    pub input_dir: String,
    pub logs: Vec<ExtractJsonLog>,
    pub skipped: Vec<ExtractJsonSkipped>,
    pub finished: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractJsonLog {
    pub file: String,
    pub iterations: usize,
    pub cores: String,
    pub global: String,
    pub variables: String,
    pub restructure_box: String,
    pub blocks_per_file: String,
    pub bits_per_block: String,
    pub file_count: String,
    pub aggregator_factor: String,
    pub aggregator_count: String,
    pub idx_count: String,
    pub idx_box: String,
    /// Non-finite statistics serialize as `null`.
    pub stats: LogSummary,
}

#[derive(Serialize)]
pub struct ExtractJsonSkipped {
    pub file: String,
    pub error: String,
}

// ============================================================================
// Builder
// ============================================================================

pub fn build_extract_json(
    input_dir: &str,
    rows: &[(BenchmarkLog, LogSummary)],
    skipped: &[(String, String)],
    command_line: &str,
    began: String,
) -> ExtractJsonDocument {
    ExtractJsonDocument {
        version: env!("CARGO_PKG_VERSION").to_string(),
        began,
        command_line: command_line.to_string(),
        machine: get_machine_string(),
        input_dir: input_dir.to_string(),
        logs: rows.iter().map(|(log, summary)| log_to_json(log, summary)).collect(),
        skipped: skipped
            .iter()
            .map(|(file, error)| ExtractJsonSkipped {
                file: file.clone(),
                error: error.clone(),
            })
            .collect(),
        finished: current_time_string(),
    }
}

fn log_to_json(log: &BenchmarkLog, summary: &LogSummary) -> ExtractJsonLog {
    let g = &log.global;
    let l = &log.layout;
    ExtractJsonLog {
        file: log.path.display().to_string(),
        iterations: log.iterations,
        cores: g.cores.clone(),
        global: g.extent.join("x"),
        variables: g.variables.clone(),
        restructure_box: log.restructure_box.join("x"),
        blocks_per_file: l.blocks_per_file.clone(),
        bits_per_block: l.bits_per_block.clone(),
        file_count: l.file_count.clone(),
        aggregator_factor: l.aggregator_factor.clone(),
        aggregator_count: l.aggregator_count.clone(),
        idx_count: g.idx_count.clone(),
        idx_box: g.idx_box.join("x"),
        stats: *summary,
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

fn get_machine_string() -> String {
    unsafe {
        let mut uts: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut uts) != 0 {
            return String::new();
        }
        let nodename = std::ffi::CStr::from_ptr(uts.nodename.as_ptr());
        let sysname = std::ffi::CStr::from_ptr(uts.sysname.as_ptr());
        format!("{} {}", nodename.to_string_lossy(), sysname.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{SAMPLE_LOG, parse_str};

    #[test]
    fn test_build_extract_json_serializes() {
        let log = parse_str(SAMPLE_LOG).unwrap();
        let summary = LogSummary::from_log(&log);
        let skipped = vec![("broken.log".to_string(), "missing `Global Data` line".to_string())];
        let rows = [(log, summary)];
        let command = "pidx-extract logs out";
        let doc = build_extract_json("logs", &rows, &skipped, command, String::new());

        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(json.contains("\"global\": \"256x256x256\""));
        assert!(json.contains("\"restructureBox\": \"32x32x32\""));
        assert!(json.contains("\"stddev\": 1.0"));
        assert!(json.contains("broken.log"));
    }

    #[test]
    fn test_nan_statistics_become_null() {
        let text = "\
Cores 4 Global Data 8 8 8 Variables 1 IDX Count 1 : 1 x 1 x 1
Blocks Per File 1 Bits per block 15 File Count 1 Aggregation Factor 1 Aggregator Count 4
";
        let log = parse_str(text).unwrap();
        let summary = LogSummary::from_log(&log);
        let doc = build_extract_json("logs", &[(log, summary)], &[], "", String::new());
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value["logs"][0]["stats"]["time"]["mean"].is_null());
    }
}
