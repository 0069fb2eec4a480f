use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Marker that tags PIDX per-phase profiling lines.
pub const PROFILE_MARKER: &str = "IRPIWCCHHAI";

/// Profile output files derived from a `-p` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFiles {
    pub write: PathBuf,
    pub read: PathBuf,
}

impl ProfileFiles {
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            write: PathBuf::from(format!("{prefix}_write.prof")),
            read: PathBuf::from(format!("{prefix}_read.prof")),
        }
    }

    /// Remove profiles left over from a previous run.
    pub fn reset(&self) -> Result<(), HarnessError> {
        for path in [&self.write, &self.read] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(HarnessError::file(path, e)),
            }
        }
        Ok(())
    }
}

/// Append every profiling line of `output` to `profile`. Returns the number of lines copied.
pub fn append_profile(output: &str, profile: &Path) -> Result<usize, HarnessError> {
    let lines: Vec<&str> = output
        .lines()
        .filter(|line| line.contains(PROFILE_MARKER))
        .collect();
    if lines.is_empty() {
        return Ok(0);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(profile)
        .map_err(|e| HarnessError::file(profile, e))?;
    for line in &lines {
        writeln!(file, "{line}").map_err(|e| HarnessError::file(profile, e))?;
    }

    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prefix() {
        let p = ProfileFiles::from_prefix("run1");
        assert_eq!(p.write, PathBuf::from("run1_write.prof"));
        assert_eq!(p.read, PathBuf::from("run1_read.prof"));
    }

    #[test]
    fn test_append_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("prof");
        let files = ProfileFiles::from_prefix(prefix.to_str().unwrap());

        let out = "startup\nIRPIWCCHHAI 0.1 0.2\nnoise\nIRPIWCCHHAI 0.3 0.4\n";
        assert_eq!(append_profile(out, &files.write).unwrap(), 2);
        assert_eq!(append_profile(out, &files.write).unwrap(), 2);
        assert_eq!(append_profile("nothing here\n", &files.read).unwrap(), 0);
        assert!(!files.read.exists());

        let text = fs::read_to_string(&files.write).unwrap();
        assert_eq!(text.lines().count(), 4);

        files.reset().unwrap();
        assert!(!files.write.exists());
        // resetting twice is fine
        files.reset().unwrap();
    }
}
