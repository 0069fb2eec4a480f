use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dims::Dims3;
use crate::error::HarnessError;
use crate::procs::ProcsTable;
use crate::vars::VarType;

/// Test harness settings.
///
/// Defaults assume the harness runs from `tools/test` inside a PIDX build tree.
/// A JSON file may override any subset of the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    // --- Executables ---
    /// PIDX write executable
    pub write_executable: PathBuf,
    /// PIDX read executable
    pub read_executable: PathBuf,
    /// Process launcher program
    pub mpirun: String,

    // --- Test matrix ---
    /// Variable types to test, one suite per type
    pub var_types: Vec<VarType>,
    /// Per-process patch used by the power-of-two suite
    pub patch_size: Dims3,
    /// Process count → candidate process grids
    pub procs: ProcsTable,
    /// Variables written per test
    pub n_vars: u32,
    /// Timesteps written per test
    pub timesteps: u32,
    /// Also run the non-power-of-two suite
    pub non_pow2: bool,
    /// Pass the restructuring box (`-r`) to the write executable
    pub restructure: bool,

    // --- Files ---
    /// VARS file handed to the write executable
    pub vars_file: PathBuf,
    /// Dataset name handed to both executables (`-f`)
    pub data_file: String,
    /// Accumulated write output
    pub write_log: PathBuf,
    /// Accumulated read output
    pub read_log: PathBuf,
    /// Script written in script (travis) mode
    pub script_path: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            write_executable: PathBuf::from("../../build/examples/idx_write"),
            read_executable: PathBuf::from("../../build/examples/idx_read"),
            mpirun: "mpirun".to_string(),

            var_types: vec![VarType {
                components: 1,
                scalar: "float32".to_string(),
            }],
            patch_size: Dims3::new(12, 12, 12),
            procs: ProcsTable::default(),
            n_vars: 1,
            timesteps: 1,
            non_pow2: false,
            restructure: false,

            vars_file: PathBuf::from("VARS"),
            data_file: "data".to_string(),
            write_log: PathBuf::from("_out_write.txt"),
            read_log: PathBuf::from("_out_read.txt"),
            script_path: PathBuf::from("travis_tests.sh"),
        }
    }
}

impl HarnessConfig {
    /// Load a JSON configuration; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::file(path, e))?;
        serde_json::from_str(&text).map_err(|source| HarnessError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path of an executable as it is laid out on this platform.
    ///
    /// macOS builds wrap each example into an app bundle.
    pub fn platform_executable(path: &Path) -> PathBuf {
        if cfg!(target_os = "macos") {
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            let mut bundle = path.as_os_str().to_os_string();
            bundle.push(".app");
            PathBuf::from(bundle).join("Contents/MacOS").join(name)
        } else {
            path.to_path_buf()
        }
    }

    /// Resolve both executables and check that they exist.
    pub fn resolve_executables(&mut self) -> Result<(), HarnessError> {
        self.write_executable = Self::platform_executable(&self.write_executable);
        self.read_executable = Self::platform_executable(&self.read_executable);

        for (role, path) in [("write", &self.write_executable), ("read", &self.read_executable)] {
            if !path.is_file() {
                return Err(HarnessError::ExecutableNotFound {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}
