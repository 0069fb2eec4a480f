pub mod config;
pub mod decomp;
pub mod dims;
pub mod error;
pub mod launch_options;
pub mod launcher;
pub mod procs;
pub mod profile;
pub mod vars;
pub mod verify;

// Re-export primary types for convenience
pub use config::HarnessConfig;
pub use decomp::{InvalidDecomposition, check_read_decomposition};
pub use dims::Dims3;
pub use error::HarnessError;
pub use launch_options::{LaunchOptions, OptionValue, extract_launch_options};
pub use launcher::{LaunchCommand, LaunchOutput, Launcher, Phase, ProcessLauncher, ScriptLauncher};
pub use procs::ProcsTable;
pub use profile::ProfileFiles;
pub use vars::VarType;
pub use verify::{SampleCounts, Verdict};
