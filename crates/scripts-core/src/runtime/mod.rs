//! Subprocess execution and environment detection
//!
//! This module provides:
//! - The `ProcessRunner` seam used by every command to spawn external tools
//! - Package manager and CI provider detection

pub mod detect;
pub mod process;

pub use detect::{
    detect_ci_from_env, detect_package_manager_in, CiProvider, PackageManager, UnsupportedValue,
};
pub use process::{
    resolve_bin, Invocation, ProcessError, ProcessRunner, RunResult, StdioMode, SystemRunner,
};
