//! Scripts Core - build, test, lint and scaffolding toolkit for TypeScript libraries
//!
//! This library provides the command framework and built-in commands behind the
//! `create-library` binary. Each command wraps an external JavaScript tool
//! (tsc, rollup, jest, eslint, prettier) with shared configuration, or
//! scaffolds a new library project from bundled templates.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Config-file resolution, subprocess execution,
//!   package manager and CI detection, template copying and rendering
//! - **Layer 2: Command Framework** - Declarative `CommandDefinition`s, the
//!   registry with host overrides, three-layer option merging and lifecycle hooks
//! - **Layer 3: Commands** - `init`, `build`, `test`, `lint`, `format`, `eject`
//!   and the cliclack-based scaffold wizard (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the interactive scaffold wizard
//!
//! # Example Usage
//!
//! ```ignore
//! use scripts_core::{config, product::Boostpack};
//!
//! let cwd = std::env::current_dir()?;
//! let host = config::load_host_config(&cwd)?;
//! let code = scripts_core::run(&Boostpack, host, std::env::args().collect()).await?;
//! ```

pub mod command;
pub mod config;
pub mod logger;
pub mod product;
pub mod runtime;
pub mod scaffold;
pub mod scripts;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

pub use command::{dispatch, CommandContext, CommandDefinition, Session};
pub use config::HostConfig;
pub use logger::Logger;
pub use product::{Boostpack, ProductConfig, ToolInfo};
pub use scripts::builtin_commands;

use runtime::SystemRunner;
use std::sync::Arc;

/// Parse `raw_args` (including the program name), run the selected command
/// and return the process exit code.
pub async fn run<C: ProductConfig>(
    config: &C,
    host: Option<HostConfig>,
    raw_args: Vec<String>,
) -> anyhow::Result<i32> {
    let env: std::collections::HashMap<String, String> = std::env::vars().collect();
    let session = Session {
        cwd: std::env::current_dir()?,
        raw_args,
        tool: Arc::new(ToolInfo::locate(config, &env)),
        env,
        runner: Arc::new(SystemRunner),
        logger: Logger::new(),
    };

    let definitions = command::resolve_commands(
        builtin_commands(),
        host.as_ref().and_then(|config| config.extend.as_deref()),
    )?;
    tracing::debug!(commands = definitions.len(), "resolved command set");

    dispatch(&definitions, host.map(Arc::new), &session, config.cli_description()).await
}
