//! Command framework
//!
//! This module provides:
//! - Declarative command definitions and the registry that owns them
//! - Per-invocation context construction with layered option merging
//! - The lifecycle pipeline that runs host hooks around a handler
//! - `clap` wiring and dispatch

pub mod cli;
pub mod context;
pub mod definition;
pub mod lifecycle;
pub mod registry;

pub use cli::dispatch;
pub use context::{build_context, merge_options, CommandContext, ParsedInvocation, Session};
pub use definition::{
    ArgumentDefinition, CommandDefinition, CommandHandler, FlagSpec, OptionDefinition, OptionMap,
};
pub use lifecycle::{execute_with_hooks, CommandHooks, CommandOutcome};
pub use registry::{ensure_unique_names, resolve_commands, CommandRegistry, ExtendFn, RegistryAdapter, RegistryError};
