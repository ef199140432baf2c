//! Project scaffolding for `init`
//!
//! - [`params`]: naming, registry and repository rules shared by both paths
//! - [`resolve`]: deciding between the wizard and flags, and the flag path
//! - [`wizard`]: the interactive prompt sequence
//! - [`project`]: writing a resolved plan to disk

pub mod params;
pub mod project;
pub mod resolve;
pub mod wizard;

pub use params::{NpmRegistry, RegistryType, ScaffoldError, ScaffoldPlan};
pub use project::scaffold_project;
pub use resolve::{
    has_bypass_options, is_interactive_environment, resolve_non_interactive, target_directory,
    CreateOptions,
};
pub use wizard::{run_wizard, Choice, Prompter, Validator, WizardSeed};
