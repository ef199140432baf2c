//! Choosing between the wizard and flag-driven resolution, and the
//! flag-driven path itself

use super::params::{package_name_from, resolve_registry_config, ScaffoldError, ScaffoldPlan};
use crate::config::resolver::normalize;
use crate::runtime::{CiProvider, PackageManager};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Options of the `init` command
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateOptions {
    pub name: Option<String>,
    pub directory: Option<String>,
    pub template: Option<String>,
    pub package_manager: Option<String>,
    pub skip_install: Option<bool>,
    #[serde(default)]
    pub force: bool,
    pub ci: Option<String>,
    pub npm_registry: Option<String>,
    pub npm_registry_url: Option<String>,
    pub gitlab_project_registry: Option<bool>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The target directory from `--directory` or the positional argument.
/// Both given with different values is an error.
pub fn target_directory<'a>(
    from_option: Option<&'a str>,
    from_argument: Option<&'a str>,
) -> Result<Option<&'a str>, ScaffoldError> {
    let from_option = non_empty(from_option);
    let from_argument = non_empty(from_argument);

    match (from_option, from_argument) {
        (Some(option), Some(positional)) if option != positional => {
            Err(ScaffoldError::ConflictingDirectories {
                positional: positional.to_string(),
                option: option.to_string(),
            })
        }
        (option, positional) => Ok(option.or(positional)),
    }
}

/// Whether any scaffold flag was supplied, which skips the wizard
pub fn has_bypass_options(options: &CreateOptions, directory: Option<&str>) -> bool {
    non_empty(options.name.as_deref()).is_some()
        || directory.is_some()
        || non_empty(options.template.as_deref()).is_some()
        || non_empty(options.package_manager.as_deref()).is_some()
        || non_empty(options.ci.as_deref()).is_some()
        || non_empty(options.npm_registry.as_deref()).is_some()
        || non_empty(options.npm_registry_url.as_deref()).is_some()
        || options.gitlab_project_registry.is_some()
        || options.skip_install.is_some()
}

/// Prompts are only shown on a terminal outside CI
pub fn is_interactive_environment(env: &HashMap<String, String>, is_terminal: bool) -> bool {
    let ci = env.get("CI").map(String::as_str);
    if matches!(ci, Some("true") | Some("1")) {
        return false;
    }
    is_terminal
}

/// Build the plan from flags alone. Defaults: package name from the
/// directory name, manager from the launching package manager, CI `github`,
/// registry `public`.
pub fn resolve_non_interactive(
    cwd: &Path,
    options: &CreateOptions,
    directory: Option<&str>,
    env: &HashMap<String, String>,
) -> Result<ScaffoldPlan, ScaffoldError> {
    let directory = directory.ok_or(ScaffoldError::MissingDirectory)?;
    let target = normalize(&cwd.join(directory));

    let name_input = match non_empty(options.name.as_deref()) {
        Some(name) => name.to_string(),
        None => target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let package_name = package_name_from(&name_input)?;

    let package_manager = match non_empty(options.package_manager.as_deref()) {
        Some(value) => value.parse::<PackageManager>()?,
        None => PackageManager::from_user_agent(env),
    };

    let ci = match non_empty(options.ci.as_deref()) {
        Some(value) => value.parse::<CiProvider>()?,
        None => CiProvider::Github,
    };

    let npm_registry = resolve_registry_config(
        ci,
        options.npm_registry.as_deref(),
        options.npm_registry_url.as_deref(),
        options.gitlab_project_registry.unwrap_or(false),
    )?;

    Ok(ScaffoldPlan {
        package_name,
        directory: target,
        template: non_empty(options.template.as_deref())
            .unwrap_or("default")
            .to_string(),
        package_manager,
        ci,
        npm_registry,
        install_dependencies: !options.skip_install.unwrap_or(false),
        overwrite: options.force,
        repository_url: None,
        license: None,
        description: None,
    })
}
