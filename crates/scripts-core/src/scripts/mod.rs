//! Built-in commands
//!
//! Each command wraps one external tool (or the scaffolder) and ships its
//! definition next to its handler.

pub mod build;
pub mod create;
pub mod eject;
pub mod format;
pub mod lint;

use crate::command::definition::CommandDefinition;
use crate::config::{resolve_config_path, ConfigRequest};
use crate::command::context::CommandContext;
use crate::runtime::{detect_ci_from_env, CiProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Built-in commands in help-listing order
pub fn builtin_commands() -> Vec<CommandDefinition> {
    vec![
        create::definition(),
        build::definition(),
        test::definition(),
        lint::definition(),
        format::definition(),
        eject::definition(),
    ]
}

/// Resolve one of the tool's config files for the current project
pub(crate) fn resolve_tool_config(
    context: &CommandContext,
    custom_path: Option<&str>,
    file_name: &str,
) -> PathBuf {
    let packaged = format!("config/{}", file_name);
    resolve_config_path(&ConfigRequest {
        cwd: &context.cwd,
        custom_path,
        project_relative_path: file_name,
        packaged_relative_path: &packaged,
        base_dir: &context.tool.base_dir,
    })
}

/// Path shown to the user: relative to `cwd` when inside it
pub(crate) fn display_path(cwd: &Path, path: &Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// CI behaviour requested for `test` and `lint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CiTarget {
    Local,
    /// Bare `--ci` with no recognised platform in the environment
    Generic,
    Github,
    Gitlab,
    Unknown(String),
}

impl CiTarget {
    /// `--ci <platform>` wins; a bare `--ci` or no flag falls back to the
    /// `GITHUB_ACTIONS` / `GITLAB_CI` environment markers.
    pub(crate) fn resolve(option: Option<&str>, env: &HashMap<String, String>) -> Self {
        let detected = || match detect_ci_from_env(env) {
            Some(CiProvider::Github) => Some(CiTarget::Github),
            Some(CiProvider::Gitlab) => Some(CiTarget::Gitlab),
            _ => None,
        };

        match option.map(str::trim) {
            None | Some("") => detected().unwrap_or(CiTarget::Local),
            Some("true") => detected().unwrap_or(CiTarget::Generic),
            Some(value) => match value.parse::<CiProvider>() {
                Ok(CiProvider::Github) => CiTarget::Github,
                Ok(CiProvider::Gitlab) => CiTarget::Gitlab,
                Ok(CiProvider::None) => CiTarget::Local,
                Err(_) => CiTarget::Unknown(value.to_string()),
            },
        }
    }

    pub(crate) fn is_ci(&self) -> bool {
        !matches!(self, CiTarget::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_order_and_default() {
        let names: Vec<_> = builtin_commands().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["init", "build", "test", "lint", "format", "eject"]);

        let defaults: Vec<_> = builtin_commands()
            .into_iter()
            .filter(|d| d.is_default)
            .map(|d| d.name)
            .collect();
        assert_eq!(defaults, vec!["init"]);
    }

    #[test]
    fn test_ci_target_resolution() {
        let none = env(&[]);
        let github = env(&[("GITHUB_ACTIONS", "true")]);

        assert_eq!(CiTarget::resolve(None, &none), CiTarget::Local);
        assert_eq!(CiTarget::resolve(None, &github), CiTarget::Github);
        assert_eq!(CiTarget::resolve(Some("true"), &none), CiTarget::Generic);
        assert_eq!(CiTarget::resolve(Some("GitLab"), &github), CiTarget::Gitlab);
        assert_eq!(CiTarget::resolve(Some("none"), &github), CiTarget::Local);
        assert_eq!(
            CiTarget::resolve(Some("circle"), &none),
            CiTarget::Unknown("circle".to_string())
        );
    }

    #[test]
    fn test_display_path() {
        let cwd = Path::new("/work/lib");
        assert_eq!(display_path(cwd, Path::new("/work/lib/tsconfig.json")), "tsconfig.json");
        assert_eq!(display_path(cwd, cwd), ".");
        assert_eq!(display_path(cwd, Path::new("/opt/config/x.js")), "/opt/config/x.js");
    }
}
