//! Package manager and CI provider detection

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A value that is not part of one of the fixed choice sets
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported {kind} \"{input}\". Supported {plural}: {supported}.")]
pub struct UnsupportedValue {
    pub kind: &'static str,
    pub plural: &'static str,
    pub input: String,
    pub supported: String,
}

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    pub const ALL: [PackageManager; 3] = [PackageManager::Npm, PackageManager::Pnpm, PackageManager::Yarn];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Commands run in CI before installing
    pub fn setup_commands(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &[],
            PackageManager::Pnpm => &[
                "corepack enable",
                "corepack prepare pnpm@latest-9 --activate",
                "pnpm config set store-dir .pnpm-store",
            ],
            PackageManager::Yarn => &["corepack enable", "corepack prepare yarn@stable --activate"],
        }
    }

    /// Reproducible install used in CI pipelines and next-step hints
    pub fn frozen_install_command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm ci",
            PackageManager::Pnpm => "pnpm install --frozen-lockfile --prefer-offline --prod=false",
            PackageManager::Yarn => "yarn install --immutable",
        }
    }

    /// Plain `install` invocation split into program and arguments
    pub fn install_invocation(&self) -> (&'static str, Vec<&'static str>) {
        (self.as_str(), vec!["install"])
    }

    /// How a package.json script is run with this manager
    pub fn script_command(&self, script: &str) -> String {
        match self {
            PackageManager::Npm => format!("npm run {}", script),
            PackageManager::Pnpm => format!("pnpm run {}", script),
            PackageManager::Yarn => format!("yarn {}", script),
        }
    }

    /// How the published CLI is invoked without a local install
    pub fn direct_invoke(&self, bin: &str) -> String {
        match self {
            PackageManager::Npm => format!("npx {}", bin),
            PackageManager::Pnpm => format!("pnpm dlx {}", bin),
            PackageManager::Yarn => format!("yarn dlx {}", bin),
        }
    }

    /// Detect the manager that launched us from `npm_config_user_agent`
    pub fn from_user_agent(env: &HashMap<String, String>) -> Self {
        let user_agent = env
            .get("npm_config_user_agent")
            .map(String::as_str)
            .unwrap_or("");

        if user_agent.starts_with("pnpm/") {
            PackageManager::Pnpm
        } else if user_agent.starts_with("yarn/") {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            _ => Err(UnsupportedValue {
                kind: "package manager",
                plural: "managers",
                input: s.to_string(),
                supported: "npm, pnpm, yarn".to_string(),
            }),
        }
    }
}

/// Supported CI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CiProvider {
    Github,
    Gitlab,
    None,
}

impl CiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CiProvider::Github => "github",
            CiProvider::Gitlab => "gitlab",
            CiProvider::None => "none",
        }
    }
}

impl fmt::Display for CiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CiProvider {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(CiProvider::Github),
            "gitlab" => Ok(CiProvider::Gitlab),
            "none" => Ok(CiProvider::None),
            _ => Err(UnsupportedValue {
                kind: "CI provider",
                plural: "providers",
                input: s.to_string(),
                supported: "github, gitlab, none".to_string(),
            }),
        }
    }
}

/// Which CI platform we are running under, if any
pub fn detect_ci_from_env(env: &HashMap<String, String>) -> Option<CiProvider> {
    let is_true = |key: &str| env.get(key).is_some_and(|v| v == "true");

    if is_true("GITHUB_ACTIONS") {
        Some(CiProvider::Github)
    } else if is_true("GITLAB_CI") {
        Some(CiProvider::Gitlab)
    } else {
        None
    }
}

/// Lock files checked in order of preference
const LOCK_FILES: &[(&str, PackageManager)] = &[
    ("package-lock.json", PackageManager::Npm),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
];

/// Detect the package manager an existing project uses
///
/// Lock files win, then the `packageManager` field of package.json, else npm.
pub fn detect_package_manager_in(cwd: &Path) -> PackageManager {
    for (lock_file, manager) in LOCK_FILES {
        if cwd.join(lock_file).exists() {
            return *manager;
        }
    }

    let declared = std::fs::read_to_string(cwd.join("package.json"))
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .and_then(|json| {
            json.get("packageManager")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

    if let Some(declared) = declared {
        let name = declared.split('@').next().unwrap_or("");
        if let Ok(manager) = name.parse::<PackageManager>() {
            return manager;
        }
    }

    PackageManager::Npm
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
    fn test_parse_package_manager_case_insensitive() {
        assert_eq!("PNPM".parse::<PackageManager>().unwrap(), PackageManager::Pnpm);
        let err = "bun".parse::<PackageManager>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported package manager \"bun\". Supported managers: npm, pnpm, yarn."
        );
    }

    #[test]
    fn test_parse_ci_provider() {
        assert_eq!("GitLab".parse::<CiProvider>().unwrap(), CiProvider::Gitlab);
        assert!("circle".parse::<CiProvider>().is_err());
    }

    #[test]
    fn test_user_agent_detection() {
        assert_eq!(
            PackageManager::from_user_agent(&env(&[("npm_config_user_agent", "pnpm/9.1.0 node/v20")])),
            PackageManager::Pnpm
        );
        assert_eq!(
            PackageManager::from_user_agent(&env(&[("npm_config_user_agent", "yarn/4.0.0")])),
            PackageManager::Yarn
        );
        assert_eq!(PackageManager::from_user_agent(&env(&[])), PackageManager::Npm);
    }

    #[test]
    fn test_ci_detection_from_env() {
        assert_eq!(
            detect_ci_from_env(&env(&[("GITHUB_ACTIONS", "true")])),
            Some(CiProvider::Github)
        );
        assert_eq!(
            detect_ci_from_env(&env(&[("GITLAB_CI", "true")])),
            Some(CiProvider::Gitlab)
        );
        assert_eq!(detect_ci_from_env(&env(&[("GITLAB_CI", "1")])), None);
    }

    #[test]
    fn test_lock_file_detection() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(detect_package_manager_in(temp.path()), PackageManager::Npm);

        std::fs::write(temp.path().join("yarn.lock"), "").unwrap();
        assert_eq!(detect_package_manager_in(temp.path()), PackageManager::Yarn);
    }

    #[test]
    fn test_package_manager_field_detection() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{ "name": "x", "packageManager": "pnpm@9.0.0" }"#,
        )
        .unwrap();

        assert_eq!(detect_package_manager_in(temp.path()), PackageManager::Pnpm);
    }

    #[test]
    fn test_script_commands_per_manager() {
        assert_eq!(PackageManager::Npm.script_command("build"), "npm run build");
        assert_eq!(PackageManager::Yarn.script_command("test:ci"), "yarn test:ci");
        assert_eq!(PackageManager::Pnpm.direct_invoke("create-library"), "pnpm dlx create-library");
    }
}
