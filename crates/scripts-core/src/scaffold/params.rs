//! Scaffold parameters: package naming, registry configuration and
//! repository parsing shared by the wizard and the non-interactive path.

use crate::runtime::{CiProvider, PackageManager, UnsupportedValue};
use regex_lite::Regex;
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Package name used when the user supplies nothing
pub const FALLBACK_PACKAGE_NAME: &str = "boostpack-lib";

/// Licence identifiers offered by the wizard, with their labels
pub const LICENSES: &[(&str, &str)] = &[
    ("MIT", "MIT License"),
    ("Apache-2.0", "Apache License 2.0"),
    ("GPL-3.0", "GNU GPL v3"),
    ("BSD-3-Clause", "BSD 3-Clause License"),
    ("ISC", "ISC License"),
    ("MPL-2.0", "Mozilla Public License 2.0"),
    ("Unlicense", "Unlicense (Public Domain)"),
    ("", "Skip (no license)"),
];

const PACKAGE_NAME_PATTERN: &str = r"^(?:@[a-z0-9-]+/)?[a-z0-9-]+$";
const GITHUB_REPOSITORY_PATTERN: &str = r"^(?:https://github\.com/)?([^/]+/[^/]+?)(?:\.git)?$";
const GITLAB_REPOSITORY_PATTERN: &str = r"^(?:https?://)?([^/]+)/(.+?)(?:\.git)?$";

fn matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(value))
}

/// Capture groups 1.. of `pattern` against `value`
fn capture_groups(pattern: &str, value: &str) -> Option<Vec<String>> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(value)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaffoldError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedValue),

    #[error("Scoped package names must be in the format @scope/name.")]
    MalformedScope,

    #[error("Package name \"{0}\" is not a valid npm package identifier.")]
    InvalidPackageName(String),

    #[error("--gitlab-project-registry can only be used with --npm-registry private and --ci gitlab.")]
    GitlabRegistryOnPublic,

    #[error("--npm-registry-url is only supported when --npm-registry private.")]
    RegistryUrlOnPublic,

    #[error("--gitlab-project-registry is only available when --ci gitlab.")]
    GitlabRegistryWithoutGitlab,

    #[error("Please provide --npm-registry-url when using --npm-registry private.")]
    MissingRegistryUrl,

    #[error("Conflicting target directories received: \"{positional}\" (positional) vs \"{option}\" (--directory).")]
    ConflictingDirectories { positional: String, option: String },

    #[error("Please provide a target directory in non-interactive mode, e.g. create-library my-lib")]
    MissingDirectory,

    #[error("Template \"{0}\" was not found.")]
    TemplateNotFound(String),

    #[error("Target directory {} is not empty. Use --force to overwrite.", .0.display())]
    DirectoryNotEmpty(PathBuf),
}

/// Where the package is published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryType {
    Public,
    Private,
}

impl RegistryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryType::Public => "public",
            RegistryType::Private => "private",
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistryType {
    type Err = UnsupportedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(RegistryType::Public),
            "private" => Ok(RegistryType::Private),
            _ => Err(UnsupportedValue {
                kind: "npm registry type",
                plural: "values",
                input: s.to_string(),
                supported: "public, private".to_string(),
            }),
        }
    }
}

/// Resolved publishing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpmRegistry {
    Public,
    Private { url: String },
    /// The GitLab project's own package registry
    GitlabProject,
}

impl NpmRegistry {
    pub fn registry_type(&self) -> RegistryType {
        match self {
            NpmRegistry::Public => RegistryType::Public,
            _ => RegistryType::Private,
        }
    }

    /// Shape exposed to templates
    pub fn template_context(&self) -> Value {
        match self {
            NpmRegistry::Public => json!({ "type": "public" }),
            NpmRegistry::Private { url } => json!({ "type": "private", "url": url }),
            NpmRegistry::GitlabProject => {
                json!({ "type": "private", "gitlab_project_registry": true })
            }
        }
    }
}

/// Registry decision table.
///
/// `public` forbids a URL and the GitLab project registry; the project
/// registry needs `private` under GitLab CI; any other `private` needs a URL.
pub fn resolve_registry_config(
    ci: CiProvider,
    registry_type: Option<&str>,
    url: Option<&str>,
    gitlab_project_registry: bool,
) -> Result<NpmRegistry, ScaffoldError> {
    let registry_type = match registry_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse::<RegistryType>()?,
        None => RegistryType::Public,
    };
    let url = url.map(str::trim).filter(|s| !s.is_empty());

    match registry_type {
        RegistryType::Public if gitlab_project_registry => Err(ScaffoldError::GitlabRegistryOnPublic),
        RegistryType::Public if url.is_some() => Err(ScaffoldError::RegistryUrlOnPublic),
        RegistryType::Public => Ok(NpmRegistry::Public),
        RegistryType::Private if gitlab_project_registry => {
            if ci == CiProvider::Gitlab {
                Ok(NpmRegistry::GitlabProject)
            } else {
                Err(ScaffoldError::GitlabRegistryWithoutGitlab)
            }
        }
        RegistryType::Private => match url {
            Some(url) => Ok(NpmRegistry::Private {
                url: url.to_string(),
            }),
            None => Err(ScaffoldError::MissingRegistryUrl),
        },
    }
}

/// Lowercase, replace unsafe runs with `-`, trim and collapse dashes
pub fn sanitize_segment(segment: &str) -> String {
    let mut sanitized = String::with_capacity(segment.len());
    for c in segment.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }
    sanitized.trim_matches('-').to_string()
}

/// Normalize free text into an npm package name
pub fn to_package_name(raw: &str) -> Result<String, ScaffoldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(FALLBACK_PACKAGE_NAME.to_string());
    }

    if let Some(scoped) = trimmed.strip_prefix('@') {
        let mut parts = scoped.split('/');
        let scope = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        if scope.is_empty() || name.is_empty() {
            return Err(ScaffoldError::MalformedScope);
        }
        return Ok(format!("@{}/{}", sanitize_segment(scope), sanitize_segment(name)));
    }

    Ok(sanitize_segment(trimmed))
}

pub fn validate_package_name(name: &str) -> Result<(), ScaffoldError> {
    if matches(PACKAGE_NAME_PATTERN, name) {
        Ok(())
    } else {
        Err(ScaffoldError::InvalidPackageName(name.to_string()))
    }
}

/// Normalize and validate in one step
pub fn package_name_from(raw: &str) -> Result<String, ScaffoldError> {
    let name = to_package_name(raw)?;
    validate_package_name(&name)?;
    Ok(name)
}

/// Directory name for a package: the name without its scope
pub fn unscoped_name(package_name: &str) -> &str {
    match package_name.strip_prefix('@') {
        Some(scoped) => scoped.split_once('/').map_or(package_name, |(_, name)| name),
        None => package_name,
    }
}

/// Human-readable project title: `@acme/my-lib` becomes `Acme My Lib`
pub fn display_name(raw: &str) -> String {
    let stripped = raw.trim();
    let stripped = stripped.strip_prefix('@').unwrap_or(stripped);

    stripped
        .split(|c: char| c == '/' || c == '-' || c == '_' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Repository coordinates used by README badges and links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub github_repo: Option<String>,
    pub gitlab_repo: Option<String>,
    pub gitlab_instance: Option<String>,
}

/// Accepts an empty value; otherwise the URL must fit the CI provider's shape
pub fn validate_repository_url(ci: CiProvider, value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    match ci {
        CiProvider::Github if !matches(GITHUB_REPOSITORY_PATTERN, value) => Err(
            "Please enter a valid GitHub repository (e.g., owner/repo or https://github.com/owner/repo)"
                .to_string(),
        ),
        CiProvider::Gitlab if !matches(GITLAB_REPOSITORY_PATTERN, value) => Err(
            "Please enter a valid GitLab repository (e.g., gitlab.com/namespace/project or https://your-gitlab.com/namespace/project)"
                .to_string(),
        ),
        _ => Ok(()),
    }
}

pub fn parse_repository(ci: CiProvider, url: Option<&str>) -> RepositoryInfo {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return RepositoryInfo::default();
    };

    match ci {
        CiProvider::Github => capture_groups(GITHUB_REPOSITORY_PATTERN, url)
            .map(|groups| RepositoryInfo {
                github_repo: groups.into_iter().next(),
                ..RepositoryInfo::default()
            })
            .unwrap_or_default(),
        CiProvider::Gitlab => capture_groups(GITLAB_REPOSITORY_PATTERN, url)
            .map(|groups| {
                let mut groups = groups.into_iter();
                RepositoryInfo {
                    gitlab_instance: groups.next(),
                    gitlab_repo: groups.next(),
                    ..RepositoryInfo::default()
                }
            })
            .unwrap_or_default(),
        CiProvider::None => RepositoryInfo::default(),
    }
}

/// `repository` field for package.json
pub fn repository_field(ci: CiProvider, url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else if ci == CiProvider::Github {
        format!("https://github.com/{}", url)
    } else {
        format!("https://{}", url)
    }
}

/// Fully resolved parameters of one scaffold run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldPlan {
    pub package_name: String,
    /// Absolute target directory
    pub directory: PathBuf,
    pub template: String,
    pub package_manager: PackageManager,
    pub ci: CiProvider,
    pub npm_registry: NpmRegistry,
    pub install_dependencies: bool,
    /// Write into a non-empty directory
    pub overwrite: bool,
    pub repository_url: Option<String>,
    pub license: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_normalization() {
        assert_eq!(to_package_name("My Cool Lib!!").unwrap(), "my-cool-lib");
        assert_eq!(to_package_name("@My Scope/My Name").unwrap(), "@my-scope/my-name");
        assert_eq!(to_package_name("  ").unwrap(), FALLBACK_PACKAGE_NAME);
        assert_eq!(to_package_name("a -- b").unwrap(), "a-b");
        assert_eq!(to_package_name("@scope"), Err(ScaffoldError::MalformedScope));
        assert_eq!(to_package_name("@/name"), Err(ScaffoldError::MalformedScope));
    }

    #[test]
    fn test_package_name_validation() {
        assert!(package_name_from("@acme/lib").is_ok());
        assert_eq!(
            package_name_from("!!!"),
            Err(ScaffoldError::InvalidPackageName(String::new()))
        );
    }

    #[test]
    fn test_registry_decision_table() {
        use CiProvider::{Github, Gitlab};

        assert_eq!(
            resolve_registry_config(Github, Some("public"), None, true),
            Err(ScaffoldError::GitlabRegistryOnPublic)
        );
        assert_eq!(
            resolve_registry_config(Github, None, Some("https://npm.acme.dev"), false),
            Err(ScaffoldError::RegistryUrlOnPublic)
        );
        assert_eq!(
            resolve_registry_config(Github, Some("private"), None, false),
            Err(ScaffoldError::MissingRegistryUrl)
        );
        assert_eq!(
            resolve_registry_config(Github, Some("private"), Some("  "), false),
            Err(ScaffoldError::MissingRegistryUrl)
        );
        assert_eq!(
            resolve_registry_config(Github, Some("private"), None, true),
            Err(ScaffoldError::GitlabRegistryWithoutGitlab)
        );
        assert_eq!(
            resolve_registry_config(Gitlab, Some("PRIVATE"), None, true),
            Ok(NpmRegistry::GitlabProject)
        );
        assert_eq!(
            resolve_registry_config(
                CiProvider::None,
                Some("private"),
                Some(" https://npm.acme.dev "),
                false
            ),
            Ok(NpmRegistry::Private {
                url: "https://npm.acme.dev".to_string()
            })
        );
        assert_eq!(
            resolve_registry_config(CiProvider::None, None, None, false),
            Ok(NpmRegistry::Public)
        );
    }

    #[test]
    fn test_unsupported_registry_type() {
        let err = resolve_registry_config(CiProvider::Github, Some("corporate"), None, false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported npm registry type \"corporate\". Supported values: public, private."
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("@acme/my-cool_lib"), "Acme My Cool Lib");
        assert_eq!(display_name("widgets"), "Widgets");
    }

    #[test]
    fn test_unscoped_name() {
        assert_eq!(unscoped_name("@acme/widgets"), "widgets");
        assert_eq!(unscoped_name("widgets"), "widgets");
    }

    #[test]
    fn test_repository_parsing() {
        let github = parse_repository(CiProvider::Github, Some("https://github.com/acme/widgets.git"));
        assert_eq!(github.github_repo.as_deref(), Some("acme/widgets"));

        let gitlab = parse_repository(CiProvider::Gitlab, Some("git.acme.dev/team/tools/widgets"));
        assert_eq!(gitlab.gitlab_instance.as_deref(), Some("git.acme.dev"));
        assert_eq!(gitlab.gitlab_repo.as_deref(), Some("team/tools/widgets"));

        assert_eq!(parse_repository(CiProvider::Github, Some("not a repo/x/y")), RepositoryInfo::default());
        assert_eq!(parse_repository(CiProvider::Gitlab, None), RepositoryInfo::default());
    }

    #[test]
    fn test_repository_validation() {
        assert!(validate_repository_url(CiProvider::Github, "").is_ok());
        assert!(validate_repository_url(CiProvider::Github, "acme/widgets").is_ok());
        assert!(validate_repository_url(CiProvider::Github, "acme").is_err());
        assert!(validate_repository_url(CiProvider::Gitlab, "gitlab.com").is_err());
    }

    #[test]
    fn test_repository_field() {
        assert_eq!(
            repository_field(CiProvider::Github, "acme/widgets"),
            "https://github.com/acme/widgets"
        );
        assert_eq!(
            repository_field(CiProvider::Gitlab, "gitlab.com/acme/widgets"),
            "https://gitlab.com/acme/widgets"
        );
        assert_eq!(
            repository_field(CiProvider::Gitlab, "http://git.local/a/b"),
            "http://git.local/a/b"
        );
    }
}
