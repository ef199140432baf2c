//! Decides which physical config file is handed to an external tool
//!
//! Precedence: explicit path > project-local file > the tool's bundled default.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum number of directories visited when searching for bundled files
pub const MAX_PACKAGED_SEARCH_DEPTH: usize = 6;

/// Inputs to [`resolve_config_path`]
#[derive(Debug, Clone)]
pub struct ConfigRequest<'a> {
    /// Project working directory
    pub cwd: &'a Path,
    /// Explicit path from a CLI flag, absolute or relative to `cwd`
    pub custom_path: Option<&'a str>,
    /// File name looked up in the project (e.g. `tsconfig.build.json`)
    pub project_relative_path: &'a str,
    /// Path of the bundled default relative to an assets root (e.g. `config/tsconfig.build.json`)
    pub packaged_relative_path: &'a str,
    /// Where the upward search for bundled files starts
    pub base_dir: &'a Path,
}

/// Resolve the config file to use. Never fails: when nothing exists the naive
/// `base_dir/packaged_relative_path` join is returned and the downstream tool
/// reports the missing file itself.
pub fn resolve_config_path(request: &ConfigRequest<'_>) -> PathBuf {
    if let Some(custom) = request.custom_path {
        let custom = Path::new(custom);
        let absolute = if custom.is_absolute() {
            custom.to_path_buf()
        } else {
            request.cwd.join(custom)
        };

        if absolute.exists() {
            tracing::debug!(path = %absolute.display(), "using explicit config");
            return absolute;
        }
    }

    let project_candidate = request.cwd.join(request.project_relative_path);
    if project_candidate.exists() {
        tracing::debug!(path = %project_candidate.display(), "using project config");
        return project_candidate;
    }

    if let Some(packaged) = find_packaged(request.base_dir, request.packaged_relative_path) {
        tracing::debug!(path = %packaged.display(), "using bundled config");
        return packaged;
    }

    normalize(&absolutize(request.base_dir).join(request.packaged_relative_path))
}

/// Walk upward from `base_dir` looking for `relative`; bounded by
/// [`MAX_PACKAGED_SEARCH_DEPTH`] levels and the filesystem root.
pub fn find_packaged(base_dir: &Path, relative: &str) -> Option<PathBuf> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut current = normalize(&absolutize(base_dir));

    for _ in 0..MAX_PACKAGED_SEARCH_DEPTH {
        let canonical = std::fs::canonicalize(&current).unwrap_or_else(|_| current.clone());
        if !visited.insert(canonical) {
            break;
        }

        let candidate = normalize(&current.join(relative));
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    None
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Lexically collapse `.` and `..` components
pub(crate) fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
