//! Product identity for the scripts CLI
//!
//! The binary crate implements this trait to tell the core how the tool is
//! named, published and located on disk.

use crate::config::resolver::find_packaged;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration trait for the CLI product
///
/// Defines:
/// - Product identity (binary name, display name)
/// - The published package that projects depend on after `eject`
/// - Where bundled assets are looked up
/// - Text used in help output
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Name of the binary (used in help output, package.json scripts and next steps)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Published package name added to `devDependencies` on eject
    fn package_name(&self) -> &'static str;

    /// Published package version
    fn version(&self) -> &'static str;

    /// Environment variable overriding the directory bundled assets are searched from
    fn home_env(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Default package description for scaffolded projects
    fn default_project_description(&self) -> String {
        format!("A {} TypeScript library", self.display_name())
    }
}

/// The Boostpack product shipped by the `create-library` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct Boostpack;

impl ProductConfig for Boostpack {
    fn name(&self) -> &'static str {
        "create-library"
    }

    fn display_name(&self) -> &'static str {
        "Boostpack"
    }

    fn package_name(&self) -> &'static str {
        "@boostpack/library-scripts"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn home_env(&self) -> &'static str {
        "CREATE_LIBRARY_HOME"
    }

    fn cli_description(&self) -> &'static str {
        "Build scripts and dependencies for Boostpack TypeScript libraries"
    }
}

/// Resolved identity and asset location of the running tool
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub bin_name: String,
    pub display_name: String,
    pub package_name: String,
    pub version: String,
    pub default_description: String,
    /// Where the upward search for bundled assets starts
    pub base_dir: PathBuf,
}

impl ToolInfo {
    /// Locate the tool's assets: `home_env` if set, else the executable's directory
    pub fn locate<C: ProductConfig>(config: &C, env: &HashMap<String, String>) -> Self {
        let base_dir = env
            .get(config.home_env())
            .filter(|home| !home.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(Path::to_path_buf))
            })
            .unwrap_or_else(|| PathBuf::from("."));

        Self::with_base_dir(config, base_dir)
    }

    pub fn with_base_dir<C: ProductConfig>(config: &C, base_dir: PathBuf) -> Self {
        Self {
            bin_name: config.name().to_string(),
            display_name: config.display_name().to_string(),
            package_name: config.package_name().to_string(),
            version: config.version().to_string(),
            default_description: config.default_project_description(),
            base_dir,
        }
    }

    /// Absolute path of a bundled asset, falling back to the naive join
    pub fn packaged(&self, relative: &str) -> PathBuf {
        find_packaged(&self.base_dir, relative).unwrap_or_else(|| self.base_dir.join(relative))
    }

    /// Root directory holding project and CI templates
    pub fn templates_root(&self) -> PathBuf {
        self.packaged("templates")
    }

    #[cfg(test)]
    pub fn for_tests(base_dir: &Path) -> Self {
        Self::with_base_dir(&Boostpack, base_dir.to_path_buf())
    }
}
