//! Template tree copying

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use walkdir::{DirEntry, WalkDir};

/// Suffix of files rendered separately instead of copied
pub const TEMPLATE_SUFFIX: &str = ".tera";

/// The top-level `.github`/`.gitlab` directories are generated per provider,
/// never copied
fn is_ci_entry(entry: &DirEntry) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && matches!(entry.file_name().to_str(), Some(".github" | ".gitlab"))
}

/// Copy every plain file of `template_dir` into `target_dir`, overwriting
/// existing files. Returns the copied paths relative to the template root.
pub async fn copy_template(template_dir: &Path, target_dir: &Path) -> Result<Vec<String>> {
    fs::create_dir_all(target_dir)
        .await
        .context("Failed to create target directory")?;

    let mut copied_files = Vec::new();

    let walker = WalkDir::new(template_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ci_entry(entry));

    for entry in walker {
        let entry = entry
            .with_context(|| format!("Failed to read template: {}", template_dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(template_dir)
            .context("Template entry outside template root")?;
        let target_path = target_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)
                .await
                .with_context(|| format!("Failed to create directory: {}", target_path.display()))?;
            continue;
        }

        if entry.file_name().to_string_lossy().ends_with(TEMPLATE_SUFFIX) {
            continue;
        }

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::copy(entry.path(), &target_path)
            .await
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;

        copied_files.push(relative.to_string_lossy().replace('\\', "/"));
    }

    Ok(copied_files)
}
