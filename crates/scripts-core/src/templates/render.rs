//! Tera rendering helpers

use crate::runtime::PackageManager;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use tera::Tera;
use tokio::fs;

/// Render one template file with `data` as the context
pub async fn render_template<T: Serialize>(template: &Path, data: &T) -> Result<String> {
    let source = fs::read_to_string(template)
        .await
        .with_context(|| format!("Failed to read template: {}", template.display()))?;

    let context = tera::Context::from_serialize(data)
        .with_context(|| format!("Invalid context for template: {}", template.display()))?;

    Tera::one_off(&source, &context, false)
        .with_context(|| format!("Failed to render template: {}", template.display()))
}

/// Render `template` and write the result to `output`, creating parent directories
pub async fn render_to_file<T: Serialize>(template: &Path, output: &Path, data: &T) -> Result<()> {
    let rendered = render_template(template, data).await?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(output, rendered)
        .await
        .with_context(|| format!("Failed to write file: {}", output.display()))?;

    tracing::debug!(template = %template.display(), output = %output.display(), "rendered template");
    Ok(())
}

/// Package manager fields shared by CI and README templates
pub fn package_manager_context(manager: PackageManager, bin_name: &str) -> Value {
    json!({
        "name": manager.as_str(),
        "setup_commands": manager.setup_commands(),
        "install_command": manager.frozen_install_command(),
        "cache": manager.as_str(),
        "direct_invoke": manager.direct_invoke(bin_name),
        "run": {
            "build": manager.script_command("build"),
            "test_ci": manager.script_command("test:ci"),
            "lint_ci": manager.script_command("lint:ci"),
            "format": manager.script_command("format"),
            "format_check": manager.script_command("format:check"),
            "release": manager.script_command("release"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_to_file_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let template = temp.path().join("ci.yml.tera");
        std::fs::write(
            &template,
            "install: {{ pm.install_command }}\n{% for step in pm.setup_commands %}- {{ step }}\n{% endfor %}",
        )
        .unwrap();

        let output = temp.path().join("out/.github/workflows/ci.yml");
        let data = json!({ "pm": package_manager_context(PackageManager::Yarn, "create-library") });
        render_to_file(&template, &output, &data).await.unwrap();

        let rendered = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            rendered,
            "install: yarn install --immutable\n- corepack enable\n- corepack prepare yarn@stable --activate\n"
        );
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = render_template(&temp.path().join("nope.tera"), &json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read template"));
    }

    #[tokio::test]
    async fn test_no_html_escaping() {
        let temp = tempfile::tempdir().unwrap();
        let template = temp.path().join("README.md.tera");
        std::fs::write(&template, "# {{ name }}").unwrap();

        let rendered = render_template(&template, &json!({ "name": "@scope/<lib>" }))
            .await
            .unwrap();
        assert_eq!(rendered, "# @scope/<lib>");
    }
}
