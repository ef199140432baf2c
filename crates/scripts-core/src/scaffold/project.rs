//! Writing a resolved [`ScaffoldPlan`] to disk

use super::params::{display_name, parse_repository, repository_field, ScaffoldError, ScaffoldPlan};
use crate::command::context::CommandContext;
use crate::runtime::{CiProvider, Invocation};
use crate::scripts::display_path;
use crate::templates::{copy_template, package_manager_context, render_to_file};
use anyhow::{Context as _, Result};
use serde_json::{json, Value};
use std::path::Path;
use tokio::fs;

/// Renamed after copying so the template tree itself is not affected by it
const NPMIGNORE_TEMPLATE: &str = ".npmignore.template";

/// Create the target directory, or check that it may be written into
async fn prepare_target_directory(plan: &ScaffoldPlan) -> Result<()> {
    let target = &plan.directory;

    if !fs::try_exists(target).await.unwrap_or(false) {
        fs::create_dir_all(target)
            .await
            .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        return Ok(());
    }

    let mut entries = fs::read_dir(target)
        .await
        .with_context(|| format!("Failed to read directory: {}", target.display()))?;
    let is_empty = entries.next_entry().await?.is_none();

    if !is_empty && !plan.overwrite {
        return Err(ScaffoldError::DirectoryNotEmpty(target.clone()).into());
    }
    Ok(())
}

async fn restore_template_artifacts(target: &Path) -> Result<()> {
    let npmignore = target.join(NPMIGNORE_TEMPLATE);
    if fs::try_exists(&npmignore).await.unwrap_or(false) {
        fs::rename(&npmignore, target.join(".npmignore"))
            .await
            .context("Failed to restore .npmignore")?;
    }
    Ok(())
}

fn description(plan: &ScaffoldPlan, context: &CommandContext) -> String {
    plan.description
        .clone()
        .unwrap_or_else(|| context.tool.default_description.clone())
}

async fn finalize_package_json(plan: &ScaffoldPlan, template_dir: &Path, context: &CommandContext) -> Result<()> {
    let data = json!({
        "package_name": plan.package_name,
        "description": description(plan, context),
        "ci": plan.ci.as_str(),
        "bin_name": context.tool.bin_name,
        "library_scripts_package": context.tool.package_name,
        "library_scripts_version": context.tool.version,
        "repository": plan.repository_url.as_deref().map(|url| repository_field(plan.ci, url)),
        "license": plan.license,
    });

    render_to_file(
        &template_dir.join("package.json.tera"),
        &plan.directory.join("package.json"),
        &data,
    )
    .await
}

async fn render_readme(plan: &ScaffoldPlan, template_dir: &Path, context: &CommandContext) -> Result<()> {
    let repository = parse_repository(plan.ci, plan.repository_url.as_deref());
    let package_manager = package_manager_context(plan.package_manager, &context.tool.bin_name);
    let cli_direct = package_manager["direct_invoke"].clone();

    let data = json!({
        "package_name": plan.package_name,
        "project_name": display_name(&plan.package_name),
        "cli_direct": cli_direct,
        "package_manager": package_manager,
        "npm_registry": plan.npm_registry.template_context(),
        "description": description(plan, context),
        "ci": plan.ci.as_str(),
        "github_repo": repository.github_repo,
        "gitlab_repo": repository.gitlab_repo,
        "gitlab_instance": repository.gitlab_instance,
        "license": plan.license.as_deref().unwrap_or("MIT"),
    });

    render_to_file(
        &template_dir.join("README.md.tera"),
        &plan.directory.join("README.md"),
        &data,
    )
    .await
}

/// CI templates per provider, as (template, output) relative paths
fn ci_templates(provider: CiProvider) -> &'static [(&'static str, &'static str)] {
    match provider {
        CiProvider::Github => &[
            (".github/workflows/ci.yml.tera", ".github/workflows/ci.yml"),
            (".github/workflows/base.yml.tera", ".github/workflows/base.yml"),
            (".github/workflows/renovate.yml.tera", ".github/workflows/renovate.yml"),
        ],
        CiProvider::Gitlab => &[
            (".gitlab-ci.yml.tera", ".gitlab-ci.yml"),
            (".gitlab/base.gitlab-ci.yml.tera", ".gitlab/base.gitlab-ci.yml"),
        ],
        CiProvider::None => &[],
    }
}

async fn apply_ci_template(plan: &ScaffoldPlan, template_dir: &Path, context: &CommandContext) -> Result<()> {
    let logger = context.logger;

    let data: Value = json!({
        "package_name": plan.package_name,
        "package_manager": package_manager_context(plan.package_manager, &context.tool.bin_name),
        "npm_registry": plan.npm_registry.template_context(),
    });

    for (template, output) in ci_templates(plan.ci) {
        render_to_file(&template_dir.join(template), &plan.directory.join(output), &data).await?;
    }

    match plan.ci {
        CiProvider::None => logger.info("Skipping CI template (none selected)."),
        CiProvider::Github => logger.info(
            "Added GitHub Actions workflow (.github/workflows/ci.yml, base.yml, renovate.yml).",
        ),
        CiProvider::Gitlab => {
            logger.info("Added GitLab CI pipeline (.gitlab-ci.yml and .gitlab/base.gitlab-ci.yml).")
        }
    }
    Ok(())
}

async fn install_dependencies(plan: &ScaffoldPlan, context: &CommandContext) {
    let logger = context.logger;
    if !plan.install_dependencies {
        logger.info("Skipping dependency installation.");
        return;
    }

    logger.info(format!("Installing dependencies with {}...", plan.package_manager));
    let (program, args) = plan.package_manager.install_invocation();
    if let Err(err) = context
        .runner
        .run(Invocation::new(program, args, plan.directory.clone()))
        .await
    {
        logger.warn(format!(
            "Automatic dependency installation failed. Please install manually. ({})",
            err
        ));
    }
}

fn show_completion_message(plan: &ScaffoldPlan, context: &CommandContext) {
    let logger = context.logger;
    let manager = plan.package_manager;

    logger.success("Project scaffolded successfully!");
    logger.info("Next steps:");
    logger.info(format!("  • cd {}", display_path(&context.cwd, &plan.directory)));
    if !plan.install_dependencies {
        let (program, args) = manager.install_invocation();
        logger.info(format!("  • {} {}", program, args.join(" ")));
    }
    logger.info(format!("  • {}", manager.script_command("build")));
    logger.info(format!("  • {}", manager.script_command("test:ci")));
}

/// Copy and render the chosen template into the plan's directory, then
/// install dependencies unless skipped
pub async fn scaffold_project(plan: &ScaffoldPlan, context: &CommandContext) -> Result<()> {
    let template_dir = context.tool.templates_root().join(&plan.template);
    if !fs::try_exists(&template_dir).await.unwrap_or(false) {
        return Err(ScaffoldError::TemplateNotFound(plan.template.clone()).into());
    }

    prepare_target_directory(plan).await?;

    context.logger.info(format!(
        "Scaffolding Boostpack library in {}",
        display_path(&context.cwd, &plan.directory)
    ));

    let copied = copy_template(&template_dir, &plan.directory).await?;
    tracing::debug!(files = copied.len(), template = %plan.template, "copied template files");
    restore_template_artifacts(&plan.directory).await?;

    finalize_package_json(plan, &template_dir, context).await?;
    render_readme(plan, &template_dir, context).await?;
    apply_ci_template(plan, &template_dir, context).await?;

    install_dependencies(plan, context).await;
    show_completion_message(plan, context);
    Ok(())
}
