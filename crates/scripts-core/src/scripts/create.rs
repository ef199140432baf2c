//! `init`: scaffold a new library project

use crate::command::context::CommandContext;
use crate::command::definition::{
    ArgumentDefinition, CommandDefinition, CommandHandler, OptionDefinition,
};
use crate::runtime::PackageManager;
use crate::scaffold::wizard::{run_wizard, WizardSeed};
use crate::scaffold::{
    has_bypass_options, is_interactive_environment, resolve_non_interactive, scaffold_project,
    target_directory, CreateOptions, ScaffoldPlan,
};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

pub fn definition() -> CommandDefinition {
    CommandDefinition::new(
        "init",
        "Generate a new library project using the Boostpack conventions and preconfigured tooling.",
        Arc::new(CreateCommand),
    )
    .alias("create")
    .summary("Initialize a new Boostpack TypeScript library project")
    .default_command()
    .argument(
        ArgumentDefinition::new("[directory]")
            .description("Target directory for the new project"),
    )
    .option(OptionDefinition::new("--name <package-name>", "NPM package name to use"))
    .option(OptionDefinition::new(
        "--directory <path>",
        "Target directory for the new project",
    ))
    .option(OptionDefinition::new("--template <template>", "Template to use"))
    .option(OptionDefinition::new(
        "--package-manager <manager>",
        "Package manager to use for installing dependencies (npm, pnpm, yarn)",
    ))
    .option(OptionDefinition::new(
        "--skip-install",
        "Skip installing dependencies after scaffolding",
    ))
    .option(OptionDefinition::new(
        "--force",
        "Allow scaffolding into a non-empty directory",
    ))
    .option(OptionDefinition::new(
        "--ci <provider>",
        "CI provider to scaffold (github, gitlab, none). Defaults to github.",
    ))
    .option(OptionDefinition::new(
        "--npm-registry <type>",
        "Target npm registry type (public or private). Defaults to public.",
    ))
    .option(OptionDefinition::new(
        "--npm-registry-url <url>",
        "Registry URL to use when publishing to a private registry.",
    ))
    .option(OptionDefinition::new(
        "--gitlab-project-registry",
        "For GitLab CI, publish using the current project package registry.",
    ))
    .example("create-library init awesome-lib")
    .example("create-library init my-lib --package-manager pnpm")
    .example("create-library init pkg --ci gitlab --npm-registry private --gitlab-project-registry")
}

/// Template directories under the template root, excluding the CI-only tree
async fn available_templates(root: &Path) -> Result<Vec<String>> {
    let mut templates = Vec::new();
    let mut entries = tokio::fs::read_dir(root)
        .await
        .with_context(|| format!("Failed to read templates: {}", root.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() && name != "ci" {
            templates.push(name);
        }
    }

    templates.sort();
    Ok(templates)
}

#[cfg(feature = "tui")]
async fn prompt_for_plan(seed: WizardSeed, title: String) -> Result<Option<ScaffoldPlan>> {
    tokio::task::spawn_blocking(move || {
        let mut prompter = crate::tui::CliclackPrompter;
        run_wizard(&mut prompter, &seed, &title)
    })
    .await
    .context("Wizard task failed")?
}

#[cfg(not(feature = "tui"))]
async fn prompt_for_plan(_seed: WizardSeed, _title: String) -> Result<Option<ScaffoldPlan>> {
    Ok(None)
}

pub struct CreateCommand;

impl CreateCommand {
    async fn interactive_plan(
        &self,
        context: &CommandContext,
        options: CreateOptions,
    ) -> Result<Option<ScaffoldPlan>> {
        let seed = WizardSeed {
            cwd: context.cwd.clone(),
            options,
            detected_manager: PackageManager::from_user_agent(&context.env),
            templates: available_templates(&context.tool.templates_root()).await?,
        };
        let title = format!("Welcome to {} Library creation wizard!", context.tool.display_name);

        prompt_for_plan(seed, title).await
    }
}

#[async_trait]
impl CommandHandler for CreateCommand {
    async fn run(&self, context: &CommandContext) -> Result<()> {
        let mut options: CreateOptions = context.options_as()?;
        let directory = target_directory(
            options.directory.as_deref(),
            context.args.first().map(String::as_str),
        )?
        .map(str::to_string);

        let interactive = cfg!(feature = "tui")
            && !has_bypass_options(&options, directory.as_deref())
            && is_interactive_environment(
                &context.env,
                std::io::stdin().is_terminal() && std::io::stdout().is_terminal(),
            );

        let plan = if interactive {
            options.directory = directory;
            match self.interactive_plan(context, options).await? {
                Some(plan) => plan,
                None => {
                    context.logger.warn("Project creation cancelled.");
                    return Ok(());
                }
            }
        } else {
            resolve_non_interactive(&context.cwd, &options, directory.as_deref(), &context.env)?
        };

        tracing::debug!(?plan, "resolved scaffold plan");
        scaffold_project(&plan, context).await
    }
}
