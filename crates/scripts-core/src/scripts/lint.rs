//! `lint`: run eslint, with GitHub annotations or GitLab reports in CI

use super::{resolve_tool_config, CiTarget};
use crate::command::context::CommandContext;
use crate::command::definition::{CommandDefinition, CommandHandler, OptionDefinition};
use crate::runtime::Invocation;
use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LintOptions {
    #[serde(default)]
    pub fix: bool,
    pub ci: Option<String>,
    pub config: Option<String>,
}

pub fn definition() -> CommandDefinition {
    CommandDefinition::new(
        "lint",
        "Lint project files using ESLint with support for custom config and CI modes.",
        Arc::new(LintCommand),
    )
    .summary("Run ESLint against the project sources")
    .allow_pass_through()
    .option(OptionDefinition::new(
        "--fix",
        "Automatically fix lint issues when possible",
    ))
    .option(OptionDefinition::new(
        "--ci [platform]",
        "Enable CI-specific linting behavior (github or gitlab)",
    ))
    .option(OptionDefinition::new(
        "--config <path>",
        "Path to a custom ESLint configuration file",
    ))
}

pub struct LintCommand;

#[async_trait]
impl CommandHandler for LintCommand {
    async fn run(&self, context: &CommandContext) -> anyhow::Result<()> {
        let options: LintOptions = context.options_as()?;
        let logger = context.logger;
        let cwd = &context.cwd;

        logger.info("Linting code...");

        let config = resolve_tool_config(context, options.config.as_deref(), "eslint.config.js");
        let mut base_args = vec![
            ".".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        if options.fix {
            base_args.push("--fix".to_string());
        }

        let mut env = context.env.clone();
        let target = CiTarget::resolve(options.ci.as_deref(), &context.env);
        let with_pass_through = |extra: &[String]| {
            let mut args = base_args.clone();
            args.extend(extra.iter().cloned());
            args.extend(context.pass_through_args.iter().cloned());
            args
        };

        if target == CiTarget::Github {
            env.insert("CI".to_string(), "true".to_string());
            env.entry("GITHUB_ACTIONS".to_string())
                .or_insert_with(|| "true".to_string());

            let args = with_pass_through(&["--format".to_string(), "github".to_string()]);
            context
                .runner
                .run(Invocation::new("eslint", args, cwd.clone()).env(env))
                .await?;

            logger.success("Linting passed!");
            return Ok(());
        }

        context
            .runner
            .run(Invocation::new("eslint", with_pass_through(&[]), cwd.clone()).env(env.clone()))
            .await?;

        if target == CiTarget::Gitlab {
            env.insert("CI".to_string(), "true".to_string());
            env.entry("GITLAB_CI".to_string())
                .or_insert_with(|| "true".to_string());

            let reports = cwd.join("reports");
            tokio::fs::create_dir_all(&reports)
                .await
                .with_context(|| format!("Failed to create {}", reports.display()))?;

            let junit = reports.join("eslint-junit.xml");
            let args = with_pass_through(&[
                "--format".to_string(),
                "junit".to_string(),
                "--output-file".to_string(),
                junit.display().to_string(),
            ]);
            context
                .runner
                .run(Invocation::new("eslint", args, cwd.clone()).env(env))
                .await?;

            let code_quality = cwd.join("gl-codequality.json");
            tokio::fs::write(&code_quality, "[]\n")
                .await
                .with_context(|| format!("Failed to write {}", code_quality.display()))?;
        }

        logger.success("Linting passed!");
        Ok(())
    }
}
