//! `format`: run prettier over the project sources

use crate::command::context::CommandContext;
use crate::command::definition::{CommandDefinition, CommandHandler, OptionDefinition};
use crate::runtime::Invocation;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_PATTERN: &str = "src/**/*.{ts,tsx,js,jsx,json,md}";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormatOptions {
    #[serde(default)]
    pub check: bool,
    pub pattern: Option<String>,
}

pub fn definition() -> CommandDefinition {
    CommandDefinition::new(
        "format",
        "Run Prettier to format project files or check formatting status.",
        Arc::new(FormatCommand),
    )
    .summary("Format source files with Prettier")
    .allow_pass_through()
    .default_option("pattern", DEFAULT_PATTERN)
    .option(OptionDefinition::new(
        "--check",
        "Check formatting without writing changes",
    ))
    .option(OptionDefinition::new(
        "--pattern <glob>",
        format!("File glob to pass to Prettier (defaults to {})", DEFAULT_PATTERN),
    ))
}

pub struct FormatCommand;

#[async_trait]
impl CommandHandler for FormatCommand {
    async fn run(&self, context: &CommandContext) -> anyhow::Result<()> {
        let options: FormatOptions = context.options_as()?;
        let pattern = options
            .pattern
            .unwrap_or_else(|| DEFAULT_PATTERN.to_string());

        context.logger.info("Formatting code...");

        let mode = if options.check { "--check" } else { "--write" };
        let mut args = vec![pattern, mode.to_string()];
        args.extend(context.pass_through_args.iter().cloned());

        context
            .runner
            .run(Invocation::new("prettier", args, context.cwd.clone()))
            .await?;

        if options.check {
            context.logger.success("Code is properly formatted!");
        } else {
            context.logger.success("Code formatted successfully!");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::context::test_support::{context, RecordingRunner};
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_default_pattern() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let ctx = context(temp.path(), "format", json!({}), runner.clone());

        FormatCommand.run(&ctx).await.unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.program, "prettier");
        assert_eq!(call.args, vec![DEFAULT_PATTERN, "--write"]);
    }

    #[tokio::test]
    async fn test_check_with_custom_pattern() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let mut ctx = context(
            temp.path(),
            "format",
            json!({ "check": true, "pattern": "lib/**/*.ts" }),
            runner.clone(),
        );
        ctx.pass_through_args = vec!["--log-level".to_string(), "warn".to_string()];

        FormatCommand.run(&ctx).await.unwrap();

        assert_eq!(
            runner.calls()[0].args,
            vec!["lib/**/*.ts", "--check", "--log-level", "warn"]
        );
    }
}
