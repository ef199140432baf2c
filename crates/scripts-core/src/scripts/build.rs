//! `build`: type-check with tsc, then bundle with rollup

use super::{display_path, resolve_tool_config};
use crate::command::context::CommandContext;
use crate::command::definition::{CommandDefinition, CommandHandler, OptionDefinition};
use crate::runtime::Invocation;
use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildOptions {
    #[serde(default)]
    pub watch: bool,
    #[serde(default = "enabled")]
    pub clean: bool,
    pub rollup_config: Option<String>,
    pub tsconfig: Option<String>,
}

fn enabled() -> bool {
    true
}

pub fn definition() -> CommandDefinition {
    CommandDefinition::new(
        "build",
        "Compile the library TypeScript sources and produce bundles using Rollup.",
        Arc::new(BuildCommand),
    )
    .summary("Compile TypeScript and bundle with Rollup")
    .allow_pass_through()
    .default_option("clean", true)
    .option(OptionDefinition::new(
        "--watch",
        "Run the TypeScript compiler in watch mode",
    ))
    .option(OptionDefinition::new(
        "--no-clean",
        "Skip cleaning the dist directory before building",
    ))
    .option(OptionDefinition::new(
        "--rollup-config <path>",
        "Path to a custom Rollup configuration file",
    ))
    .option(OptionDefinition::new(
        "--tsconfig <path>",
        "Path to a custom tsconfig file for building",
    ))
    .example("create-library build -- --environment production")
}

pub struct BuildCommand;

#[async_trait]
impl CommandHandler for BuildCommand {
    async fn run(&self, context: &CommandContext) -> anyhow::Result<()> {
        let options: BuildOptions = context.options_as()?;
        let logger = context.logger;
        let cwd = &context.cwd;

        logger.info("Building TypeScript library...");

        let dist = cwd.join("dist");
        if options.clean && dist.exists() {
            logger.verbose("Cleaning dist directory...");
            tokio::fs::remove_dir_all(&dist)
                .await
                .with_context(|| format!("Failed to remove {}", dist.display()))?;
        }

        let tsconfig = resolve_tool_config(context, options.tsconfig.as_deref(), "tsconfig.build.json");
        logger.verbose(format!("Type checking with {}", display_path(cwd, &tsconfig)));

        let mode = if options.watch { "--watch" } else { "--noEmit" };
        let tsc_args = vec![
            "-p".to_string(),
            tsconfig.display().to_string(),
            mode.to_string(),
        ];
        context
            .runner
            .run(Invocation::new("tsc", tsc_args, cwd.clone()))
            .await?;

        // Watch mode only runs the type checker
        if options.watch {
            return Ok(());
        }

        let rollup_config =
            resolve_tool_config(context, options.rollup_config.as_deref(), "rollup.config.mjs");
        logger.verbose(format!("Bundling with {}", display_path(cwd, &rollup_config)));

        let mut rollup_args = vec!["-c".to_string(), rollup_config.display().to_string()];
        rollup_args.extend(context.pass_through_args.iter().cloned());
        context
            .runner
            .run(Invocation::new("rollup", rollup_args, cwd.clone()))
            .await?;

        logger.success("Build completed successfully!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::context::test_support::{context, RecordingRunner};
    use serde_json::json;

    #[tokio::test]
    async fn test_build_runs_tsc_then_rollup() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("tsconfig.build.json"), "{}").unwrap();
        std::fs::write(temp.path().join("rollup.config.mjs"), "").unwrap();
        std::fs::create_dir_all(temp.path().join("dist/esm")).unwrap();

        let runner = Arc::new(RecordingRunner::default());
        let mut ctx = context(temp.path(), "build", json!({ "clean": true }), runner.clone());
        ctx.pass_through_args = vec!["--environment".to_string(), "production".to_string()];

        BuildCommand.run(&ctx).await.unwrap();

        assert!(!temp.path().join("dist").exists());
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "tsc");
        assert_eq!(
            calls[0].args,
            vec![
                "-p".to_string(),
                temp.path().join("tsconfig.build.json").display().to_string(),
                "--noEmit".to_string(),
            ]
        );
        assert_eq!(calls[1].program, "rollup");
        assert_eq!(calls[1].args[1], temp.path().join("rollup.config.mjs").display().to_string());
        assert_eq!(&calls[1].args[2..], ["--environment", "production"]);
    }

    #[tokio::test]
    async fn test_watch_stops_after_tsc() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let ctx = context(temp.path(), "build", json!({ "watch": true }), runner.clone());

        BuildCommand.run(&ctx).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args.last().map(String::as_str), Some("--watch"));
    }

    #[tokio::test]
    async fn test_no_clean_keeps_dist() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("dist")).unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let ctx = context(temp.path(), "build", json!({ "clean": false }), runner);

        BuildCommand.run(&ctx).await.unwrap();
        assert!(temp.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_tsc_failure_stops_build() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::failing(&["tsc"]));
        let ctx = context(temp.path(), "build", json!({}), runner.clone());

        let err = BuildCommand.run(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("exited with code 1"));
        assert_eq!(runner.calls().len(), 1);
    }
}
