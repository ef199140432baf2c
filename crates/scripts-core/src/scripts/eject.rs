//! `eject`: copy the bundled configuration into the project

use crate::command::context::CommandContext;
use crate::command::definition::{CommandDefinition, CommandHandler, OptionDefinition};
use crate::config::find_packaged;
use crate::logger::Logger;
use crate::runtime::{detect_package_manager_in, CiProvider, Invocation, PackageManager};
use crate::templates::{package_manager_context, render_to_file};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bundled config files copied into the project, by file name
pub const EJECTED_FILES: &[&str] = &[
    "commitlint.config.js",
    "eslint.config.js",
    "jest.config.js",
    "prettier.config.js",
    "release.config.js",
    "renovate.config.js",
    "rollup.config.mjs",
    "tsconfig.json",
    "tsconfig.build.json",
    "tsconfig.test.json",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EjectOptions {
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub yes: bool,
    #[serde(default)]
    pub skip_install: bool,
    pub ci_platform: Option<String>,
    pub package_manager: Option<String>,
}

pub fn definition() -> CommandDefinition {
    CommandDefinition::new(
        "eject",
        "Copy the maintained Boostpack configuration files into your project for customization.",
        Arc::new(EjectCommand),
    )
    .summary("Copy the base config into the current project")
    .option(OptionDefinition::new(
        "--force",
        "Overwrite existing files instead of aborting on conflicts",
    ))
    .option(OptionDefinition::new(
        "--dry-run",
        "Preview the eject changes without writing files",
    ))
    .option(OptionDefinition::new(
        "--skip-install",
        "Do not run package manager install after ejecting files",
    ))
    .option(OptionDefinition::new(
        "--yes",
        "Skip interactive confirmations",
    ))
    .option(OptionDefinition::new(
        "--ci-platform <platform>",
        "CI platform to generate config for (github, gitlab, none). Auto-detected from package.json if not specified.",
    ))
    .option(OptionDefinition::new(
        "--package-manager <manager>",
        "Package manager to use (npm, pnpm, yarn). Auto-detected if not specified.",
    ))
    .example("create-library eject")
    .example("create-library eject --ci-platform gitlab --package-manager pnpm")
    .example("create-library eject --dry-run")
}

/// Scripts merged into the project's package.json
fn package_scripts(bin: &str) -> Vec<(&'static str, String)> {
    vec![
        ("build", format!("{} build", bin)),
        ("lint", format!("{} lint", bin)),
        (
            "lint:ci",
            format!("{} lint --format json > gl-codequality.json", bin),
        ),
        ("test", format!("{} test", bin)),
        ("test:watch", format!("{} test --watch", bin)),
        ("test:ci", format!("{} test --ci", bin)),
        ("format", format!("{} format", bin)),
        ("format:check", format!("{} format --check", bin)),
        ("semantic-release", "semantic-release".to_string()),
    ]
}

/// Existing project files that eject would overwrite
pub fn find_conflicts(cwd: &Path) -> Vec<&'static str> {
    EJECTED_FILES
        .iter()
        .copied()
        .filter(|file| cwd.join(file).exists())
        .collect()
}

async fn read_package_json(cwd: &Path) -> Result<(PathBuf, Map<String, Value>)> {
    let path = cwd.join("package.json");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok((path, data))
}

/// Merge the tool's scripts and dev dependency into a package.json document.
/// Existing entries are kept unless `force` is set.
pub fn merge_package_json(
    data: &mut Map<String, Value>,
    bin: &str,
    package: &str,
    version: &str,
    force: bool,
) {
    let scripts = data
        .entry("scripts")
        .or_insert_with(|| Value::Object(Map::new()));
    if !scripts.is_object() {
        *scripts = Value::Object(Map::new());
    }
    if let Value::Object(scripts) = scripts {
        for (name, command) in package_scripts(bin) {
            let missing = scripts
                .get(name)
                .and_then(Value::as_str)
                .map_or(true, str::is_empty);
            if force || missing {
                scripts.insert(name.to_string(), Value::String(command));
            }
        }
    }

    let dev_dependencies = data
        .entry("devDependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    if !dev_dependencies.is_object() {
        *dev_dependencies = Value::Object(Map::new());
    }
    if let Value::Object(dev_dependencies) = dev_dependencies {
        if force || !dev_dependencies.contains_key(package) {
            dev_dependencies.insert(package.to_string(), Value::String(format!("^{}", version)));
        }
    }
}

async fn update_package_json(context: &CommandContext, options: &EjectOptions) -> Result<()> {
    let (path, mut data) = read_package_json(&context.cwd).await?;
    let tool = &context.tool;
    merge_package_json(&mut data, &tool.bin_name, &tool.package_name, &tool.version, options.force);

    if options.dry_run {
        context.logger.verbose("[dry-run] package.json would be updated");
        return Ok(());
    }

    let pretty = serde_json::to_string_pretty(&Value::Object(data))?;
    tokio::fs::write(&path, format!("{}\n", pretty))
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    context.logger.verbose("package.json updated");
    Ok(())
}

/// Explicit platform, else `boostpack.ci` from package.json, else none
async fn detect_ci_platform(cwd: &Path, explicit: Option<CiProvider>, logger: Logger) -> CiProvider {
    if let Some(platform) = explicit {
        return platform;
    }

    let declared = read_package_json(cwd).await.ok().and_then(|(_, data)| {
        data.get("boostpack")
            .and_then(|section| section.get("ci"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match declared {
        Some(value) => match value.parse::<CiProvider>() {
            Ok(platform) => {
                logger.verbose(format!("Detected CI platform from package.json: {}", platform));
                platform
            }
            Err(err) => {
                logger.warn(format!("Ignoring boostpack.ci in package.json: {}", err));
                CiProvider::None
            }
        },
        None => CiProvider::None,
    }
}

async fn eject_ci_config(
    context: &CommandContext,
    options: &EjectOptions,
    platform: CiProvider,
    manager: PackageManager,
) -> Result<()> {
    let cwd = &context.cwd;
    let logger = context.logger;

    let (template, output) = match platform {
        CiProvider::None => {
            logger.verbose("Skipping CI configuration generation");
            return Ok(());
        }
        CiProvider::Github => ("ci/github/ci.yml.tera", cwd.join(".github/workflows/ci.yml")),
        CiProvider::Gitlab => ("ci/gitlab/gitlab-ci.yml.tera", cwd.join(".gitlab-ci.yml")),
    };

    let relative = output.strip_prefix(cwd).unwrap_or(&output).display().to_string();
    if options.dry_run {
        logger.verbose(format!("[dry-run] would generate {}", relative));
        return Ok(());
    }

    let project_name = read_package_json(cwd)
        .await
        .ok()
        .and_then(|(_, data)| data.get("name").and_then(Value::as_str).map(str::to_string))
        .or_else(|| cwd.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let data = json!({
        "project_name": project_name,
        "package_manager": package_manager_context(manager, &context.tool.bin_name),
    });

    let template = context.tool.templates_root().join(template);
    render_to_file(&template, &output, &data).await?;
    logger.success(format!("Generated {}", relative));
    Ok(())
}

pub struct EjectCommand;

#[async_trait]
impl CommandHandler for EjectCommand {
    async fn run(&self, context: &CommandContext) -> Result<()> {
        let options: EjectOptions = context.options_as()?;
        let logger = context.logger;
        let cwd = &context.cwd;

        let explicit_platform = options
            .ci_platform
            .as_deref()
            .map(str::parse::<CiProvider>)
            .transpose()?;
        let manager = match options.package_manager.as_deref() {
            Some(value) => value.parse::<PackageManager>()?,
            None => detect_package_manager_in(cwd),
        };

        logger.info("Ejecting Boostpack base configuration into project...");
        logger.verbose(format!("Detected package manager: {}", manager));

        let conflicts = find_conflicts(cwd);
        if !conflicts.is_empty() && !options.force {
            let listing = conflicts
                .iter()
                .map(|file| format!("  • {}", file))
                .collect::<Vec<_>>()
                .join("\n");
            logger.error(format!(
                "Cannot eject because the following files already exist:\n{}\nUse --force to overwrite or remove the files manually.",
                listing
            ));
            anyhow::bail!("Eject aborted due to existing files.");
        }

        for file in EJECTED_FILES {
            let relative = format!("config/{}", file);
            let source = find_packaged(&context.tool.base_dir, &relative)
                .with_context(|| format!("Bundled config file not found: {}", relative))?;
            let target = cwd.join(file);

            if options.dry_run {
                logger.verbose(format!("[dry-run] copy {} -> {}", relative, file));
                continue;
            }

            tokio::fs::copy(&source, &target)
                .await
                .with_context(|| format!("Failed to copy {}", target.display()))?;
            logger.verbose(format!("Copied {}", file));
        }

        if let Err(err) = update_package_json(context, &options).await {
            logger.warn(format!("Skipping package.json updates: {:#}", err));
        }

        let platform = detect_ci_platform(cwd, explicit_platform, logger).await;
        eject_ci_config(context, &options, platform, manager).await?;

        if !options.skip_install {
            logger.verbose("Ensuring dependencies are installed...");
            if options.dry_run {
                logger.verbose(format!("[dry-run] {} install", manager));
            } else {
                let (program, args) = manager.install_invocation();
                if let Err(err) = context
                    .runner
                    .run(Invocation::new(program, args, cwd.clone()))
                    .await
                {
                    logger.warn(format!(
                        "{} install failed. Please install dependencies manually. ({})",
                        manager, err
                    ));
                }
            }
        }

        logger.success("Eject completed! You can now customize the copied configuration files.");

        if let Some(platform) = explicit_platform.filter(|p| *p != CiProvider::None) {
            logger.info("CI/CD configuration files have been generated.");
            logger.info("   Remember to configure the required secrets in your CI/CD platform:");
            logger.info("   - NPM_TOKEN (for package publishing)");
            if platform == CiProvider::Github {
                logger.info("   - CODECOV_TOKEN (for coverage reporting, optional)");
            }
        }

        Ok(())
    }
}
