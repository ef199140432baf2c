//! `create-library.config.yaml` loading
//!
//! ```yaml
//! defaults:
//!   build:
//!     clean: false
//! hooks:
//!   before-each: "echo starting"
//!   on-error: "./scripts/notify.sh"
//! commands:
//!   - name: docs
//!     description: Generate API documentation
//!     run: typedoc
//!     args: ["--out", "docs"]
//!     pass-through: true
//! ```

use super::host::HostConfig;
use crate::command::context::CommandContext;
use crate::command::definition::{CommandDefinition, CommandHandler, OptionMap};
use crate::command::lifecycle::CommandHooks;
use crate::command::registry::RegistryAdapter;
use crate::runtime::Invocation;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// File names checked in the working directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["create-library.config.yaml", "create-library.config.yml"];

#[derive(Debug, Error)]
pub enum HostConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct HostConfigFile {
    #[serde(default)]
    defaults: HashMap<String, OptionMap>,

    #[serde(default)]
    hooks: HookCommands,

    #[serde(default)]
    commands: Vec<ScriptCommand>,
}

/// Shell command lines run at each lifecycle stage
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HookCommands {
    pub before_all: Option<String>,
    pub before_each: Option<String>,
    pub after_each: Option<String>,
    pub after_all: Option<String>,
    pub on_error: Option<String>,
}

impl HookCommands {
    fn is_empty(&self) -> bool {
        self.before_all.is_none()
            && self.before_each.is_none()
            && self.after_each.is_none()
            && self.after_all.is_none()
            && self.on_error.is_none()
    }
}

/// A host command that runs an external program
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScriptCommand {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub run: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub pass_through: bool,
}

impl ScriptCommand {
    fn to_definition(&self) -> CommandDefinition {
        let handler = Arc::new(ExternalCommand {
            program: self.run.clone(),
            args: self.args.clone(),
        });

        let mut definition = CommandDefinition::new(self.name.clone(), self.description.clone(), handler);
        definition.summary = self.summary.clone();
        definition.aliases = self.aliases.clone();
        if self.pass_through {
            definition = definition.allow_pass_through();
        }
        definition
    }
}

/// Handler that forwards to an external program
struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

#[async_trait]
impl CommandHandler for ExternalCommand {
    async fn run(&self, context: &CommandContext) -> anyhow::Result<()> {
        let args = self
            .args
            .iter()
            .chain(context.pass_through_args.iter())
            .cloned()
            .collect::<Vec<_>>();

        context
            .runner
            .run(Invocation::new(self.program.clone(), args, context.cwd.clone()))
            .await?;
        Ok(())
    }
}

/// Hooks backed by shell command lines
pub struct ShellHooks {
    commands: HookCommands,
}

impl ShellHooks {
    pub fn new(commands: HookCommands) -> Self {
        Self { commands }
    }

    async fn run_hook(
        &self,
        line: Option<&String>,
        name: &str,
        context: &CommandContext,
        error: Option<&anyhow::Error>,
    ) -> anyhow::Result<()> {
        let Some(line) = line else {
            return Ok(());
        };

        let mut env = context.env.clone();
        env.insert("CREATE_LIBRARY_COMMAND".to_string(), name.to_string());
        if let Some(error) = error {
            env.insert("CREATE_LIBRARY_ERROR".to_string(), format!("{:#}", error));
        }

        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        context
            .runner
            .run(Invocation::new(shell, [flag, line.as_str()], context.cwd.clone()).env(env))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHooks for ShellHooks {
    async fn before_all(&self, name: &str, context: &CommandContext) -> anyhow::Result<()> {
        self.run_hook(self.commands.before_all.as_ref(), name, context, None)
            .await
    }

    async fn before_each(&self, name: &str, context: &CommandContext) -> anyhow::Result<()> {
        self.run_hook(self.commands.before_each.as_ref(), name, context, None)
            .await
    }

    async fn after_each(&self, name: &str, context: &CommandContext) -> anyhow::Result<()> {
        self.run_hook(self.commands.after_each.as_ref(), name, context, None)
            .await
    }

    async fn after_all(&self, name: &str, context: &CommandContext) -> anyhow::Result<()> {
        self.run_hook(self.commands.after_all.as_ref(), name, context, None)
            .await
    }

    async fn on_error(
        &self,
        name: &str,
        context: &CommandContext,
        error: &anyhow::Error,
    ) -> anyhow::Result<()> {
        self.run_hook(self.commands.on_error.as_ref(), name, context, Some(error))
            .await
    }
}

/// Parse the YAML form of a host configuration
pub fn parse_host_config(content: &str) -> Result<HostConfig, serde_yaml::Error> {
    let file: HostConfigFile = if content.trim().is_empty() {
        HostConfigFile::default()
    } else {
        serde_yaml::from_str(content)?
    };

    let hooks = if file.hooks.is_empty() {
        None
    } else {
        Some(Arc::new(ShellHooks::new(file.hooks)) as Arc<dyn CommandHooks>)
    };

    let extend = if file.commands.is_empty() {
        None
    } else {
        let commands = file.commands;
        let extend: Box<crate::command::registry::ExtendFn> =
            Box::new(move |adapter: &mut RegistryAdapter<'_>| {
                for command in &commands {
                    adapter.add(command.to_definition());
                }
                Ok(())
            });
        Some(extend)
    };

    Ok(HostConfig {
        extend,
        hooks,
        defaults: file.defaults,
    })
}

/// Load the host configuration from `cwd`, if a config file exists
pub fn load_host_config(cwd: &Path) -> Result<Option<HostConfig>, HostConfigError> {
    let Some(path) = CONFIG_FILE_NAMES
        .iter()
        .map(|name| cwd.join(name))
        .find(|path| path.is_file())
    else {
        return Ok(None);
    };

    tracing::debug!(path = %path.display(), "loading host configuration");

    let content = std::fs::read_to_string(&path).map_err(|source| HostConfigError::Read {
        path: path.clone(),
        source,
    })?;

    parse_host_config(&content)
        .map(Some)
        .map_err(|source| HostConfigError::Parse { path, source })
}
