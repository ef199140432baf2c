//! Per-invocation command context and option merging

use super::definition::{CommandDefinition, OptionMap};
use crate::config::HostConfig;
use crate::logger::Logger;
use crate::product::ToolInfo;
use crate::runtime::ProcessRunner;
use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// What the CLI parser produced for one command
#[derive(Debug, Clone, Default)]
pub struct ParsedInvocation {
    /// Declared positional arguments, in order
    pub args: Vec<String>,
    /// Options actually supplied on the command line
    pub options: OptionMap,
    /// Arguments captured after the declared positionals (and after `--`)
    pub trailing: Vec<String>,
}

/// Process-wide inputs shared by every context built in this run
#[derive(Clone)]
pub struct Session {
    pub cwd: PathBuf,
    pub raw_args: Vec<String>,
    pub env: HashMap<String, String>,
    pub runner: Arc<dyn ProcessRunner>,
    pub tool: Arc<ToolInfo>,
    pub logger: Logger,
}

/// Everything a handler gets for one command execution
#[derive(Clone)]
pub struct CommandContext {
    pub cwd: PathBuf,
    pub command_name: String,
    pub options: OptionMap,
    pub args: Vec<String>,
    pub pass_through_args: Vec<String>,
    pub raw_command_line: Vec<String>,
    pub env: HashMap<String, String>,
    pub logger: Logger,
    pub user_config: Option<Arc<HostConfig>>,
    pub runner: Arc<dyn ProcessRunner>,
    pub tool: Arc<ToolInfo>,
}

impl CommandContext {
    /// Deserialize the merged options into a command's typed option record
    pub fn options_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(Value::Object(self.options.clone()))
            .with_context(|| format!("Invalid options for command \"{}\"", self.command_name))
    }

    pub fn flag(&self, key: &str) -> bool {
        self.options.get(key).is_some_and(is_truthy)
    }

    pub fn string_option(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::String(s) => s == "true",
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

/// Shallow key-by-key merge; later layers win.
pub fn merge_options(
    definition_defaults: &OptionMap,
    user_defaults: &OptionMap,
    cli_options: &OptionMap,
) -> OptionMap {
    let mut merged = definition_defaults.clone();
    for layer in [user_defaults, cli_options] {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Build a fresh context for one execution of `definition`.
pub fn build_context(
    definition: &CommandDefinition,
    parsed: ParsedInvocation,
    user_config: Option<Arc<HostConfig>>,
    session: &Session,
) -> CommandContext {
    let empty = OptionMap::new();
    let user_defaults = user_config
        .as_ref()
        .and_then(|config| config.defaults.get(&definition.name))
        .unwrap_or(&empty);

    let options = merge_options(
        &definition.definition_defaults(),
        user_defaults,
        &parsed.options,
    );

    let pass_through_args = if definition.allow_pass_through {
        parsed.trailing
    } else {
        Vec::new()
    };

    CommandContext {
        cwd: session.cwd.clone(),
        command_name: definition.name.clone(),
        options,
        args: parsed.args,
        pass_through_args,
        raw_command_line: session.raw_args.clone(),
        env: session.env.clone(),
        logger: session.logger,
        user_config,
        runner: session.runner.clone(),
        tool: session.tool.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::runtime::{Invocation, ProcessError, RunResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Runner that records invocations instead of spawning processes
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<Invocation>>,
        /// Programs that report a failing exit status
        pub failing: Vec<String>,
    }

    impl RecordingRunner {
        pub fn failing(programs: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: programs.iter().map(|p| p.to_string()).collect(),
            }
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(&self, invocation: Invocation) -> Result<RunResult, ProcessError> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.failing.contains(&invocation.program) {
                if invocation.reject_on_error {
                    return Err(ProcessError::ExitStatus {
                        command: invocation.display(),
                        code: "1".to_string(),
                    });
                }
                return Ok(RunResult {
                    status: Some(1),
                    stdout: Vec::new(),
                });
            }
            Ok(RunResult {
                status: Some(0),
                stdout: Vec::new(),
            })
        }
    }

    pub fn session(cwd: &std::path::Path, runner: Arc<dyn ProcessRunner>) -> Session {
        Session {
            cwd: cwd.to_path_buf(),
            raw_args: vec!["create-library".to_string()],
            env: HashMap::new(),
            runner,
            tool: Arc::new(ToolInfo::for_tests(cwd)),
            logger: Logger::silent(),
        }
    }

    /// Context for `command` with the given options, as a handler would see it
    pub fn context(
        cwd: &std::path::Path,
        command: &str,
        options: serde_json::Value,
        runner: Arc<dyn ProcessRunner>,
    ) -> CommandContext {
        let session = session(cwd, runner);
        CommandContext {
            cwd: session.cwd,
            command_name: command.to_string(),
            options: options.as_object().cloned().unwrap_or_default(),
            args: Vec::new(),
            pass_through_args: Vec::new(),
            raw_command_line: session.raw_args,
            env: session.env,
            logger: session.logger,
            user_config: None,
            runner: session.runner,
            tool: session.tool,
        }
    }
}
