//! Wires command definitions into the `clap` parser and dispatches the match

use super::context::{build_context, ParsedInvocation, Session};
use super::definition::{CommandDefinition, OptionMap};
use super::lifecycle::execute_with_hooks;
use super::registry::ensure_unique_names;
use crate::config::HostConfig;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::sync::Arc;

/// Id of the hidden catch-all collecting pass-through and unknown arguments
const TRAILING_ID: &str = "__trailing";

fn string_value(raw: &str) -> Result<Value, String> {
    Ok(Value::String(raw.to_string()))
}

/// Build one subcommand from its definition
pub fn to_subcommand(definition: &CommandDefinition) -> Command {
    let mut command = Command::new(definition.name.clone())
        .about(
            definition
                .summary
                .clone()
                .unwrap_or_else(|| definition.description.clone()),
        )
        .long_about(definition.description.clone());

    for alias in &definition.aliases {
        command = command.visible_alias(alias.clone());
    }

    for argument in &definition.arguments {
        let mut arg = Arg::new(argument.id())
            .required(argument.is_required())
            .action(ArgAction::Set);
        if let Some(description) = &argument.description {
            arg = arg.help(description.clone());
        }
        if let Some(default) = &argument.default_value {
            arg = arg.default_value(default.clone());
        }
        command = command.arg(arg);
    }

    for option in &definition.options {
        let spec = option.spec();
        let mut arg = Arg::new(spec.long.clone())
            .long(spec.long.clone())
            .help(option.description.clone());

        if let Some(short) = spec.short {
            arg = arg.short(short);
        }

        arg = match &spec.value_name {
            Some(value_name) => {
                let arg = arg
                    .value_name(value_name.clone())
                    .action(ArgAction::Set)
                    .value_parser(option.value_parser.unwrap_or(string_value));
                if spec.value_required {
                    arg
                } else {
                    arg.num_args(0..=1).default_missing_value("true")
                }
            }
            None if spec.negated => arg.action(ArgAction::SetFalse),
            None => arg.action(ArgAction::SetTrue),
        };

        command = command.arg(arg);
    }

    if definition.allow_pass_through || definition.allow_unknown_options {
        command = command.arg(
            Arg::new(TRAILING_ID)
                .num_args(0..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .hide(true),
        );
    }

    if !definition.examples.is_empty() {
        let examples = definition
            .examples
            .iter()
            .map(|example| format!("  $ {}", example))
            .collect::<Vec<_>>()
            .join("\n");
        command = command.after_help(format!("Examples:\n{}", examples));
    }

    command
}

/// Top-level parser with one subcommand per definition, in listing order
pub fn build_program(
    bin_name: &str,
    about: &str,
    version: &str,
    definitions: &[CommandDefinition],
) -> Command {
    let mut program = Command::new(bin_name.to_string())
        .about(about.to_string())
        .version(version.to_string());

    for definition in definitions {
        program = program.subcommand(to_subcommand(definition));
    }

    program
}

/// Insert the default command's name when the first argument names no command.
pub fn route_default_command(raw_args: &[String], definitions: &[CommandDefinition]) -> Vec<String> {
    let Some(default) = definitions.iter().find(|d| d.is_default) else {
        return raw_args.to_vec();
    };

    let passthrough = match raw_args.get(1).map(String::as_str) {
        Some("-h" | "--help" | "-V" | "--version" | "help") => true,
        Some(first) => definitions.iter().any(|d| d.answers_to(first)),
        None => false,
    };

    if passthrough {
        return raw_args.to_vec();
    }

    let mut routed = Vec::with_capacity(raw_args.len() + 1);
    routed.extend(raw_args.first().cloned());
    routed.push(default.name.clone());
    routed.extend(raw_args.iter().skip(1).cloned());
    routed
}

/// Separate positionals, supplied options and trailing arguments
pub fn parse_invocation(definition: &CommandDefinition, matches: &ArgMatches) -> ParsedInvocation {
    let args = definition
        .arguments
        .iter()
        .filter_map(|argument| matches.get_one::<String>(&argument.id()).cloned())
        .collect();

    let mut options = OptionMap::new();
    for option in &definition.options {
        let spec = option.spec();
        if matches.value_source(&spec.long) != Some(ValueSource::CommandLine) {
            continue;
        }

        let value = if spec.takes_value() {
            matches.get_one::<Value>(&spec.long).cloned()
        } else {
            Some(Value::Bool(matches.get_flag(&spec.long)))
        };

        if let Some(value) = value {
            options.insert(spec.key, value);
        }
    }

    let trailing = if definition.allow_pass_through || definition.allow_unknown_options {
        matches
            .get_many::<String>(TRAILING_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    ParsedInvocation {
        args,
        options,
        trailing,
    }
}

/// Parse `session.raw_args`, run the matched command through the lifecycle
/// pipeline and return the process exit code.
pub async fn dispatch(
    definitions: &[CommandDefinition],
    host: Option<Arc<HostConfig>>,
    session: &Session,
    about: &str,
) -> anyhow::Result<i32> {
    ensure_unique_names(definitions)?;

    let routed = route_default_command(&session.raw_args, definitions);
    let mut program = build_program(&session.tool.bin_name, about, &session.tool.version, definitions);

    let matches = match program.try_get_matches_from_mut(&routed) {
        Ok(matches) => matches,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            return Ok(code);
        }
    };

    let Some((name, sub_matches)) = matches.subcommand() else {
        program.print_help()?;
        return Ok(1);
    };

    let definition = definitions
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown command \"{}\"", name))?;

    let parsed = parse_invocation(definition, sub_matches);
    let context = build_context(definition, parsed, host.clone(), session);
    let hooks = host.as_ref().and_then(|config| config.hooks.as_deref());

    let outcome = execute_with_hooks(definition, &context, hooks).await?;
    Ok(outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::context::test_support::{session, RecordingRunner};
    use crate::command::context::CommandContext;
    use crate::command::definition::{ArgumentDefinition, CommandHandler, OptionDefinition};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        seen: Mutex<Option<(OptionMap, Vec<String>, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl CommandHandler for Capture {
        async fn run(&self, context: &CommandContext) -> anyhow::Result<()> {
            *self.seen.lock().unwrap() = Some((
                context.options.clone(),
                context.args.clone(),
                context.pass_through_args.clone(),
            ));
            if self.fail {
                anyhow::bail!("handler failed");
            }
            Ok(())
        }
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn build_def(handler: Arc<Capture>) -> CommandDefinition {
        CommandDefinition::new("build", "Compile and bundle", handler)
            .allow_pass_through()
            .default_option("clean", true)
            .option(OptionDefinition::new("--watch", "Watch mode"))
            .option(OptionDefinition::new("--no-clean", "Skip cleaning"))
            .option(OptionDefinition::new("--tsconfig <path>", "tsconfig"))
    }

    fn init_def(handler: Arc<Capture>) -> CommandDefinition {
        CommandDefinition::new("init", "Scaffold", handler)
            .default_command()
            .alias("create")
            .argument(ArgumentDefinition::new("[directory]"))
            .option(OptionDefinition::new("--name <package-name>", "Name"))
    }

    async fn run(definitions: &[CommandDefinition], raw: &[&str]) -> i32 {
        let temp = tempfile::tempdir().unwrap();
        let mut session = session(temp.path(), Arc::new(RecordingRunner::default()));
        session.raw_args = args(raw);
        dispatch(definitions, None, &session, "test").await.unwrap()
    }

    #[test]
    fn test_route_default_command() {
        let defs = vec![init_def(Arc::default()), build_def(Arc::default())];

        assert_eq!(
            route_default_command(&args(&["cl", "my-lib"]), &defs),
            args(&["cl", "init", "my-lib"])
        );
        assert_eq!(route_default_command(&args(&["cl"]), &defs), args(&["cl", "init"]));
        assert_eq!(
            route_default_command(&args(&["cl", "build"]), &defs),
            args(&["cl", "build"])
        );
        assert_eq!(
            route_default_command(&args(&["cl", "create", "x"]), &defs),
            args(&["cl", "create", "x"])
        );
        assert_eq!(
            route_default_command(&args(&["cl", "--help"]), &defs),
            args(&["cl", "--help"])
        );
    }

    #[test]
    fn test_program_lists_commands_in_order() {
        let defs = vec![init_def(Arc::default()), build_def(Arc::default())];
        let program = build_program("cl", "about", "1.0.0", &defs);
        let names: Vec<_> = program.get_subcommands().map(|c| c.get_name().to_string()).collect();
        assert_eq!(names, vec!["init", "build"]);
    }

    #[tokio::test]
    async fn test_dispatch_only_supplied_options_enter_cli_layer() {
        let handler = Arc::new(Capture::default());
        let defs = vec![build_def(handler.clone())];

        let code = run(&defs, &["cl", "build", "--watch"]).await;

        assert_eq!(code, 0);
        let (options, _, _) = handler.seen.lock().unwrap().clone().unwrap();
        assert_eq!(options["watch"], json!(true));
        assert_eq!(options["clean"], json!(true));
        assert!(!options.contains_key("tsconfig"));
    }

    #[tokio::test]
    async fn test_dispatch_negated_flag_and_pass_through() {
        let handler = Arc::new(Capture::default());
        let defs = vec![build_def(handler.clone())];

        let code = run(
            &defs,
            &["cl", "build", "--no-clean", "--tsconfig", "t.json", "--", "--environment", "production"],
        )
        .await;

        assert_eq!(code, 0);
        let (options, _, pass_through) = handler.seen.lock().unwrap().clone().unwrap();
        assert_eq!(options["clean"], json!(false));
        assert_eq!(options["tsconfig"], json!("t.json"));
        assert_eq!(pass_through, args(&["--environment", "production"]));
    }

    #[tokio::test]
    async fn test_dispatch_default_command_positional() {
        let handler = Arc::new(Capture::default());
        let defs = vec![init_def(handler.clone())];

        let code = run(&defs, &["cl", "my-lib", "--name", "cool"]).await;

        assert_eq!(code, 0);
        let (options, positional, pass_through) = handler.seen.lock().unwrap().clone().unwrap();
        assert_eq!(positional, args(&["my-lib"]));
        assert_eq!(options["name"], json!("cool"));
        assert!(pass_through.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failed_handler_sets_exit_code() {
        let handler = Arc::new(Capture {
            seen: Mutex::new(None),
            fail: true,
        });
        let defs = vec![build_def(handler)];

        assert_eq!(run(&defs, &["cl", "build"]).await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_usage_error_exits_one() {
        let defs = vec![init_def(Arc::default())];
        assert_eq!(run(&defs, &["cl", "init", "--bogus"]).await, 1);
    }

    #[tokio::test]
    async fn test_value_parser_is_applied() {
        fn parse_count(raw: &str) -> Result<Value, String> {
            raw.parse::<u64>()
                .map(Value::from)
                .map_err(|_| format!("\"{}\" is not a number", raw))
        }

        let handler = Arc::new(Capture::default());
        let defs = vec![CommandDefinition::new("test", "Test", handler.clone())
            .option(OptionDefinition::new("--max-workers <n>", "Workers").value_parser(parse_count))];

        assert_eq!(run(&defs, &["cl", "test", "--max-workers", "4"]).await, 0);
        let (options, _, _) = handler.seen.lock().unwrap().clone().unwrap();
        assert_eq!(options["max-workers"], json!(4));

        assert_eq!(run(&defs, &["cl", "test", "--max-workers", "four"]).await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_duplicate_names() {
        let defs = vec![
            build_def(Arc::default()),
            CommandDefinition::new("format", "Format", Arc::new(Capture::default())).alias("build"),
        ];

        let temp = tempfile::tempdir().unwrap();
        let mut session = session(temp.path(), Arc::new(RecordingRunner::default()));
        session.raw_args = args(&["cl", "--help"]);

        let err = dispatch(&defs, None, &session, "test").await.unwrap_err();
        assert!(err.to_string().contains("\"build\""));
    }
}
