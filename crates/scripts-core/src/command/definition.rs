//! Declarative command definitions

use super::context::CommandContext;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Options of one invocation, keyed by long flag name without dashes
pub type OptionMap = Map<String, Value>;

/// Turns a raw flag value into an option value
pub type ValueParserFn = fn(&str) -> Result<Value, String>;

/// The work a command performs once its context is built
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, context: &CommandContext) -> anyhow::Result<()>;
}

/// A declared option, e.g. `-w, --watch` or `--rollup-config <path>`
#[derive(Clone)]
pub struct OptionDefinition {
    pub flags: String,
    pub description: String,
    pub default_value: Option<Value>,
    pub value_parser: Option<ValueParserFn>,
}

impl OptionDefinition {
    pub fn new(flags: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            flags: flags.into(),
            description: description.into(),
            default_value: None,
            value_parser: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn value_parser(mut self, parser: ValueParserFn) -> Self {
        self.value_parser = Some(parser);
        self
    }

    pub fn spec(&self) -> FlagSpec {
        FlagSpec::parse(&self.flags)
    }
}

/// A declared positional argument: `<name>` is required, `[name]` optional
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    pub description: Option<String>,
    pub default_value: Option<String>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.name.starts_with('<')
    }

    /// Bare name without brackets or variadic dots
    pub fn id(&self) -> String {
        self.name
            .trim_matches(|c| c == '<' || c == '>' || c == '[' || c == ']')
            .trim_end_matches("...")
            .to_string()
    }
}

/// Parsed shape of an option's flag string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Option key, e.g. `rollup-config` or `clean` for `--no-clean`
    pub key: String,
    /// Long flag as written, without dashes (`no-clean`)
    pub long: String,
    pub short: Option<char>,
    /// Placeholder of a value-taking option (`path` for `<path>`)
    pub value_name: Option<String>,
    pub value_required: bool,
    /// `--no-x` style flag that sets `x` to false
    pub negated: bool,
}

impl FlagSpec {
    pub fn parse(flags: &str) -> Self {
        let mut long = String::new();
        let mut short = None;
        let mut value_name = None;
        let mut value_required = false;

        for token in flags.split([',', ' ', '|']).filter(|t| !t.is_empty()) {
            if let Some(name) = token.strip_prefix("--") {
                long = name.to_string();
            } else if let Some(name) = token.strip_prefix('-') {
                short = name.chars().next();
            } else if token.starts_with('<') || token.starts_with('[') {
                value_required = token.starts_with('<');
                value_name = Some(
                    token
                        .trim_matches(|c| c == '<' || c == '>' || c == '[' || c == ']')
                        .to_string(),
                );
            }
        }

        let (key, negated) = match long.strip_prefix("no-") {
            Some(rest) if value_name.is_none() => (rest.to_string(), true),
            _ => (long.clone(), false),
        };

        Self {
            key,
            long,
            short,
            value_name,
            value_required,
            negated,
        }
    }

    pub fn takes_value(&self) -> bool {
        self.value_name.is_some()
    }
}

/// Declarative description of a CLI subcommand
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub summary: Option<String>,
    pub description: String,
    pub examples: Vec<String>,
    pub arguments: Vec<ArgumentDefinition>,
    pub options: Vec<OptionDefinition>,
    pub allow_unknown_options: bool,
    pub allow_pass_through: bool,
    pub is_default: bool,
    pub default_options: OptionMap,
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            summary: None,
            description: description.into(),
            examples: Vec::new(),
            arguments: Vec::new(),
            options: Vec::new(),
            allow_unknown_options: false,
            allow_pass_through: false,
            is_default: false,
            default_options: OptionMap::new(),
            handler,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn allow_unknown_options(mut self) -> Self {
        self.allow_unknown_options = true;
        self
    }

    pub fn allow_pass_through(mut self) -> Self {
        self.allow_pass_through = true;
        self
    }

    pub fn default_command(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn default_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_options.insert(key.into(), value.into());
        self
    }

    pub fn handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Lowest merge layer: option-level defaults, then `default_options`
    pub fn definition_defaults(&self) -> OptionMap {
        let mut defaults = OptionMap::new();

        for option in &self.options {
            let spec = option.spec();
            if let Some(value) = &option.default_value {
                defaults.insert(spec.key, value.clone());
            } else if spec.negated {
                defaults.insert(spec.key, Value::Bool(true));
            }
        }

        for (key, value) in &self.default_options {
            defaults.insert(key.clone(), value.clone());
        }

        defaults
    }

    /// Whether `name` is this command's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

impl fmt::Debug for OptionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDefinition")
            .field("flags", &self.flags)
            .field("default_value", &self.default_value)
            .field("value_parser", &self.value_parser.is_some())
            .finish()
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("summary", &self.summary)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("allow_unknown_options", &self.allow_unknown_options)
            .field("allow_pass_through", &self.allow_pass_through)
            .field("is_default", &self.is_default)
            .field("default_options", &self.default_options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boolean_flag() {
        let spec = FlagSpec::parse("--watch");
        assert_eq!(spec.key, "watch");
        assert!(!spec.takes_value());
        assert!(!spec.negated);
    }

    #[test]
    fn test_parse_short_and_value() {
        let spec = FlagSpec::parse("-c, --rollup-config <path>");
        assert_eq!(spec.key, "rollup-config");
        assert_eq!(spec.short, Some('c'));
        assert_eq!(spec.value_name.as_deref(), Some("path"));
        assert!(spec.value_required);
    }

    #[test]
    fn test_parse_negated_flag() {
        let spec = FlagSpec::parse("--no-clean");
        assert_eq!(spec.key, "clean");
        assert_eq!(spec.long, "no-clean");
        assert!(spec.negated);
    }

    #[test]
    fn test_argument_ids() {
        assert_eq!(ArgumentDefinition::new("[directory]").id(), "directory");
        assert!(ArgumentDefinition::new("<name>").is_required());
        assert!(!ArgumentDefinition::new("[name]").is_required());
    }
}
