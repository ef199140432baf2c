//! Command registry for built-in and host-supplied commands.

use super::definition::CommandDefinition;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Cannot override command \"{0}\" because it does not exist.")]
    NotFound(String),
    #[error("Command name \"{name}\" is used by both \"{first}\" and \"{second}\".")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
}

/// Registry of command definitions keyed by name.
///
/// Iteration follows insertion order; replacing an entry keeps its position.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, CommandDefinition>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any existing one with the same name.
    pub fn add(&mut self, definition: CommandDefinition) {
        self.commands.insert(definition.name.clone(), definition);
    }

    /// Replace an existing definition with the updater's result.
    ///
    /// The entry stays keyed by `name` even if the updater renames the
    /// definition; the CLI is built from the definition's own name.
    pub fn override_command<F>(&mut self, name: &str, updater: F) -> Result<(), RegistryError>
    where
        F: FnOnce(CommandDefinition) -> CommandDefinition,
    {
        let current = self
            .commands
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let updated = updater(current);
        if updated.name != name {
            tracing::debug!(key = name, renamed = %updated.name, "override renamed command definition");
        }
        self.commands.insert(name.to_string(), updated);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    /// Definitions in insertion order
    pub fn list(&self) -> Vec<CommandDefinition> {
        self.commands.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Restricted view handed to host extension code
    pub fn adapter(&mut self) -> RegistryAdapter<'_> {
        RegistryAdapter { registry: self }
    }
}

/// Capability-restricted registry view: `has`, `add` and `override` only.
pub struct RegistryAdapter<'a> {
    registry: &'a mut CommandRegistry,
}

impl RegistryAdapter<'_> {
    pub fn has(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    pub fn add(&mut self, definition: CommandDefinition) {
        self.registry.add(definition);
    }

    pub fn override_command<F>(&mut self, name: &str, updater: F) -> Result<(), RegistryError>
    where
        F: FnOnce(CommandDefinition) -> CommandDefinition,
    {
        self.registry.override_command(name, updater)
    }
}

/// Host transformation applied to the built-in command set
pub type ExtendFn = dyn Fn(&mut RegistryAdapter<'_>) -> anyhow::Result<()> + Send + Sync;

/// Resolve the final command set: built-ins first (so they lead the help
/// listing), then the host's `extend` transformation.
pub fn resolve_commands(
    builtins: Vec<CommandDefinition>,
    extend: Option<&ExtendFn>,
) -> anyhow::Result<Vec<CommandDefinition>> {
    let mut registry = CommandRegistry::new();
    for definition in builtins {
        registry.add(definition);
    }

    if let Some(extend) = extend {
        extend(&mut registry.adapter())?;
    }

    Ok(registry.list())
}

/// Every command name and alias must be unique across the final set.
pub fn ensure_unique_names(definitions: &[CommandDefinition]) -> Result<(), RegistryError> {
    let mut owners: IndexMap<&str, &str> = IndexMap::new();
    for definition in definitions {
        let names = std::iter::once(definition.name.as_str())
            .chain(definition.aliases.iter().map(String::as_str));
        for name in names {
            if let Some(first) = owners.insert(name, definition.name.as_str()) {
                return Err(RegistryError::DuplicateName {
                    name: name.to_string(),
                    first: first.to_string(),
                    second: definition.name.clone(),
                });
            }
        }
    }
    Ok(())
}
