//! Programmatic host configuration

use crate::command::definition::OptionMap;
use crate::command::lifecycle::CommandHooks;
use crate::command::registry::ExtendFn;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Extension point supplied by the project invoking the tool
#[derive(Default)]
pub struct HostConfig {
    /// Adds or overrides commands through the restricted registry adapter
    pub extend: Option<Box<ExtendFn>>,
    pub hooks: Option<Arc<dyn CommandHooks>>,
    /// Per-command option defaults, keyed by command name
    pub defaults: HashMap<String, OptionMap>,
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("extend", &self.extend.is_some())
            .field("hooks", &self.hooks.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}
