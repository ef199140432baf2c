//! Host configuration and config-file resolution
//!
//! This module provides:
//! - `HostConfig`, the extension point a host project uses to add or override
//!   commands, attach lifecycle hooks and set per-command option defaults
//! - Loading that configuration from `create-library.config.yaml`
//! - The layered lookup deciding which config file each external tool receives

pub mod file;
pub mod host;
pub mod resolver;

pub use file::{load_host_config, HostConfigError, CONFIG_FILE_NAMES};
pub use host::HostConfig;
pub use resolver::{find_packaged, resolve_config_path, ConfigRequest};
