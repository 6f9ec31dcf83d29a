pub mod files;
pub mod healthcheck;
pub mod restart;
pub mod status;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use nodewatch_core::{Config, NodeRole};

pub(crate) fn load_config(explicit: Option<&Path>) -> Result<Config> {
    Config::load(explicit).context("failed to load nodewatch config")
}

/// Role of this host: master when the host name equals `master_hostname`.
pub(crate) fn detect_role(config: &Config) -> Result<NodeRole> {
    let host = hostname::get().context("could not determine host name")?;
    let host = host.to_string_lossy();
    let role = NodeRole::from_hostname(&host, &config.master_hostname);
    tracing::debug!(host = %host, role = %role, "resolved node role");
    Ok(role)
}
