//! Subcommands.

pub mod batch;
pub mod config;
pub mod manual;
pub mod parse;
pub mod scan;

use std::path::Path;

use tracing::debug;

use zoocert_core::models::config::ZoocertConfig;

/// Load the configuration from `path`, else from the default location, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<ZoocertConfig> {
    if let Some(path) = path {
        return Ok(ZoocertConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(ZoocertConfig::from_file(&default_path)?)
    } else {
        Ok(ZoocertConfig::default())
    }
}
