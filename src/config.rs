use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::persist::load_json;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Side length in pixels of one color cell in exported swatches.
    pub swatch_scale: u32,
    pub pretty_json: bool,
    /// Treat read diagnostics as a failure of the command.
    pub fail_on_warnings: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            swatch_scale: 16,
            pretty_json: true,
            fail_on_warnings: false,
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("", "", "nclr_tool")
        .context("Unable to open config directory.")?;
    Ok(project_dirs.config_dir().join("config.json"))
}

impl ToolConfig {
    /// Loads the config at `path`, or from the user config directory. A file
    /// that doesn't exist gives the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_owned(),
            None => get_config_path()?,
        };
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        load_json(&path).with_context(|| format!("Invalid config file {}", path.display()))
    }
}
