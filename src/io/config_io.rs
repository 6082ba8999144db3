use std::fs;
use std::path::{Path, PathBuf};

use crate::io::project_io::{MARKER_DIR, ProjectError};
use crate::model::config::Config;

pub const CONFIG_FILE: &str = "taskmagic.toml";

/// Path of the config file for a project root
pub fn config_path(root: &Path) -> PathBuf {
    root.join(MARKER_DIR).join(CONFIG_FILE)
}

/// Read `.ai/taskmagic.toml`, falling back to defaults when it is absent.
pub fn read_config(root: &Path) -> Result<Config, ProjectError> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ProjectError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ProjectError::ConfigParseError { path, source: e })
}
