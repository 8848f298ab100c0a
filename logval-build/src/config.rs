//! Configuration loading from logval.toml.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{IoResultExt, LogvalError, LogvalResult};

pub const CONFIG_FILE: &str = "logval.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "logval_providers.rs";

/// Contents of logval.toml. Every table is optional.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LogvalConfig {
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Source roots relative to the crate root.
    pub roots: Vec<String>,
    /// Directory names skipped while scanning.
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            roots: vec!["src".to_string()],
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Artifact file name inside OUT_DIR.
    pub file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

/// A bare file name: no separators and not `.` or `..`.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Loads logval.toml from the crate root if it exists.
pub fn load_config(root: &Path) -> LogvalResult<Option<LogvalConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg: LogvalConfig =
        toml::from_str(&content).map_err(|e| LogvalError::config(&path, e.to_string()))?;
    if !is_plain_file_name(&cfg.output.file) {
        return Err(LogvalError::config(
            &path,
            "output.file must be a plain file name",
        ));
    }
    Ok(Some(cfg))
}
