// src/config/config_load.rs
//
// loading of config.toml

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::config_types::{DisplayConfig, PathConfig, PlaybackConfig, TemplateConfig};
use crate::errors::SettingsError;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub template: TemplateConfig,

    /// Directory the settings were read from; relative paths resolve against it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, SettingsError> {
        // First try to load from the executable's directory
        if let Some(exe_config) = Self::load_from_exe_dir() {
            return Ok(exe_config);
        }

        // Fallback to loading from the current working directory
        Self::load_from_working_dir()
    }

    fn load_from_exe_dir() -> Option<Self> {
        let exe_path = std::env::current_exe().ok()?;
        let exe_dir = exe_path.parent()?;
        let config_path = exe_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return None;
        }
        match Self::load_from(&config_path) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %config_path.display(), %err, "ignoring unreadable settings next to executable");
                None
            }
        }
    }

    fn load_from_working_dir() -> Result<Self, SettingsError> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Err(SettingsError::NotFound);
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!(path = %path.display(), "loaded settings");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Absolute paths are kept. Relative ones are looked up next to the
    /// settings file first, then taken as relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.base_dir {
            Some(dir) if !dir.as_os_str().is_empty() && dir.join(path).exists() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn resolve_domain_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.domain_file)
    }

    pub fn resolve_problem_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.problem_file)
    }

    pub fn resolve_plan_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.plan_file)
    }

    pub fn resolve_scenario_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.scenario_file)
    }

    pub fn resolve_template_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.template_directory)
    }
}
