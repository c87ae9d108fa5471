// src/config/config_types.rs
//
// Config types for the app

use serde::Deserialize;
use std::time::Duration;

use crate::views::DisplayOptions;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PathConfig {
    pub domain_file: String,
    pub problem_file: String,
    pub plan_file: String,
    pub scenario_file: String,
    pub template_directory: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    pub interval_ms: u64, // Base time between two ticks at speed 1
    pub speed: u32,       // Multiplier, values below 1 are clamped
    pub autostart: bool,
}

impl PlaybackConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            speed: 1,
            autostart: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_name: bool,
    pub show_position: bool,
}

impl From<DisplayConfig> for DisplayOptions {
    fn from(config: DisplayConfig) -> Self {
        DisplayOptions {
            show_name: config.show_name,
            show_position: config.show_position,
        }
    }
}

/// Defaults used when generating a scenario skeleton from a domain.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TemplateConfig {
    pub position_predicate: String, // Predicate assumed to place objects
    pub mobile_index: usize,        // Parameter position of the placed object
    pub fixed_index: usize,         // Parameter position of its anchor
    pub default_duration: u32,
    pub default_sprite: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            position_predicate: "at".to_string(),
            mobile_index: 0,
            fixed_index: 1,
            default_duration: 10,
            default_sprite: "default_sprite.png".to_string(),
        }
    }
}
