pub mod config_load;
pub mod config_types;
pub mod scenario;

pub use config_load::Config;
pub use config_types::{DisplayConfig, PathConfig, PlaybackConfig, TemplateConfig};
pub use scenario::ScenarioConfig;
