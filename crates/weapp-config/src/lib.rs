//! Mini-Program configuration.
//!
//! Reads `app.json`, page and component JSON and the project's
//! `weapp.config.json`. All of them accept line and block comments and
//! trailing commas.

pub mod app;
pub mod error;
pub mod jsonc;
pub mod project;

pub use app::{trim_id, AppConfig, ComponentConfig, SubPackage, TabBar, Workers, APP_BAR, CUSTOM_TAB_BAR};
pub use error::{ConfigError, ConfigResult};
pub use jsonc::{parse_config, read_config, read_optional_config};
pub use project::{
    DynamicImportMode, OverrideConfig, ProjectConfig, ShareMode, ShareStrategy,
    SharedChunksConfig, PROJECT_CONFIG_FILE,
};
