//! Project configuration (`weapp.config.json`).

use crate::error::ConfigResult;
use crate::jsonc::read_optional_config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use wxml_parser::Platform;

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "weapp.config.json";

/// Project-level build settings. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Source root, relative to the project directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_root: Option<String>,
    /// Output directory, relative to the project directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    /// Target platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Strip markup comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_comment: Option<bool>,
    /// Rewrite `@event` attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_event: Option<bool>,
    /// Shared chunk policy.
    #[serde(default)]
    pub chunks: SharedChunksConfig,
}

impl ProjectConfig {
    /// Load `weapp.config.json` from `project_dir`. A missing file yields
    /// the defaults.
    pub fn load(project_dir: &Path) -> ConfigResult<Self> {
        let path = Self::path_in(project_dir);
        match read_optional_config(&path)? {
            Some(config) => {
                tracing::debug!(path = %path.display(), "loaded project config");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Where the project config lives for `project_dir`.
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_CONFIG_FILE)
    }
}

/// The `chunks` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedChunksConfig {
    /// Mode for modules no override matches. Defaults to `common`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<ShareMode>,
    /// How `common` modules reached only from subpackages are placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ShareStrategy>,
    /// Ordered overrides, first match wins.
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,
    /// Treatment of dynamic-import targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_imports: Option<DynamicImportMode>,
}

/// One `{ test, mode }` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// A glob, or a regex when written as `/pattern/`.
    pub test: String,
    /// The mode for matching modules.
    pub mode: ShareMode,
}

/// Where a shared module's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    /// One shared `common.js` file.
    #[default]
    Common,
    /// A file at the module's own source-relative path.
    Path,
    /// No shared file; every consumer carries its own copy.
    Inline,
}

/// How `common` modules that the main package does not reach are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStrategy {
    /// One copy per subpackage.
    #[default]
    Duplicate,
    /// Always the root `common.js`.
    Hoist,
}

/// Treatment of dynamic-import targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicImportMode {
    /// Keep a dedicated chunk.
    #[default]
    Preserve,
    /// Merge into the importer when there is exactly one.
    Inline,
}

macro_rules! keyword_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The configuration keyword.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("Unknown ", $what, ": {}"), s)),
                }
            }
        }
    };
}

keyword_enum!(ShareMode, "share mode", {
    Common => "common",
    Path => "path",
    Inline => "inline",
});

keyword_enum!(ShareStrategy, "share strategy", {
    Duplicate => "duplicate",
    Hoist => "hoist",
});

keyword_enum!(DynamicImportMode, "dynamic import mode", {
    Preserve => "preserve",
    Inline => "inline",
});
