//! `app.json`, page and component configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The app configuration (`app.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Main package pages, source-relative and extension-less.
    #[serde(default)]
    pub pages: Vec<String>,
    /// Globally registered components.
    #[serde(default)]
    pub using_components: IndexMap<String, String>,
    /// Subpackages. `subpackages` is accepted as well.
    #[serde(default, alias = "subpackages")]
    pub sub_packages: Vec<SubPackage>,
    /// Tab bar settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_bar: Option<TabBar>,
    /// App bar settings. Presence alone enables `app-bar/index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_bar: Option<Value>,
    /// Worker script directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<Workers>,
}

impl AppConfig {
    /// Main package entry ids named directly by this config: `pages`, then
    /// the custom tab bar and the app bar when enabled.
    pub fn page_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pages.iter().map(|p| trim_id(p).to_string()).collect();
        if self.tab_bar.as_ref().is_some_and(TabBar::is_custom) {
            ids.push(CUSTOM_TAB_BAR.to_string());
        }
        if self.app_bar.is_some() {
            ids.push(APP_BAR.to_string());
        }
        ids
    }

    /// The worker directory, normalized, if workers are configured.
    pub fn workers_dir(&self) -> Option<&str> {
        self.workers.as_ref().map(|w| trim_id(w.path())).filter(|p| !p.is_empty())
    }
}

/// Entry id of the custom tab bar component.
pub const CUSTOM_TAB_BAR: &str = "custom-tab-bar/index";

/// Entry id of the app bar component.
pub const APP_BAR: &str = "app-bar/index";

/// A subpackage declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPackage {
    /// Directory of the subpackage, relative to the source root.
    pub root: String,
    /// Pages, relative to `root`.
    #[serde(default)]
    pub pages: Vec<String>,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Independent subpackages can be opened without the main package.
    #[serde(default)]
    pub independent: bool,
}

impl SubPackage {
    /// The root without leading `./` or surrounding slashes.
    pub fn normalized_root(&self) -> &str {
        trim_id(&self.root)
    }

    /// Page entry ids qualified by the root.
    pub fn page_ids(&self) -> Vec<String> {
        let root = self.normalized_root();
        self.pages
            .iter()
            .map(|page| format!("{}/{}", root, trim_id(page)))
            .collect()
    }
}

/// `tabBar` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabBar {
    /// Whether the tab bar is a custom component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

impl TabBar {
    /// Whether `custom` is truthy.
    pub fn is_custom(&self) -> bool {
        self.custom.as_ref().is_some_and(is_truthy)
    }
}

/// `workers`, either a path or `{ "path": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Workers {
    /// `"workers": "workers"`
    Path(String),
    /// `"workers": { "path": "workers" }`
    Object {
        /// The worker directory.
        path: String,
    },
}

impl Workers {
    /// The worker directory as written.
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Object { path } => path,
        }
    }
}

/// Page or component configuration (`<entry>.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    /// Whether the entry declares itself a component.
    #[serde(default)]
    pub component: bool,
    /// Components used by this entry.
    #[serde(default)]
    pub using_components: IndexMap<String, String>,
    /// Generic component placeholders, mapped to their default component.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub component_generics: IndexMap<String, Value>,
}

impl ComponentConfig {
    /// Component references: `usingComponents` values plus the `default`
    /// of every generic that names one.
    pub fn component_refs(&self) -> impl Iterator<Item = &str> {
        let generics = self
            .component_generics
            .values()
            .filter_map(|g| g.get("default").and_then(Value::as_str));
        self.using_components.values().map(String::as_str).chain(generics)
    }
}

/// Strip a leading `./` and surrounding slashes.
pub fn trim_id(id: &str) -> &str {
    id.trim_start_matches("./").trim_matches('/')
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
