//! Resolved entries.

use smol_str::SmolStr;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use weapp_config::ComponentConfig;
use wxml_parser::TokenRecord;

/// The root a module or entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootId {
    /// The main package.
    Main,
    /// A subpackage, by normalized root directory.
    Subpackage(SmolStr),
    /// The worker directory.
    Workers,
}

impl RootId {
    /// The partition this root belongs to.
    pub fn partition(&self) -> Partition {
        match self {
            Self::Main | Self::Subpackage(_) => Partition::App,
            Self::Workers => Partition::Workers,
        }
    }

    /// Whether this is the main package.
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Subpackage(root) => f.write_str(root),
            Self::Workers => f.write_str("workers"),
        }
    }
}

/// Independent output partitions. Modules never share files across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    /// The app: main package and subpackages.
    App,
    /// Worker scripts, emitted under `workers/`.
    Workers,
}

impl Partition {
    /// Lowercase name for output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Workers => "workers",
        }
    }
}

/// The kind of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// The app itself.
    App,
    /// A page.
    Page,
    /// A component.
    Component,
    /// A template pulled in through `<import>` or `<include>`.
    Template,
    /// A worker script.
    Worker,
}

impl EntryKind {
    /// Lowercase name for logs and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Page => "page",
            Self::Component => "component",
            Self::Template => "template",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved app, page, component, template or worker.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Source-relative id. Extension-less except for templates.
    pub id: SmolStr,
    /// What the entry is.
    pub kind: EntryKind,
    /// The root that owns the entry.
    pub root: RootId,
    /// The JSON config file, if one exists.
    pub json_path: Option<PathBuf>,
    /// Parsed config. Empty when the file is missing and for the app,
    /// whose config lives on [`crate::ProjectGraph::app_config`].
    pub config: ComponentConfig,
    /// The template file, if one exists.
    pub template_path: Option<PathBuf>,
    /// The script file, if one exists.
    pub script_path: Option<PathBuf>,
    /// The scanned template.
    pub token: Option<Arc<TokenRecord>>,
    /// Components resolved by the npm build rather than from source.
    pub vendor_components: Vec<SmolStr>,
}

impl Entry {
    /// Directory of the entry, source-relative, `""` at the root.
    pub fn dir(&self) -> &str {
        crate::resolve::dirname(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_partition() {
        assert_eq!(RootId::Main.partition(), Partition::App);
        assert_eq!(RootId::Subpackage("pkgA".into()).partition(), Partition::App);
        assert_eq!(RootId::Workers.partition(), Partition::Workers);
        assert_eq!(RootId::Subpackage("pkgA".into()).to_string(), "pkgA");
    }

    #[test]
    fn test_root_ordering_puts_main_first() {
        let mut roots = vec![
            RootId::Workers,
            RootId::Subpackage("b".into()),
            RootId::Main,
            RootId::Subpackage("a".into()),
        ];
        roots.sort();
        assert_eq!(
            roots,
            vec![
                RootId::Main,
                RootId::Subpackage("a".into()),
                RootId::Subpackage("b".into()),
                RootId::Workers,
            ]
        );
    }
}
