//! The token record produced by one scan.

use crate::event::EventModifiers;
use crate::platform::Platform;
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_span::Span;
use std::sync::Arc;

/// What kind of edge a dependency tag describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DependencyKind {
    /// `<import src="...">`
    Import,
    /// `<include src="...">`
    Include,
    /// `<wxs src="...">` and the platform equivalents.
    WxsExternal,
    /// `<wxs module="m">...</wxs>` with an inline body.
    WxsInline,
}

impl DependencyKind {
    /// Whether the dependency names another template.
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Import | Self::Include)
    }
}

/// A dependency edge found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dependency {
    /// The kind of edge.
    pub kind: DependencyKind,
    /// The path as written in the source. Empty for inline modules.
    pub source_path: SmolStr,
    /// The path the output should reference. Differs from `source_path`
    /// only for script modules written with a compiled-source extension.
    pub normalized_path: SmolStr,
    /// Span of the attribute value, or of the body for inline modules.
    pub span: Span,
    /// Span of the whole opening tag.
    pub tag_span: Span,
    /// The `module` attribute of a script module tag.
    pub module_name: Option<SmolStr>,
}

impl Dependency {
    /// Whether the output path differs from the written one.
    pub fn needs_rewrite(&self) -> bool {
        self.source_path != self.normalized_path
    }
}

/// One `@event.modifiers` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventBindingSite {
    /// The attribute name as written, e.g. `@tap.catch`.
    pub attr_name: SmolStr,
    /// The event name, e.g. `tap`.
    pub event_name: SmolStr,
    /// Non-empty modifier segments in source order.
    pub modifiers: Vec<SmolStr>,
    /// Flags derived from the modifiers.
    pub flags: EventModifiers,
    /// Span of the attribute name.
    pub span: Span,
}

impl EventBindingSite {
    /// The native attribute name this site rewrites to.
    pub fn native_name(&self) -> String {
        format!("{}:{}", self.flags.prefix(), self.event_name)
    }
}

/// Everything the scanner learned about one markup source.
///
/// The record owns its source, so spans can never be applied to a
/// different string.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    source: Arc<str>,
    /// The platform the record was scanned for.
    pub platform: Platform,
    /// Dependency edges in source order.
    pub dependencies: Vec<Dependency>,
    /// Custom component tags and the spans of their opening tags, in order
    /// of first use.
    pub components: IndexMap<SmolStr, Vec<Span>>,
    /// Event directive sites in source order.
    pub events: Vec<EventBindingSite>,
    /// Ranges compiled out by inactive guards, sorted by start. Nested
    /// ranges may appear; the outer range wins.
    pub removals: Vec<Span>,
    /// Every comment outside a removed range, guard comments included.
    pub comments: Vec<Span>,
}

impl TokenRecord {
    pub(crate) fn new(source: Arc<str>, platform: Platform) -> Self {
        Self {
            source,
            platform,
            dependencies: Vec::new(),
            components: IndexMap::new(),
            events: Vec::new(),
            removals: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// The scanned source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// A shared handle to the scanned source.
    pub fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    /// Start offsets of all removal ranges.
    pub fn remove_starts(&self) -> impl Iterator<Item = u32> + '_ {
        self.removals.iter().map(|span| span.start)
    }

    /// End offsets of all removal ranges.
    pub fn remove_ends(&self) -> impl Iterator<Item = u32> + '_ {
        self.removals.iter().map(|span| span.end)
    }

    /// Dependencies naming other templates.
    pub fn template_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.kind.is_template())
    }

    /// External script module dependencies.
    pub fn script_module_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::WxsExternal)
    }

    /// Whether the handler would change nothing with every option enabled.
    pub fn is_plain(&self) -> bool {
        self.events.is_empty()
            && self.removals.is_empty()
            && self.comments.is_empty()
            && !self.dependencies.iter().any(Dependency::needs_rewrite)
    }
}
