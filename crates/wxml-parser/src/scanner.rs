//! Single-pass markup scanner.

use crate::directive::{Directive, GuardStack};
use crate::event::EventDirective;
use crate::lexer::MarkupLexer;
use crate::platform::Platform;
use crate::token::{Dependency, DependencyKind, EventBindingSite, TokenRecord};
use smol_str::SmolStr;
use source_span::Span;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a custom tag is left out of component usage.
pub type ExcludeComponent = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options for a scan.
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// The platform being compiled for.
    pub platform: Platform,
    /// Tags for which this returns true are not recorded as components.
    pub exclude_component: Option<ExcludeComponent>,
}

impl ScanOptions {
    /// Options for `platform` with no exclusions.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            exclude_component: None,
        }
    }

    /// Exclude tags matching `predicate` from component usage.
    pub fn with_exclude_component<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exclude_component = Some(Arc::new(predicate));
        self
    }

    fn is_excluded(&self, tag: &str) -> bool {
        self.exclude_component
            .as_ref()
            .is_some_and(|predicate| predicate(tag))
    }
}

impl fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("platform", &self.platform)
            .field("exclude_component", &self.exclude_component.is_some())
            .finish()
    }
}

/// Scan `source` into a token record.
///
/// Never fails: anything the scanner does not recognize is left as text.
pub fn scan(source: impl Into<Arc<str>>, options: &ScanOptions) -> TokenRecord {
    let source = source.into();
    let mut record = TokenRecord::new(Arc::clone(&source), options.platform);
    let mut scanner = Scanner {
        lexer: MarkupLexer::new(&source),
        options,
        guards: GuardStack::new(options.platform),
        record: &mut record,
    };
    scanner.run();
    let removals = scanner.guards.finish(source.len() as u32);
    record.removals = removals;
    record
}

/// Rewrite a script module path written with a compiled-source extension
/// to the path the platform loads.
///
/// `a.wxs.ts` → `a.wxs`, `a.ts` → `a.wxs`; anything else is unchanged.
pub fn normalize_script_module_path(path: &str, platform: Platform) -> SmolStr {
    let ext = platform.script_module_ext();
    let stem = [".ts", ".js"]
        .iter()
        .find_map(|compiled| path.strip_suffix(compiled));
    match stem {
        Some(stem) if stem.is_empty() => SmolStr::from(path),
        Some(stem) if stem.ends_with(&format!(".{}", ext)) || stem.ends_with(".wxs") => {
            SmolStr::from(stem)
        }
        Some(stem) => SmolStr::from(format!("{}.{}", stem, ext)),
        None => SmolStr::from(path),
    }
}

/// An attribute read from an opening tag.
struct Attr<'a> {
    name: &'a str,
    name_span: Span,
    value: Option<Span>,
}

struct Scanner<'a, 'r> {
    lexer: MarkupLexer<'a>,
    options: &'a ScanOptions,
    guards: GuardStack,
    record: &'r mut TokenRecord,
}

impl<'a, 'r> Scanner<'a, 'r> {
    fn run(&mut self) {
        while !self.lexer.is_eof() {
            if self.lexer.starts_with("<!--") {
                self.scan_comment();
            } else if self.lexer.starts_with("</") {
                self.lexer.skip_closing_tag();
            } else if self.lexer.starts_with("{{") {
                // Mustaches may hold `<` comparisons.
                self.lexer.consume_until("}}");
                self.lexer.consume("}}");
            } else if self.lexer.starts_with("<")
                && self
                    .lexer
                    .peek_second()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            {
                self.scan_element();
            } else {
                self.lexer.consume_text();
            }
        }
    }

    fn scan_comment(&mut self) {
        let start = self.lexer.pos();
        self.lexer.consume("<!--");
        let body = self.lexer.consume_until("-->");
        self.lexer.consume("-->");
        let span = self.lexer.span_from(start);

        // Guard comments belong to the range they open or close, so a
        // failing guard's own markers are never recorded as comments.
        let keep = match Directive::parse(body) {
            Some(directive @ Directive::If { .. }) => {
                self.guards.apply(&directive, span);
                !self.guards.is_suppressed()
            }
            Some(directive @ Directive::EndIf) => {
                let was_suppressed = self.guards.is_suppressed();
                self.guards.apply(&directive, span);
                !was_suppressed
            }
            None => !self.guards.is_suppressed(),
        };
        if keep {
            self.record.comments.push(span);
        }
    }

    fn scan_element(&mut self) {
        let start = self.lexer.pos();
        self.lexer.consume("<");
        let Some(tag) = self.lexer.read_tag_name() else {
            return;
        };
        let (attrs, self_closing) = self.read_attributes();
        let tag_span = self.lexer.span_from(start);
        let suppressed = self.guards.is_suppressed();
        let platform = self.options.platform;

        if platform.is_script_module_tag(tag) {
            self.scan_script_module(tag, &attrs, tag_span, self_closing, suppressed);
            return;
        }
        if suppressed {
            return;
        }

        match tag {
            "import" | "include" => {
                let kind = if tag == "import" {
                    DependencyKind::Import
                } else {
                    DependencyKind::Include
                };
                if let Some(value) = find_attr(&attrs, "src").and_then(|a| a.value) {
                    let path = SmolStr::from(self.lexer.slice(value));
                    self.record.dependencies.push(Dependency {
                        kind,
                        normalized_path: path.clone(),
                        source_path: path,
                        span: value,
                        tag_span,
                        module_name: None,
                    });
                }
            }
            _ if !platform.is_builtin_tag(tag) && !self.options.is_excluded(tag) => {
                self.record
                    .components
                    .entry(SmolStr::from(tag))
                    .or_default()
                    .push(tag_span);
            }
            _ => {}
        }

        for attr in &attrs {
            if let Some(directive) = EventDirective::parse(attr.name) {
                self.record.events.push(EventBindingSite {
                    attr_name: attr.name.into(),
                    event_name: directive.event,
                    modifiers: directive.modifiers,
                    flags: directive.flags,
                    span: attr.name_span,
                });
            }
        }
    }

    fn scan_script_module(
        &mut self,
        tag: &str,
        attrs: &[Attr<'a>],
        tag_span: Span,
        self_closing: bool,
        suppressed: bool,
    ) {
        let platform = self.options.platform;
        let module_name = find_attr(attrs, "module")
            .or_else(|| find_attr(attrs, "name"))
            .and_then(|a| a.value)
            .map(|span| SmolStr::from(self.lexer.slice(span)));
        let src = find_attr(attrs, platform.script_src_attr(tag)).and_then(|a| a.value);

        let dependency = match src {
            Some(value) => {
                if !self_closing && !platform.is_script_import_tag(tag) {
                    self.lexer.read_raw_content(tag);
                    self.lexer.skip_closing_tag();
                }
                let path = self.lexer.slice(value);
                Dependency {
                    kind: DependencyKind::WxsExternal,
                    source_path: path.into(),
                    normalized_path: normalize_script_module_path(path, platform),
                    span: value,
                    tag_span,
                    module_name,
                }
            }
            None if self_closing => return,
            None => {
                let body = self.lexer.read_raw_content(tag);
                self.lexer.skip_closing_tag();
                Dependency {
                    kind: DependencyKind::WxsInline,
                    source_path: SmolStr::default(),
                    normalized_path: SmolStr::default(),
                    span: body,
                    tag_span,
                    module_name,
                }
            }
        };
        if !suppressed {
            self.record.dependencies.push(dependency);
        }
    }

    /// Read attributes up to and including `>` or `/>`.
    fn read_attributes(&mut self) -> (Vec<Attr<'a>>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.lexer.skip_whitespace();
            if self.lexer.is_eof() {
                return (attrs, false);
            }
            if self.lexer.consume("/>") {
                return (attrs, true);
            }
            if self.lexer.consume(">") {
                return (attrs, false);
            }
            if self.lexer.starts_with("{{") {
                self.lexer.consume_until("}}");
                self.lexer.consume("}}");
                continue;
            }

            let name_start = self.lexer.pos();
            let name = self.lexer.read_attr_name();
            if name.is_empty() {
                // Stray quote, `/` or `<`: step over it.
                self.lexer.next_char();
                continue;
            }
            let name_span = self.lexer.span_from(name_start);

            self.lexer.skip_whitespace();
            let value = if self.lexer.consume("=") {
                self.lexer.skip_whitespace();
                Some(self.lexer.read_attr_value())
            } else {
                None
            };
            attrs.push(Attr {
                name,
                name_span,
                value,
            });
        }
    }
}

fn find_attr<'s, 'a>(attrs: &'s [Attr<'a>], name: &str) -> Option<&'s Attr<'a>> {
    attrs.iter().find(|a| a.name == name)
}
