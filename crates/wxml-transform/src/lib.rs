//! Markup handler.
//!
//! Turns a [`TokenRecord`] into output text without re-scanning: every edit
//! is a span recorded by the scanner, applied in ascending order.

use source_span::EditBuffer;
use wxml_parser::{scan, ScanOptions, TokenRecord};

/// Options for [`handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOptions {
    /// Strip `<!-- -->` comments, guard markers included.
    pub remove_comment: bool,
    /// Rewrite `@event.modifiers` to the native binding syntax.
    pub transform_event: bool,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            remove_comment: true,
            transform_event: true,
        }
    }
}

/// The handler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleResult {
    /// The rewritten markup.
    pub code: String,
}

/// Apply the edits recorded in `token`.
///
/// Removal ranges are excised whole, markers included, and surrounding
/// whitespace is left alone. Script module paths written with a
/// compiled-source extension always point at the emitted file.
pub fn handle(token: &TokenRecord, options: &HandleOptions) -> HandleResult {
    let source = token.source();
    let mut buffer = EditBuffer::new(source);

    for span in &token.removals {
        buffer.remove(*span);
    }

    if options.remove_comment {
        for span in &token.comments {
            buffer.remove(*span);
        }
    }

    if options.transform_event {
        for site in &token.events {
            buffer.replace(site.span, site.native_name());
        }
    }

    for dependency in token.dependencies.iter().filter(|d| d.needs_rewrite()) {
        buffer.replace(dependency.span, dependency.normalized_path.as_str());
    }

    tracing::trace!(edits = buffer.len(), "applying markup edits");
    HandleResult {
        code: buffer.apply(),
    }
}

/// Scan and handle `source` in one call.
pub fn transform(source: &str, scan_options: &ScanOptions, options: &HandleOptions) -> HandleResult {
    let token = scan(source, scan_options);
    handle(&token, options)
}
