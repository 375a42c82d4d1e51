//! Conditional-compilation directives carried in markup comments.
//!
//! ```text
//! <!-- #ifdef weapp alipay -->
//! ...
//! <!-- #endif -->
//! ```

use crate::platform::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;
use source_span::Span;

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*#\s*(ifdef|ifndef|endif)\b(.*)$").expect("directive pattern is valid")
});

/// A directive found in a comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `#ifdef a b` (or `#ifndef` when `negated`).
    If {
        /// Lowercased platform names.
        platforms: Vec<SmolStr>,
        /// `#ifndef`.
        negated: bool,
    },
    /// `#endif`.
    EndIf,
}

impl Directive {
    /// Parse the body of a comment (the text between `<!--` and `-->`).
    ///
    /// A guard without platforms is not a directive and stays an ordinary
    /// comment.
    pub fn parse(comment_body: &str) -> Option<Self> {
        let caps = DIRECTIVE_RE.captures(comment_body)?;
        let keyword = caps.get(1)?.as_str().to_ascii_lowercase();
        if keyword == "endif" {
            return Some(Self::EndIf);
        }
        let platforms: Vec<SmolStr> = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == '|' || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| SmolStr::from(p.to_ascii_lowercase()))
            .collect();
        if platforms.is_empty() {
            return None;
        }
        Some(Self::If {
            platforms,
            negated: keyword == "ifndef",
        })
    }
}

/// An open guard on the stack.
#[derive(Debug, Clone)]
struct Guard {
    /// Offset of the opening comment.
    start: u32,
    /// Whether the content survives: this guard and every ancestor match.
    active: bool,
}

/// Tracks nested guards while scanning and collects removal ranges.
#[derive(Debug)]
pub struct GuardStack {
    platform: Platform,
    stack: Vec<Guard>,
    removals: Vec<Span>,
}

impl GuardStack {
    /// Create an empty stack for the target platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            stack: Vec::new(),
            removals: Vec::new(),
        }
    }

    /// Whether content at the current position is compiled out.
    pub fn is_suppressed(&self) -> bool {
        self.stack.last().is_some_and(|guard| !guard.active)
    }

    /// Feed a directive found in the comment spanning `comment`.
    pub fn apply(&mut self, directive: &Directive, comment: Span) {
        match directive {
            Directive::If { platforms, negated } => {
                let listed = platforms.iter().any(|p| p == self.platform.as_str());
                let matches = listed != *negated;
                let active = matches && !self.is_suppressed();
                tracing::trace!(
                    platforms = ?platforms,
                    negated,
                    active,
                    offset = comment.start,
                    "open guard"
                );
                self.stack.push(Guard {
                    start: comment.start,
                    active,
                });
            }
            Directive::EndIf => match self.stack.pop() {
                Some(guard) if !guard.active => {
                    self.removals.push(Span::new(guard.start, comment.end));
                }
                Some(_) => {}
                None => tracing::trace!(offset = comment.start, "dangling #endif ignored"),
            },
        }
    }

    /// Close the scan at `eof`. Unterminated inactive guards remove
    /// everything up to the end of the source.
    pub fn finish(mut self, eof: u32) -> Vec<Span> {
        while let Some(guard) = self.stack.pop() {
            if !guard.active {
                tracing::warn!(offset = guard.start, "unterminated #ifdef removes the rest of the file");
                self.removals.push(Span::new(guard.start, eof));
            }
        }
        self.removals.sort();
        self.removals
    }
}
