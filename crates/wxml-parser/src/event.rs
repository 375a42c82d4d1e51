//! `@event.modifier` attribute parsing.
//!
//! Modifiers form an unordered set: `@tap.catch.capture` and
//! `@tap.capture.catch` describe the same binding.

use smol_str::SmolStr;
use std::fmt;

/// The native binding family an event directive rewrites to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingPrefix {
    /// `bind:`
    Bind,
    /// `catch:`
    Catch,
    /// `mut-bind:`
    MutBind,
    /// `capture-bind:`
    CaptureBind,
    /// `capture-catch:`
    CaptureCatch,
}

impl BindingPrefix {
    /// Get the prefix text without the trailing colon.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Catch => "catch",
            Self::MutBind => "mut-bind",
            Self::CaptureBind => "capture-bind",
            Self::CaptureCatch => "capture-catch",
        }
    }
}

impl fmt::Display for BindingPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The modifier flags that select a binding prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventModifiers {
    /// `.catch` was present.
    pub catch: bool,
    /// `.capture` was present.
    pub capture: bool,
    /// `.mut` was present.
    pub mutated: bool,
}

impl EventModifiers {
    /// Collect flags from raw modifier segments. Unknown and empty
    /// segments are ignored.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut modifiers = Self::default();
        for segment in segments {
            match segment {
                "catch" => modifiers.catch = true,
                "capture" => modifiers.capture = true,
                "mut" => modifiers.mutated = true,
                _ => {}
            }
        }
        modifiers
    }

    /// Resolve the binding prefix.
    ///
    /// `catch` outranks `mut`; `capture` combines with either `catch` or a
    /// plain binding.
    pub fn prefix(&self) -> BindingPrefix {
        match (self.capture, self.catch, self.mutated) {
            (true, true, _) => BindingPrefix::CaptureCatch,
            (true, false, _) => BindingPrefix::CaptureBind,
            (false, true, _) => BindingPrefix::Catch,
            (false, false, true) => BindingPrefix::MutBind,
            (false, false, false) => BindingPrefix::Bind,
        }
    }
}

/// A parsed `@event.modifiers` attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDirective {
    /// The event name (`tap` in `@tap.catch`).
    pub event: SmolStr,
    /// Non-empty modifier segments in source order.
    pub modifiers: Vec<SmolStr>,
    /// The flags derived from `modifiers`.
    pub flags: EventModifiers,
}

impl EventDirective {
    /// Parse an attribute name. Returns `None` when the name is not an
    /// event directive, in which case it stays plain text.
    pub fn parse(attr_name: &str) -> Option<Self> {
        let rest = attr_name.strip_prefix('@')?;
        let mut parts = rest.split('.');
        let event = parts.next()?;
        if event.is_empty()
            || !event
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            return None;
        }
        let modifiers: Vec<SmolStr> = parts
            .filter(|segment| !segment.is_empty())
            .map(SmolStr::from)
            .collect();
        let flags = EventModifiers::from_segments(modifiers.iter().map(SmolStr::as_str));
        Some(Self {
            event: event.into(),
            modifiers,
            flags,
        })
    }

    /// The native attribute name, e.g. `capture-catch:tap`.
    pub fn native_name(&self) -> String {
        format!("{}:{}", self.flags.prefix(), self.event)
    }
}
