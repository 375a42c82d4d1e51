//! The sharing policy and override matchers.

use crate::error::PolicyError;
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use weapp_config::{DynamicImportMode, OverrideConfig, ShareMode, ShareStrategy, SharedChunksConfig};

/// Matches a module by id or by id with its source extension.
///
/// Compiled once when the policy is built; matching holds no state.
#[derive(Debug, Clone)]
pub enum ModuleMatcher {
    /// A glob over `/`-separated ids.
    Glob {
        /// The pattern as written.
        pattern: String,
        /// The compiled matcher.
        matcher: GlobMatcher,
    },
    /// A regex, written as `/pattern/`.
    Regex {
        /// The pattern as written.
        pattern: String,
        /// The compiled regex.
        regex: Regex,
    },
}

impl ModuleMatcher {
    /// Compile `test`. `/.../` is a regex; anything else is a glob.
    pub fn parse(test: &str) -> Result<Self, PolicyError> {
        let invalid = |message: String| PolicyError::InvalidPattern {
            test: test.to_string(),
            message,
        };

        if let Some(body) = test
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .filter(|body| !body.is_empty())
        {
            let regex = Regex::new(body).map_err(|e| invalid(e.to_string()))?;
            return Ok(Self::Regex {
                pattern: test.to_string(),
                regex,
            });
        }

        let glob = test.trim_start_matches("./").trim_start_matches('/');
        if glob.is_empty() {
            return Err(invalid("empty pattern".to_string()));
        }
        let matcher = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| invalid(e.to_string()))?
            .compile_matcher();
        Ok(Self::Glob {
            pattern: test.to_string(),
            matcher,
        })
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        match self {
            Self::Glob { pattern, .. } | Self::Regex { pattern, .. } => pattern,
        }
    }

    /// Whether the module `id`, or its id with extension, matches.
    pub fn is_match(&self, id: &str, id_with_extension: Option<&str>) -> bool {
        let test = |candidate: &str| match self {
            Self::Glob { matcher, .. } => matcher.is_match(candidate),
            Self::Regex { regex, .. } => regex.is_match(candidate),
        };
        test(id) || id_with_extension.is_some_and(test)
    }
}

/// One override: modules matching `matcher` use `mode`.
#[derive(Debug, Clone)]
pub struct Override {
    /// What the override applies to.
    pub matcher: ModuleMatcher,
    /// The mode it assigns.
    pub mode: ShareMode,
}

/// How shared modules are placed.
#[derive(Debug, Clone)]
pub struct SharingPolicy {
    /// Mode for modules no override matches.
    pub default_mode: ShareMode,
    /// How `common` modules not reached from the main package are placed.
    pub strategy: ShareStrategy,
    /// Ordered overrides; the first match wins.
    pub overrides: Vec<Override>,
    /// Treatment of dynamic-import targets.
    pub dynamic_imports: DynamicImportMode,
}

impl Default for SharingPolicy {
    fn default() -> Self {
        Self {
            default_mode: ShareMode::Common,
            strategy: ShareStrategy::Duplicate,
            overrides: Vec::new(),
            dynamic_imports: DynamicImportMode::Preserve,
        }
    }
}

impl SharingPolicy {
    /// A policy with no overrides.
    pub fn new(default_mode: ShareMode, strategy: ShareStrategy) -> Self {
        Self {
            default_mode,
            strategy,
            ..Self::default()
        }
    }

    /// Build a policy from the `chunks` config section, compiling every
    /// override.
    pub fn from_config(config: &SharedChunksConfig) -> Result<Self, PolicyError> {
        let overrides = config
            .overrides
            .iter()
            .map(|OverrideConfig { test, mode }| -> Result<Override, PolicyError> {
                Ok(Override {
                    matcher: ModuleMatcher::parse(test)?,
                    mode: *mode,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            default_mode: config.default_mode.unwrap_or_default(),
            strategy: config.strategy.unwrap_or_default(),
            overrides,
            dynamic_imports: config.dynamic_imports.unwrap_or_default(),
        })
    }

    /// Append an override.
    pub fn with_override(mut self, test: &str, mode: ShareMode) -> Result<Self, PolicyError> {
        self.overrides.push(Override {
            matcher: ModuleMatcher::parse(test)?,
            mode,
        });
        Ok(self)
    }

    /// Use `mode` for dynamic-import targets.
    pub fn with_dynamic_imports(mut self, mode: DynamicImportMode) -> Self {
        self.dynamic_imports = mode;
        self
    }

    /// The mode of the first override matching the module, if any.
    pub fn override_mode(&self, id: &str, id_with_extension: Option<&str>) -> Option<ShareMode> {
        self.overrides
            .iter()
            .find(|o| o.matcher.is_match(id, id_with_extension))
            .map(|o| o.mode)
    }

    /// The effective mode: the first matching override, else the default.
    pub fn effective_mode(&self, id: &str, id_with_extension: Option<&str>) -> ShareMode {
        self.override_mode(id, id_with_extension)
            .unwrap_or(self.default_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_glob_matches_id_or_source_path() {
        let matcher = ModuleMatcher::parse("shared/path-only.ts").unwrap();
        assert!(!matcher.is_match("shared/path-only", None));
        assert!(matcher.is_match("shared/path-only", Some("shared/path-only.ts")));
        assert!(!matcher.is_match("shared/other", Some("shared/other.ts")));

        let matcher = ModuleMatcher::parse("./shared/*").unwrap();
        assert!(matcher.is_match("shared/a", None));
        assert!(!matcher.is_match("shared/deep/a", None));
        let matcher = ModuleMatcher::parse("shared/**").unwrap();
        assert!(matcher.is_match("shared/deep/a", None));
    }

    #[test]
    fn test_regex_form() {
        let matcher = ModuleMatcher::parse("/^utils/.*date/").unwrap();
        assert!(matches!(matcher, ModuleMatcher::Regex { .. }));
        assert!(matcher.is_match("utils/format-date", None));
        assert!(!matcher.is_match("shared/date", None));
        assert_eq!(matcher.pattern(), "/^utils/.*date/");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            ModuleMatcher::parse("/(unclosed/"),
            Err(PolicyError::InvalidPattern { .. })
        ));
        assert!(ModuleMatcher::parse("shared/[").is_err());
        assert!(ModuleMatcher::parse("").is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let policy = SharingPolicy::new(ShareMode::Common, ShareStrategy::Hoist)
            .with_override("shared/lazy/**", ShareMode::Inline)
            .unwrap()
            .with_override("shared/**", ShareMode::Path)
            .unwrap();
        assert_eq!(policy.effective_mode("shared/lazy/a", None), ShareMode::Inline);
        assert_eq!(policy.effective_mode("shared/b", None), ShareMode::Path);
        assert_eq!(policy.effective_mode("lib/c", None), ShareMode::Common);
    }

    #[test]
    fn test_from_config_defaults() {
        let policy = SharingPolicy::from_config(&SharedChunksConfig::default()).unwrap();
        assert_eq!(policy.default_mode, ShareMode::Common);
        assert_eq!(policy.strategy, ShareStrategy::Duplicate);
        assert_eq!(policy.dynamic_imports, DynamicImportMode::Preserve);
        assert!(policy.overrides.is_empty());
    }
}
