//! JSON with comments and trailing commas.
//!
//! Comments and trailing commas are blanked out rather than deleted, so the
//! line and column reported by `serde_json` still point into the original
//! file.

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse `source` as JSON with comments. `path` is only used for errors.
pub fn parse_config<T: DeserializeOwned>(source: &str, path: &Path) -> ConfigResult<T> {
    let json = strip_trailing_commas(&strip_comments(source));
    serde_json::from_str(&json).map_err(|e| ConfigError::parse(path, &e))
}

/// Read and parse the file at `path`.
pub fn read_config<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let source = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
    parse_config(&source, path)
}

/// Read and parse the file at `path`, or `None` when it does not exist.
pub fn read_optional_config<T: DeserializeOwned>(path: &Path) -> ConfigResult<Option<T>> {
    match read_config(path) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Replace `//` and `/* */` comments outside strings with spaces.
/// Newlines are kept.
pub fn strip_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }

        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                chars.next();
                result.push_str("  ");
                for nc in chars.by_ref() {
                    if nc == '\n' {
                        result.push('\n');
                        break;
                    }
                    result.push(blank(nc));
                }
            }
            ('/', Some('*')) => {
                chars.next();
                result.push_str("  ");
                while let Some(nc) = chars.next() {
                    if nc == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        result.push_str("  ");
                        break;
                    }
                    result.push(blank(nc));
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Replace commas directly followed (modulo whitespace) by `}` or `]`
/// with a space. Expects comments to be stripped already.
pub fn strip_trailing_commas(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, c) in json.char_indices() {
        if escape_next {
            escape_next = false;
            result.push(c);
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next = json[idx + 1..].chars().find(|ch| !ch.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    result.push(' ');
                } else {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}

fn blank(c: char) -> char {
    if c == '\n' || c == '\r' {
        c
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // This is a comment
            "key": "value", /* inline comment */
            "key2": "value with // in string"
        }"#;
        let result = strip_comments(input);
        assert!(!result.contains("// This"));
        assert!(!result.contains("/* inline"));
        assert!(result.contains("// in string"));
        assert_eq!(result.lines().count(), input.lines().count());
    }

    #[test]
    fn test_block_comment_keeps_lines() {
        let input = "{/* a\nb */\"k\": 1}";
        let result = strip_comments(input);
        assert_eq!(result, "{    \n    \"k\": 1}");
    }

    #[test]
    fn test_trailing_commas() {
        let value: Value = parse_config(
            "{\"pages\": [\"a\", \"b\",], \"window\": {\"x\": 1, /* c */ },}",
            Path::new("app.json"),
        )
        .unwrap();
        assert_eq!(value, json!({"pages": ["a", "b"], "window": {"x": 1}}));
    }

    #[test]
    fn test_commas_in_strings_untouched() {
        let value: Value =
            parse_config(r#"{"a": ",]", "b": "\",}"}"#, Path::new("x.json")).unwrap();
        assert_eq!(value, json!({"a": ",]", "b": "\",}"}));
    }

    #[test]
    fn test_parse_error_points_at_original_line() {
        let source = "{\n  // comment\n  /* block\n  */\n  \"a\": tru\n}";
        let err = parse_config::<Value>(source, Path::new("page.json")).unwrap_err();
        match err {
            ConfigError::Parse { line, path, .. } => {
                assert_eq!(line, 5);
                assert_eq!(path, Path::new("page.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_optional_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Option<Value> = read_optional_config(&dir.path().join("nope.json")).unwrap();
        assert!(missing.is_none());
        assert!(read_config::<Value>(&dir.path().join("nope.json"))
            .unwrap_err()
            .is_not_found());
    }
}
