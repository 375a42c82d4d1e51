//! Structural import extraction from script modules.
//!
//! Only the specifiers are extracted; the script grammar is not parsed.

use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = [
        r#"\bimport\s*\(\s*["'](?P<dynamic>[^"'\n]+)["']\s*\)"#,
        r#"\bimport\s+(?P<type_import>type\s+)?(?:[\w$*{}\s,]+?\s+from\s+)?["'](?P<static>[^"'\n]+)["']"#,
        r#"\bexport\s+(?P<type_export>type\s+)?[\w$*{}\s,]+?\s+from\s+["'](?P<reexport>[^"'\n]+)["']"#,
        r#"\brequire\s*\(\s*["'](?P<require>[^"'\n]+)["']\s*\)"#,
    ]
    .join("|");
    Regex::new(&pattern).expect("import pattern is valid")
});

/// How a specifier was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import x from '...'` or `import '...'`.
    Static,
    /// `export ... from '...'`.
    ReExport,
    /// `require('...')`.
    Require,
    /// `import('...')`.
    Dynamic,
}

/// One import site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// The specifier as written.
    pub specifier: SmolStr,
    /// How it was referenced.
    pub kind: ImportKind,
}

impl ImportRef {
    /// Whether the import is a dynamic `import()`.
    pub fn is_dynamic(&self) -> bool {
        self.kind == ImportKind::Dynamic
    }
}

/// Extract import specifiers from `source` in source order. Type-only
/// imports and exports are skipped; imports inside comments or string
/// literals are ignored.
pub fn extract_imports(source: &str) -> Vec<ImportRef> {
    let code = mask_source(source);
    let mut imports = Vec::new();
    for caps in IMPORT_RE.captures_iter(&code) {
        if caps.name("type_import").is_some() || caps.name("type_export").is_some() {
            continue;
        }
        let found = [
            ("dynamic", ImportKind::Dynamic),
            ("static", ImportKind::Static),
            ("reexport", ImportKind::ReExport),
            ("require", ImportKind::Require),
        ]
        .into_iter()
        .find_map(|(group, kind)| caps.name(group).map(|m| (&source[m.range()], kind)));
        if let Some((specifier, kind)) = found {
            let specifier = specifier.trim();
            if specifier.is_empty() {
                continue;
            }
            imports.push(ImportRef {
                specifier: SmolStr::from(specifier),
                kind,
            });
        }
    }
    imports
}

/// Blank comments and the contents of string and template literals with
/// spaces. Quotes, newlines and byte offsets are kept, so a match in the
/// masked text reads back from `source` at the same range.
fn mask_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
                out.push(c);
            } else {
                blank(&mut out, c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                }
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('/', Some('/')) => {
                blank(&mut out, c);
                while let Some(&nc) = chars.peek() {
                    if nc == '\n' {
                        break;
                    }
                    blank(&mut out, nc);
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                blank(&mut out, c);
                if let Some(star) = chars.next() {
                    blank(&mut out, star);
                }
                let mut prev = '\0';
                for nc in chars.by_ref() {
                    blank(&mut out, nc);
                    if prev == '*' && nc == '/' {
                        break;
                    }
                    prev = nc;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn blank(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat(' ').take(c.len_utf8()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn specifiers(source: &str) -> Vec<(String, ImportKind)> {
        extract_imports(source)
            .into_iter()
            .map(|i| (i.specifier.to_string(), i.kind))
            .collect()
    }

    #[test]
    fn test_import_forms() {
        let source = r#"
import { a, b as c } from './shared/common'
import Default, * as ns from "../utils/index";
import './side-effect'
export { x } from '/shared/reexport'
export * from './all'
const lib = require('dayjs')
const lazy = () => import('./lazy/page')
"#;
        assert_eq!(
            specifiers(source),
            vec![
                ("./shared/common".to_string(), ImportKind::Static),
                ("../utils/index".to_string(), ImportKind::Static),
                ("./side-effect".to_string(), ImportKind::Static),
                ("/shared/reexport".to_string(), ImportKind::ReExport),
                ("./all".to_string(), ImportKind::ReExport),
                ("dayjs".to_string(), ImportKind::Require),
                ("./lazy/page".to_string(), ImportKind::Dynamic),
            ]
        );
    }

    #[test]
    fn test_multiline_import_clause() {
        let source = "import {\n  one,\n  two,\n} from './many'\n";
        assert_eq!(specifiers(source), vec![("./many".to_string(), ImportKind::Static)]);
    }

    #[test]
    fn test_type_only_imports_are_skipped() {
        let source = "import type { Foo } from './types'\nexport type { Bar } from './types2'\nimport real from './real'";
        assert_eq!(specifiers(source), vec![("./real".to_string(), ImportKind::Static)]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "// import a from './a'\n/* require('./b') */\nconst url = 'http://x'; import c from './c'";
        assert_eq!(specifiers(source), vec![("./c".to_string(), ImportKind::Static)]);
    }

    #[test]
    fn test_imports_inside_strings_are_ignored() {
        let source = "const s = \"require('./x')\"\nconst t = `lazy: import('./y')`\nconst u = '// not a comment'; import real from './real'\n";
        assert_eq!(specifiers(source), vec![("./real".to_string(), ImportKind::Static)]);
    }

    #[test]
    fn test_specifier_is_read_from_source() {
        let source = "/* 注释 */ import a from './ä/模块'\nconst b = require(\"./b\")";
        assert_eq!(
            specifiers(source),
            vec![
                ("./ä/模块".to_string(), ImportKind::Static),
                ("./b".to_string(), ImportKind::Require),
            ]
        );
    }

    #[test]
    fn test_dynamic_flag() {
        let imports = extract_imports("import('./x')");
        assert!(imports[0].is_dynamic());
    }
}
