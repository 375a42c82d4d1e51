//! Specifier classification and lookup against the source tree.
//!
//! Ids are source-relative, `/`-separated and never start with `/`.

use smol_str::SmolStr;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, for script specifiers.
pub const SCRIPT_EXTENSIONS: [&str; 2] = ["ts", "js"];

/// Prefix of vendor module ids.
pub const VENDOR_PREFIX: &str = "npm:";

/// What a specifier refers to before lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier<'a> {
    /// `./x` or `../x`, relative to the importer.
    Relative(&'a str),
    /// `/x`, relative to the source root.
    Absolute(&'a str),
    /// `plugin://...`.
    Plugin,
    /// A package name, optionally followed by a subpath.
    Bare(&'a str),
}

impl<'a> Specifier<'a> {
    /// Classify a specifier.
    pub fn classify(specifier: &'a str) -> Self {
        if specifier.starts_with("plugin://") {
            Self::Plugin
        } else if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." {
            Self::Relative(specifier)
        } else if let Some(rest) = specifier.strip_prefix('/') {
            Self::Absolute(rest)
        } else {
            Self::Bare(specifier)
        }
    }
}

/// The package a bare specifier names: `dayjs/plugin/utc` → `dayjs`,
/// `@vant/weapp/button` → `@vant/weapp`.
pub fn package_name(specifier: &str) -> &str {
    let mut segments = specifier.splitn(3, '/');
    let first = segments.next().unwrap_or_default();
    if first.starts_with('@') {
        match segments.next() {
            Some(second) => &specifier[..first.len() + 1 + second.len()],
            None => first,
        }
    } else {
        first
    }
}

/// Id of the vendor module for a bare specifier.
pub fn vendor_id(specifier: &str) -> SmolStr {
    SmolStr::from(format!("{}{}", VENDOR_PREFIX, package_name(specifier)))
}

/// The directory part of an id, `""` at the root.
pub fn dirname(id: &str) -> &str {
    match id.rfind('/') {
        Some(idx) => &id[..idx],
        None => "",
    }
}

/// Join `relative` onto `base_dir` and normalize `.` and `..` segments.
/// Returns `None` when the path escapes the source root.
pub fn join_id(base_dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Resolve `specifier` written in a file under `importer_dir` to a
/// candidate id. Bare and plugin specifiers yield `None`.
pub fn candidate_id(importer_dir: &str, specifier: &str) -> Option<String> {
    match Specifier::classify(specifier) {
        Specifier::Relative(rel) => join_id(importer_dir, rel),
        Specifier::Absolute(abs) => join_id("", abs),
        Specifier::Plugin | Specifier::Bare(_) => None,
    }
}

/// Drop a trailing `.ts` or `.js`.
pub fn strip_script_ext(id: &str) -> &str {
    SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| id.strip_suffix(ext).and_then(|s| s.strip_suffix('.')))
        .unwrap_or(id)
}

/// The source tree on disk.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// A source tree rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The source root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file path of `id` (or of any source-relative path).
    pub fn path(&self, id: &str) -> PathBuf {
        if id.is_empty() {
            self.root.clone()
        } else {
            self.root.join(id)
        }
    }

    /// Whether `rel` names an existing file.
    pub fn is_file(&self, rel: &str) -> bool {
        !rel.is_empty() && self.path(rel).is_file()
    }

    /// Look a script candidate up: the exact path, then `.ts`, `.js`,
    /// `/index.ts`, `/index.js`. Returns the module id (extension-less)
    /// and the file.
    pub fn resolve_script(&self, candidate: &str) -> Option<(SmolStr, PathBuf)> {
        if self.is_file(candidate) {
            return Some((SmolStr::from(strip_script_ext(candidate)), self.path(candidate)));
        }
        for ext in SCRIPT_EXTENSIONS {
            let file = format!("{}.{}", candidate, ext);
            if self.is_file(&file) {
                return Some((SmolStr::from(candidate), self.path(&file)));
            }
        }
        for ext in SCRIPT_EXTENSIONS {
            let file = join_id(candidate, &format!("index.{}", ext))?;
            if self.is_file(&file) {
                return Some((SmolStr::from(strip_script_ext(&file)), self.path(&file)));
            }
        }
        None
    }

    /// The script file of an entry: `<id>.ts`, then `<id>.js`.
    pub fn entry_script(&self, id: &str) -> Option<PathBuf> {
        SCRIPT_EXTENSIONS
            .iter()
            .map(|ext| format!("{}.{}", id, ext))
            .find(|file| self.is_file(file))
            .map(|file| self.path(&file))
    }

    /// Whether anything of an entry (`<id>.json`, template, script) exists.
    pub fn entry_exists(&self, id: &str, template_ext: &str) -> bool {
        self.is_file(&format!("{}.json", id))
            || self.is_file(&format!("{}.{}", id, template_ext))
            || self.entry_script(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_classify() {
        assert_eq!(Specifier::classify("./a"), Specifier::Relative("./a"));
        assert_eq!(Specifier::classify("../a"), Specifier::Relative("../a"));
        assert_eq!(Specifier::classify("/shared/a"), Specifier::Absolute("shared/a"));
        assert_eq!(Specifier::classify("plugin://x/y"), Specifier::Plugin);
        assert_eq!(Specifier::classify("dayjs"), Specifier::Bare("dayjs"));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("dayjs"), "dayjs");
        assert_eq!(package_name("dayjs/plugin/utc"), "dayjs");
        assert_eq!(package_name("@vant/weapp/button/index"), "@vant/weapp");
        assert_eq!(package_name("@scope"), "@scope");
        assert_eq!(vendor_id("lodash/get"), "npm:lodash");
    }

    #[test]
    fn test_join_id() {
        assert_eq!(join_id("pages/index", "../../shared/a").as_deref(), Some("shared/a"));
        assert_eq!(join_id("pages/index", "./b").as_deref(), Some("pages/index/b"));
        assert_eq!(join_id("", "shared//a").as_deref(), Some("shared/a"));
        assert_eq!(join_id("pages", "../../a"), None);
        assert_eq!(candidate_id("pages/x", "/shared/c").as_deref(), Some("shared/c"));
        assert_eq!(candidate_id("pages/x", "dayjs"), None);
    }

    #[test]
    fn test_strip_script_ext() {
        assert_eq!(strip_script_ext("a/b.ts"), "a/b");
        assert_eq!(strip_script_ext("a/b.js"), "a/b");
        assert_eq!(strip_script_ext("a/b.wxs"), "a/b.wxs");
        assert_eq!(strip_script_ext("a/bts"), "a/bts");
    }

    #[test]
    fn test_resolve_script_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shared/lib")).unwrap();
        fs::write(dir.path().join("shared/a.ts"), "").unwrap();
        fs::write(dir.path().join("shared/a.js"), "").unwrap();
        fs::write(dir.path().join("shared/lib/index.js"), "").unwrap();
        let tree = SourceTree::new(dir.path());

        let (id, path) = tree.resolve_script("shared/a").unwrap();
        assert_eq!(id, "shared/a");
        assert_eq!(path, dir.path().join("shared/a.ts"));

        let (id, path) = tree.resolve_script("shared/a.js").unwrap();
        assert_eq!(id, "shared/a");
        assert_eq!(path, dir.path().join("shared/a.js"));

        let (id, _) = tree.resolve_script("shared/lib").unwrap();
        assert_eq!(id, "shared/lib/index");

        assert!(tree.resolve_script("shared/none").is_none());
    }
}
