//! Entry resolution.
//!
//! Starting from `app.json`, entries are discovered in waves: every wave is
//! loaded in parallel (config, template scan, script import extraction) and
//! then merged into the graph on one thread, which queues the next wave.
//! Resolution stops when a wave discovers nothing new.

use crate::cancel::CancelToken;
use crate::entry::{Entry, EntryKind, RootId};
use crate::error::{ResolveError, ResolveResult};
use crate::imports::{extract_imports, ImportRef};
use crate::module_graph::{ModuleGraph, ModuleIdx, ModuleKind, ModuleNode};
use crate::resolve::{
    candidate_id, dirname, join_id, strip_script_ext, vendor_id, SourceTree, Specifier,
    SCRIPT_EXTENSIONS,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_span::LineIndex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use weapp_config::{
    read_config, read_optional_config, trim_id, AppConfig, ComponentConfig, APP_BAR, CUSTOM_TAB_BAR,
};
use wxml_parser::{scan, Dependency, ExcludeComponent, Platform, ScanOptions, TokenRecord};

/// Id of the app entry.
pub const APP_ID: &str = "app";

/// Reads and scans source files for the resolver.
///
/// Implementations may cache; the resolver only asks for each file once
/// per build.
pub trait SourceLoader: Send + Sync {
    /// Read and scan a template.
    fn scan_template(&self, path: &Path, options: &ScanOptions) -> io::Result<Arc<TokenRecord>>;

    /// Read a script.
    fn read_script(&self, path: &Path) -> io::Result<Arc<str>>;
}

/// A [`SourceLoader`] reading straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn scan_template(&self, path: &Path, options: &ScanOptions) -> io::Result<Arc<TokenRecord>> {
        let source = std::fs::read_to_string(path)?;
        Ok(Arc::new(scan(source, options)))
    }

    fn read_script(&self, path: &Path) -> io::Result<Arc<str>> {
        Ok(Arc::from(std::fs::read_to_string(path)?))
    }
}

/// Options for [`EntryResolver`].
#[derive(Clone, Default)]
pub struct ResolveOptions {
    /// Target platform; selects the template extension and scanner rules.
    pub platform: Platform,
    /// Tags left out of component usage.
    pub exclude_component: Option<ExcludeComponent>,
}

impl ResolveOptions {
    /// Options for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            exclude_component: None,
        }
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            platform: self.platform,
            exclude_component: self.exclude_component.clone(),
        }
    }
}

/// Everything resolution produced.
#[derive(Debug)]
pub struct ProjectGraph {
    /// The source root.
    pub src_root: PathBuf,
    /// The target platform.
    pub platform: Platform,
    /// The parsed `app.json`.
    pub app_config: AppConfig,
    /// Entries by id in discovery order, the app first.
    pub entries: IndexMap<SmolStr, Entry>,
    /// The module graph, reachability propagated.
    pub graph: ModuleGraph,
}

impl ProjectGraph {
    /// The app entry.
    pub fn app(&self) -> Option<&Entry> {
        self.entries.get(APP_ID)
    }

    /// Look an entry up by id.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Entries of one kind.
    pub fn entries_of(&self, kind: EntryKind) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(move |e| e.kind == kind)
    }
}

/// Walks an app from `app.json` to every reachable entry and module.
pub struct EntryResolver {
    tree: SourceTree,
    options: ResolveOptions,
    scan_options: ScanOptions,
    loader: Arc<dyn SourceLoader>,
    cancel: CancelToken,
}

impl EntryResolver {
    /// A resolver for the app under `src_root`, reading from disk.
    pub fn new(src_root: impl Into<PathBuf>, options: ResolveOptions) -> Self {
        let scan_options = options.scan_options();
        Self {
            tree: SourceTree::new(src_root),
            options,
            scan_options,
            loader: Arc::new(FsLoader),
            cancel: CancelToken::new(),
        }
    }

    /// Use `loader` for file access.
    pub fn with_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Observe `cancel` between files.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve the whole app.
    pub fn resolve(&self) -> ResolveResult<ProjectGraph> {
        self.cancel.check()?;

        let app_json = self.tree.path("app.json");
        if !app_json.is_file() {
            return Err(ResolveError::missing(APP_ID, app_json, "config"));
        }
        let app_config: AppConfig = read_config(&app_json)?;
        let app_script = self
            .tree
            .entry_script(APP_ID)
            .ok_or_else(|| ResolveError::missing(APP_ID, self.tree.path("app.ts"), "script"))?;

        let roots = Roots::new(&app_config);
        let mut state = State {
            tree: &self.tree,
            platform: self.options.platform,
            roots,
            graph: ModuleGraph::new(),
            entries: IndexMap::new(),
            visited_entries: FxHashSet::default(),
            visited_modules: FxHashSet::default(),
        };

        let mut pending = Vec::new();
        let app_imports = self.script_imports(&app_script)?;
        let mut app = Entry {
            id: SmolStr::new_static(APP_ID),
            kind: EntryKind::App,
            root: RootId::Main,
            json_path: Some(app_json),
            config: ComponentConfig::default(),
            template_path: None,
            script_path: Some(app_script),
            token: None,
            vendor_components: Vec::new(),
        };
        for value in app_config.using_components.values() {
            state.queue_component(&mut app, value, &mut pending);
        }
        state.visited_entries.insert(app.id.clone());
        state.absorb(
            Loaded::Entry {
                entry: app,
                imports: app_imports,
            },
            &mut pending,
        );

        for id in app_config.page_ids() {
            let kind = if id == CUSTOM_TAB_BAR || id == APP_BAR {
                EntryKind::Component
            } else {
                EntryKind::Page
            };
            pending.push(Job::entry(id, kind));
        }
        for subpackage in &app_config.sub_packages {
            for id in subpackage.page_ids() {
                pending.push(Job::entry(id, EntryKind::Page));
            }
        }
        if let Some(dir) = app_config.workers_dir() {
            pending.extend(self.worker_jobs(dir));
        }

        while !pending.is_empty() {
            self.cancel.check()?;
            let wave: Vec<Job> = std::mem::take(&mut pending)
                .into_iter()
                .filter(|job| state.claim(job))
                .collect();
            tracing::debug!(jobs = wave.len(), "resolving wave");

            let loaded: Vec<ResolveResult<Loaded>> = wave
                .par_iter()
                .map(|job| {
                    self.cancel.check()?;
                    self.load(job)
                })
                .collect();

            for result in loaded {
                state.absorb(result?, &mut pending);
            }
        }

        let mut graph = state.graph;
        graph.propagate_reachability();
        tracing::debug!(
            entries = state.entries.len(),
            modules = graph.len(),
            "entry resolution finished"
        );

        Ok(ProjectGraph {
            src_root: self.tree.root().to_path_buf(),
            platform: self.options.platform,
            app_config,
            entries: state.entries,
            graph,
        })
    }

    fn worker_jobs(&self, dir: &str) -> Vec<Job> {
        let base = self.tree.path(dir);
        if !base.is_dir() {
            tracing::warn!(dir = %base.display(), "workers directory does not exist");
            return Vec::new();
        }
        WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(self.tree.root()).ok()?;
                let rel = rel.to_string_lossy().replace('\\', "/");
                let is_script = SCRIPT_EXTENSIONS
                    .iter()
                    .any(|ext| rel.ends_with(&format!(".{}", ext)));
                if !is_script || rel.ends_with(".d.ts") {
                    return None;
                }
                Some(Job::entry(strip_script_ext(&rel).to_string(), EntryKind::Worker))
            })
            .collect()
    }

    fn load(&self, job: &Job) -> ResolveResult<Loaded> {
        match job {
            Job::Entry { id, kind } => self.load_entry(id, *kind),
            Job::Module { id, path } => Ok(Loaded::Module {
                id: id.clone(),
                imports: self.script_imports(path)?,
            }),
        }
    }

    /// Load one entry. The root is assigned when the entry is absorbed.
    fn load_entry(&self, id: &SmolStr, kind: EntryKind) -> ResolveResult<Loaded> {
        let root = RootId::Main;
        if kind == EntryKind::Template {
            let path = self.tree.path(id);
            let token = self.scan_template(&path)?;
            return Ok(Loaded::Entry {
                entry: Entry {
                    id: id.clone(),
                    kind,
                    root,
                    json_path: None,
                    config: ComponentConfig::default(),
                    template_path: Some(path),
                    script_path: None,
                    token: Some(token),
                    vendor_components: Vec::new(),
                },
                imports: Vec::new(),
            });
        }

        let script_path = self.tree.entry_script(id);
        let template_path = Some(self.tree.path(&format!(
            "{}.{}",
            id,
            self.options.platform.template_ext()
        )))
        .filter(|p| p.is_file() && kind != EntryKind::Worker);

        if template_path.is_none() && script_path.is_none() {
            let expected = if kind == EntryKind::Worker {
                self.tree.path(&format!("{}.ts", id))
            } else {
                self.tree
                    .path(&format!("{}.{}", id, self.options.platform.template_ext()))
            };
            return Err(ResolveError::missing(id, expected, "template or script"));
        }

        let (json_path, config) = if kind == EntryKind::Worker {
            (None, ComponentConfig::default())
        } else {
            let json_path = self.tree.path(&format!("{}.json", id));
            match read_optional_config::<ComponentConfig>(&json_path)? {
                Some(config) => (Some(json_path), config),
                None => {
                    tracing::warn!(entry = %id, path = %json_path.display(), "missing config, using an empty one");
                    (None, ComponentConfig::default())
                }
            }
        };

        let token = template_path
            .as_deref()
            .map(|path| self.scan_template(path))
            .transpose()?;
        let imports = match &script_path {
            Some(path) => self.script_imports(path)?,
            None => Vec::new(),
        };

        tracing::debug!(entry = %id, kind = %kind, "loaded entry");
        Ok(Loaded::Entry {
            entry: Entry {
                id: id.clone(),
                kind,
                root,
                json_path,
                config,
                template_path,
                script_path,
                token,
                vendor_components: Vec::new(),
            },
            imports,
        })
    }

    fn scan_template(&self, path: &Path) -> ResolveResult<Arc<TokenRecord>> {
        self.loader
            .scan_template(path, &self.scan_options)
            .map_err(|source| ResolveError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    fn script_imports(&self, path: &Path) -> ResolveResult<Vec<ImportRef>> {
        let source = self
            .loader
            .read_script(path)
            .map_err(|source| ResolveError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(extract_imports(&source))
    }
}

/// A unit of work for one wave.
#[derive(Debug, Clone)]
enum Job {
    Entry { id: SmolStr, kind: EntryKind },
    Module { id: SmolStr, path: PathBuf },
}

impl Job {
    fn entry(id: impl Into<SmolStr>, kind: EntryKind) -> Self {
        Self::Entry {
            id: id.into(),
            kind,
        }
    }
}

/// The result of loading one job.
enum Loaded {
    Entry { entry: Entry, imports: Vec<ImportRef> },
    Module { id: SmolStr, imports: Vec<ImportRef> },
}

/// Maps ids to the root that owns them by location.
struct Roots {
    subpackages: Vec<SmolStr>,
    workers: Option<SmolStr>,
}

impl Roots {
    fn new(app: &AppConfig) -> Self {
        let mut subpackages: Vec<SmolStr> = app
            .sub_packages
            .iter()
            .map(|s| SmolStr::from(s.normalized_root()))
            .filter(|r| !r.is_empty())
            .collect();
        // Longest first, so nested roots win.
        subpackages.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self {
            subpackages,
            workers: app.workers_dir().map(SmolStr::from),
        }
    }

    fn root_for(&self, id: &str) -> RootId {
        let under = |dir: &str| id == dir || id.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'));
        if self.workers.as_deref().is_some_and(under) {
            return RootId::Workers;
        }
        self.subpackages
            .iter()
            .find(|root| under(root.as_str()))
            .map(|root| RootId::Subpackage(root.clone()))
            .unwrap_or(RootId::Main)
    }
}

/// How a `usingComponents` value resolved.
enum ComponentRef {
    Source(SmolStr),
    Vendor(SmolStr),
    Plugin,
    Unresolved,
}

/// Single-writer state merged after every wave.
struct State<'t> {
    tree: &'t SourceTree,
    platform: Platform,
    roots: Roots,
    graph: ModuleGraph,
    entries: IndexMap<SmolStr, Entry>,
    visited_entries: FxHashSet<SmolStr>,
    visited_modules: FxHashSet<SmolStr>,
}

impl State<'_> {
    /// Mark a job as taken. False when it was already resolved or queued.
    fn claim(&mut self, job: &Job) -> bool {
        match job {
            Job::Entry { id, .. } => self.visited_entries.insert(id.clone()),
            Job::Module { id, .. } => self.visited_modules.insert(id.clone()),
        }
    }

    fn absorb(&mut self, loaded: Loaded, pending: &mut Vec<Job>) {
        match loaded {
            Loaded::Entry { entry, imports } => self.absorb_entry(entry, imports, pending),
            Loaded::Module { id, imports } => {
                if let Some(idx) = self.graph.get(&id) {
                    self.link_imports(idx, dirname(&id), &imports, pending);
                }
            }
        }
    }

    fn absorb_entry(&mut self, mut entry: Entry, imports: Vec<ImportRef>, pending: &mut Vec<Job>) {
        entry.root = self.roots.root_for(&entry.id);
        let idx = self.graph.upsert_entry(
            ModuleNode {
                id: entry.id.clone(),
                kind: ModuleKind::Entry(entry.kind),
                path: entry.script_path.clone(),
            },
            entry.root.clone(),
        );
        self.visited_modules.insert(entry.id.clone());

        let dir = entry.dir().to_string();
        let refs: Vec<String> = entry.config.component_refs().map(str::to_string).collect();
        for value in &refs {
            self.queue_component(&mut entry, value, pending);
        }

        if let Some(token) = entry.token.clone() {
            let template_path = entry.template_path.clone().unwrap_or_default();
            self.link_template(idx, &dir, &token, &template_path, pending);
        }

        let script_dir = dirname(&entry.id).to_string();
        self.link_imports(idx, &script_dir, &imports, pending);

        tracing::debug!(entry = %entry.id, kind = %entry.kind, root = %entry.root, "discovered entry");
        self.entries.insert(entry.id.clone(), entry);
    }

    fn queue_component(&mut self, entry: &mut Entry, value: &str, pending: &mut Vec<Job>) {
        match self.resolve_component(entry.dir(), value) {
            ComponentRef::Source(id) => pending.push(Job::entry(id, EntryKind::Component)),
            ComponentRef::Vendor(name) => {
                if !entry.vendor_components.contains(&name) {
                    entry.vendor_components.push(name);
                }
            }
            ComponentRef::Plugin => {}
            ComponentRef::Unresolved => {
                tracing::warn!(entry = %entry.id, component = value, "unresolvable component path");
            }
        }
    }

    fn resolve_component(&self, dir: &str, value: &str) -> ComponentRef {
        let template_ext = self.platform.template_ext();
        match Specifier::classify(value) {
            Specifier::Plugin => ComponentRef::Plugin,
            Specifier::Relative(rel) => join_id(dir, rel)
                .map(|id| ComponentRef::Source(SmolStr::from(id)))
                .unwrap_or(ComponentRef::Unresolved),
            Specifier::Absolute(abs) => join_id("", abs)
                .map(|id| ComponentRef::Source(SmolStr::from(id)))
                .unwrap_or(ComponentRef::Unresolved),
            Specifier::Bare(bare) => {
                let bare = trim_id(bare);
                if self.tree.entry_exists(bare, template_ext) {
                    return ComponentRef::Source(SmolStr::from(bare));
                }
                match join_id(dir, bare) {
                    Some(id) if self.tree.entry_exists(&id, template_ext) => {
                        ComponentRef::Source(SmolStr::from(id))
                    }
                    _ => ComponentRef::Vendor(SmolStr::from(bare)),
                }
            }
        }
    }

    fn link_template(
        &mut self,
        idx: ModuleIdx,
        dir: &str,
        token: &TokenRecord,
        template_path: &Path,
        pending: &mut Vec<Job>,
    ) {
        let mut lines: Option<LineIndex> = None;
        let mut warn_unresolved = |dependency: &Dependency, what: &str| {
            let index = lines.get_or_insert_with(|| LineIndex::new(token.source()));
            let at = index.line_col(dependency.span.start);
            tracing::warn!(
                template = %template_path.display(),
                at = %at,
                src = %dependency.source_path,
                "unresolved {}",
                what
            );
        };

        for dependency in token.template_dependencies() {
            match self.resolve_template(dir, &dependency.source_path) {
                Some(id) => pending.push(Job::entry(id, EntryKind::Template)),
                None => warn_unresolved(dependency, "template"),
            }
        }

        for dependency in token.script_module_dependencies() {
            match self.resolve_script_module(dir, dependency) {
                Some((id, path)) => {
                    let target = self.ensure_module(ModuleNode {
                        id,
                        kind: ModuleKind::Wxs,
                        path: Some(path),
                    });
                    self.graph.add_import(idx, target, false);
                }
                None => warn_unresolved(dependency, "script module"),
            }
        }
    }

    fn resolve_template(&self, dir: &str, src: &str) -> Option<SmolStr> {
        let candidate = match Specifier::classify(src) {
            Specifier::Bare(rel) => join_id(dir, rel),
            Specifier::Plugin => None,
            _ => candidate_id(dir, src),
        }?;
        let file_name = candidate.rsplit('/').next().unwrap_or_default();
        let id = if file_name.contains('.') {
            candidate
        } else {
            format!("{}.{}", candidate, self.platform.template_ext())
        };
        self.tree.is_file(&id).then(|| SmolStr::from(id))
    }

    fn resolve_script_module(&self, dir: &str, dependency: &Dependency) -> Option<(SmolStr, PathBuf)> {
        let join = |path: &str| match Specifier::classify(path) {
            Specifier::Bare(rel) => join_id(dir, rel),
            Specifier::Plugin => None,
            _ => candidate_id(dir, path),
        };
        let normalized = join(&dependency.normalized_path)?;
        let raw = join(&dependency.source_path)?;
        let candidates = [
            normalized.clone(),
            raw,
            format!("{}.ts", normalized),
            format!("{}.js", normalized),
        ];
        candidates
            .iter()
            .find(|c| self.tree.is_file(c))
            .map(|file| (SmolStr::from(normalized.as_str()), self.tree.path(file)))
    }

    fn link_imports(&mut self, from: ModuleIdx, dir: &str, imports: &[ImportRef], pending: &mut Vec<Job>) {
        for import in imports {
            let specifier = import.specifier.as_str();
            let target = match Specifier::classify(specifier) {
                Specifier::Bare(bare) => self.ensure_module(ModuleNode {
                    id: vendor_id(bare),
                    kind: ModuleKind::Vendor,
                    path: None,
                }),
                Specifier::Plugin => continue,
                Specifier::Relative(_) | Specifier::Absolute(_) => {
                    let resolved = candidate_id(dir, specifier)
                        .and_then(|candidate| self.tree.resolve_script(&candidate));
                    let Some((id, path)) = resolved else {
                        tracing::warn!(
                            importer = %self.graph.node(from).id,
                            specifier,
                            "unresolvable import"
                        );
                        continue;
                    };
                    if !self.visited_modules.contains(&id) {
                        pending.push(Job::Module {
                            id: id.clone(),
                            path: path.clone(),
                        });
                    }
                    self.ensure_module(ModuleNode {
                        id,
                        kind: ModuleKind::Script,
                        path: Some(path),
                    })
                }
            };
            self.graph.add_import(from, target, import.is_dynamic());
        }
    }

    /// Insert `node` unless a node with its id exists. Entries are never
    /// downgraded to plain modules.
    fn ensure_module(&mut self, node: ModuleNode) -> ModuleIdx {
        match self.graph.get(&node.id) {
            Some(idx) => idx,
            None => self.graph.upsert(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolve(dir: &TempDir) -> ResolveResult<ProjectGraph> {
        EntryResolver::new(dir.path(), ResolveOptions::new(Platform::Weapp)).resolve()
    }

    fn sample_app() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "app.json",
            r#"{
                // main package
                "pages": ["pages/index/index"],
                "usingComponents": { "nav-bar": "/components/nav/index" },
                "subPackages": [
                    { "root": "pkgA", "pages": ["cat/index"] },
                    { "root": "pkgB/", "pages": ["dog/index"], },
                ],
            }"#,
        );
        write(&dir, "app.ts", "import './shared/setup'\n");
        write(&dir, "shared/setup.ts", "export const x = 1\n");
        write(&dir, "shared/common.ts", "export const common = 1\n");
        write(
            &dir,
            "pages/index/index.json",
            r#"{ "usingComponents": { "card": "../../components/card/index" } }"#,
        );
        write(
            &dir,
            "pages/index/index.wxml",
            "<import src=\"/templates/item.wxml\"/>\n<wxs src=\"./fmt.wxs.ts\" module=\"fmt\"/>\n<card/>",
        );
        write(&dir, "pages/index/fmt.wxs.ts", "module.exports = {}");
        write(
            &dir,
            "pages/index/index.ts",
            "import { common } from '../../shared/common'\nimport dayjs from 'dayjs'\nconst lazy = import('../../shared/lazy')\n",
        );
        write(&dir, "shared/lazy.ts", "export default 1");
        write(&dir, "templates/item.wxml", "<template name=\"item\"><include src=\"part\"/></template>");
        write(&dir, "templates/part.wxml", "<text>part</text>");
        write(&dir, "components/card/index.json", r#"{ "component": true }"#);
        write(&dir, "components/card/index.wxml", "<view/>");
        write(&dir, "components/card/index.ts", "Component({})");
        write(&dir, "components/nav/index.wxml", "<view/>");
        write(&dir, "pkgA/cat/index.json", "{}");
        write(&dir, "pkgA/cat/index.wxml", "<view/>");
        write(&dir, "pkgA/cat/index.ts", "import { common } from '/shared/common'");
        write(&dir, "pkgB/dog/index.wxml", "<view/>");
        write(&dir, "pkgB/dog/index.ts", "import { common } from '../../shared/common.ts'");
        dir
    }

    #[test]
    fn test_resolves_entries_to_fixpoint() {
        let dir = sample_app();
        let project = resolve(&dir).unwrap();
        let mut ids: Vec<&str> = project.entries.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids.remove(0), "app");
        ids.sort();
        assert_eq!(
            ids,
            vec![
                "components/card/index",
                "components/nav/index",
                "pages/index/index",
                "pkgA/cat/index",
                "pkgB/dog/index",
                "templates/item.wxml",
                "templates/part.wxml",
            ]
        );
        assert_eq!(
            project.entry("pkgA/cat/index").unwrap().root,
            RootId::Subpackage("pkgA".into())
        );
        assert_eq!(project.entry("components/card/index").unwrap().kind, EntryKind::Component);
        assert_eq!(project.entry("templates/part.wxml").unwrap().kind, EntryKind::Template);
    }

    #[test]
    fn test_shared_module_reachability() {
        let dir = sample_app();
        let project = resolve(&dir).unwrap();
        let graph = &project.graph;
        let common = graph.get("shared/common").unwrap();
        let expected: BTreeSet<RootId> = [
            RootId::Main,
            RootId::Subpackage("pkgA".into()),
            RootId::Subpackage("pkgB".into()),
        ]
        .into();
        assert_eq!(graph.reachable_from(common), &expected);
        assert_eq!(graph.consumers(common).len(), 3);

        let lazy = graph.get("shared/lazy").unwrap();
        assert!(graph.is_dynamic_import_target(lazy));

        let vendor = graph.get("npm:dayjs").unwrap();
        assert!(graph.is_vendor(vendor));

        let wxs = graph.get("pages/index/fmt.wxs").unwrap();
        assert_eq!(graph.node(wxs).kind, ModuleKind::Wxs);
        assert_eq!(
            graph.node(wxs).path.as_deref(),
            Some(dir.path().join("pages/index/fmt.wxs.ts").as_path())
        );

        let setup = graph.get("shared/setup").unwrap();
        assert_eq!(graph.reachable_from(setup), &[RootId::Main].into());
    }

    #[test]
    fn test_missing_page_config_is_tolerated() {
        let dir = sample_app();
        let project = resolve(&dir).unwrap();
        let dog = project.entry("pkgB/dog/index").unwrap();
        assert!(dog.json_path.is_none());
        assert!(dog.config.using_components.is_empty());
    }

    #[test]
    fn test_missing_app_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.ts", "");
        match resolve(&dir) {
            Err(ResolveError::MissingEntry { entry, what, .. }) => {
                assert_eq!(entry, "app");
                assert_eq!(what, "config");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_app_script_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.json", r#"{"pages": []}"#);
        assert!(matches!(
            resolve(&dir),
            Err(ResolveError::MissingEntry { what: "script", .. })
        ));
    }

    #[test]
    fn test_missing_page_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.json", r#"{"pages": ["pages/gone/index"]}"#);
        write(&dir, "app.js", "App({})");
        match resolve(&dir) {
            Err(ResolveError::MissingEntry { entry, .. }) => assert_eq!(entry, "pages/gone/index"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_config_parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.json", r#"{"pages": [}"#);
        write(&dir, "app.ts", "");
        match resolve(&dir) {
            Err(ResolveError::Config(err)) => assert_eq!(err.path(), dir.path().join("app.json")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_component_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.json", r#"{"pages": ["pages/a/index"]}"#);
        write(&dir, "app.ts", "");
        write(&dir, "pages/a/index.json", r#"{"usingComponents": {"x": "/comp/x/index"}}"#);
        write(&dir, "pages/a/index.wxml", "<x/>");
        write(&dir, "comp/x/index.json", r#"{"usingComponents": {"y": "../y/index"}}"#);
        write(&dir, "comp/x/index.wxml", "<y/>");
        write(&dir, "comp/y/index.json", r#"{"usingComponents": {"x": "../x/index"}}"#);
        write(&dir, "comp/y/index.wxml", "<x/>");
        let project = resolve(&dir).unwrap();
        assert_eq!(project.entries.len(), 4);
        assert_eq!(project.entries_of(EntryKind::Component).count(), 2);
    }

    #[test]
    fn test_tab_bar_app_bar_plugin_and_vendor_components() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "app.json",
            r#"{
                "pages": ["pages/a/index"],
                "tabBar": {"custom": true},
                "appBar": {},
                "usingComponents": {"van-button": "@vant/weapp/button", "p": "plugin://pay/btn"}
            }"#,
        );
        write(&dir, "app.ts", "");
        write(&dir, "pages/a/index.wxml", "<view/>");
        write(&dir, "custom-tab-bar/index.wxml", "<view/>");
        write(&dir, "app-bar/index.ts", "Component({})");
        let project = resolve(&dir).unwrap();
        assert_eq!(
            project.entry("custom-tab-bar/index").map(|e| e.kind),
            Some(EntryKind::Component)
        );
        assert!(project.entry("app-bar/index").is_some());
        assert_eq!(
            project.app().unwrap().vendor_components,
            vec![SmolStr::from("@vant/weapp/button")]
        );
    }

    #[test]
    fn test_workers_partition() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "app.json", r#"{"pages": [], "workers": "workers"}"#);
        write(&dir, "app.ts", "");
        write(&dir, "workers/index.ts", "import { util } from './util'");
        write(&dir, "workers/util.ts", "export const util = 1");
        write(&dir, "workers/types.d.ts", "");
        let project = resolve(&dir).unwrap();
        let worker = project.entry("workers/index").unwrap();
        assert_eq!(worker.kind, EntryKind::Worker);
        assert_eq!(worker.root, RootId::Workers);
        let util = project.graph.get("workers/util").unwrap();
        assert!(project.graph.reachable_from(util).contains(&RootId::Workers));
        assert!(project.entry("workers/types.d").is_none());
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = sample_app();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = EntryResolver::new(dir.path(), ResolveOptions::new(Platform::Weapp))
            .with_cancel(cancel)
            .resolve();
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }

    #[test]
    fn test_custom_loader_is_used() {
        struct Counting(std::sync::atomic::AtomicUsize);
        impl SourceLoader for Counting {
            fn scan_template(&self, path: &Path, options: &ScanOptions) -> io::Result<Arc<TokenRecord>> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                FsLoader.scan_template(path, options)
            }
            fn read_script(&self, path: &Path) -> io::Result<Arc<str>> {
                FsLoader.read_script(path)
            }
        }
        let dir = sample_app();
        let loader = Arc::new(Counting(Default::default()));
        EntryResolver::new(dir.path(), ResolveOptions::new(Platform::Weapp))
            .with_loader(loader.clone())
            .resolve()
            .unwrap();
        // index, item, part, card, nav, cat, dog
        assert_eq!(loader.0.load(std::sync::atomic::Ordering::SeqCst), 7);
    }
}
