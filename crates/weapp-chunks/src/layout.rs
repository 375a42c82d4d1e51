//! Output files assembled from placements.

use crate::planner::{entry_file, subpackage_common_file, ChunkPlacement, Disposition, WORKERS_DIR};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use weapp_graph::{ModuleGraph, ModuleIdx, ModuleKind, Partition, RootId};

/// One emitted script file and the module bodies it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    /// Output-relative path.
    pub path: String,
    /// The partition the file belongs to.
    pub partition: Partition,
    /// The entry owning the file, if it is an entry file.
    pub entry: Option<ModuleIdx>,
    /// Module bodies in write order: the entry first, then by id.
    pub modules: Vec<ModuleIdx>,
}

impl ChunkFile {
    /// Whether this is a shared chunk rather than an entry file.
    pub fn is_shared(&self) -> bool {
        self.entry.is_none()
    }
}

/// Every script file of a build and which shared files each module loads.
#[derive(Debug, Clone, Default)]
pub struct ChunkLayout {
    files: IndexMap<String, ChunkFile>,
    references: IndexMap<String, IndexSet<String>>,
}

impl ChunkLayout {
    /// Group module bodies into files.
    ///
    /// Vendor packages get no file but are still referenced by their
    /// importers.
    pub fn assemble(graph: &ModuleGraph, placements: &[ChunkPlacement]) -> Self {
        let mut layout = Self::default();

        for (idx, node) in graph.iter() {
            if !node.is_entry() || node.path.is_none() {
                continue;
            }
            let path = entry_file(&node.id);
            let partition = partition_of(&path);
            layout.files.insert(
                path.clone(),
                ChunkFile {
                    path,
                    partition,
                    entry: Some(idx),
                    modules: vec![idx],
                },
            );
        }

        for placement in placements {
            if placement.disposition == Disposition::External {
                continue;
            }
            for path in placement.output_paths.iter().chain(&placement.host_paths) {
                let file = layout
                    .files
                    .entry(path.clone())
                    .or_insert_with(|| ChunkFile {
                        path: path.clone(),
                        partition: partition_of(path),
                        entry: None,
                        modules: Vec::new(),
                    });
                if !file.modules.contains(&placement.module) {
                    file.modules.push(placement.module);
                }
            }
        }

        for file in layout.files.values_mut() {
            let entry = file.entry;
            file.modules
                .sort_by_key(|&m| (Some(m) != entry, graph.node(m).id.clone()));
        }
        layout.files.sort_keys();
        layout.references = file_references(graph, placements, &layout.files);
        layout
    }

    /// All files, sorted by path.
    pub fn files(&self) -> impl Iterator<Item = &ChunkFile> {
        self.files.values()
    }

    /// Shared chunks only.
    pub fn shared_files(&self) -> impl Iterator<Item = &ChunkFile> {
        self.files.values().filter(|file| file.is_shared())
    }

    /// The file at `path`.
    pub fn file(&self, path: &str) -> Option<&ChunkFile> {
        self.files.get(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether there are no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Shared files the file at `path` loads.
    pub fn references(&self, path: &str) -> impl Iterator<Item = &str> {
        self.references
            .get(path)
            .into_iter()
            .flat_map(|paths| paths.iter().map(String::as_str))
    }

    /// A stable text listing of files and their modules.
    pub fn render(&self, graph: &ModuleGraph) -> String {
        let mut out = String::new();
        for file in self.files.values() {
            let ids: Vec<&str> = file.modules.iter().map(|&m| graph.node(m).id.as_str()).collect();
            out.push_str(&format!("{}: {}\n", file.path, ids.join(", ")));
        }
        out
    }
}

fn partition_of(path: &str) -> Partition {
    match path.split_once('/') {
        Some((head, _)) if head == WORKERS_DIR => Partition::Workers,
        _ => Partition::App,
    }
}

/// Where a file is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRoot<'a> {
    Main,
    Subpackage(&'a str),
    Workers,
}

impl<'a> FileRoot<'a> {
    /// The root of `path`: the workers directory, else the subpackage with
    /// the longest matching root, else main.
    fn of(path: &str, subpackages: &[&'a str]) -> Self {
        if partition_of(path) == Partition::Workers {
            return Self::Workers;
        }
        subpackages
            .iter()
            .filter(|root| {
                path.strip_prefix(**root)
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|root| root.len())
            .map_or(Self::Main, |root| Self::Subpackage(*root))
    }
}

/// For every file, the shared files holding what its modules import.
/// Each file only loads copies living in its own root.
fn file_references(
    graph: &ModuleGraph,
    placements: &[ChunkPlacement],
    files: &IndexMap<String, ChunkFile>,
) -> IndexMap<String, IndexSet<String>> {
    let by_module: FxHashMap<ModuleIdx, &ChunkPlacement> =
        placements.iter().map(|p| (p.module, p)).collect();
    let mut subpackages: Vec<&str> = graph
        .indices()
        .filter_map(|idx| match graph.entry_root(idx) {
            Some(RootId::Subpackage(name)) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    subpackages.sort_unstable();
    subpackages.dedup();

    let mut references = IndexMap::new();
    for file in files.values() {
        let root = FileRoot::of(&file.path, &subpackages);
        let mut paths = IndexSet::new();
        for &module in &file.modules {
            for edge in graph.imports(module) {
                let Some(dep) = by_module.get(&edge.target) else {
                    continue;
                };
                // Template script modules are loaded by markup, not by scripts.
                if graph.node(dep.module).kind == ModuleKind::Wxs {
                    continue;
                }
                let reach = graph.reachable_from(module);
                for path in &dep.output_paths {
                    if *path != file.path && serves(dep.disposition, path, root, reach) {
                        paths.insert(path.clone());
                    }
                }
            }
        }
        if !paths.is_empty() {
            paths.sort();
            references.insert(file.path.clone(), paths);
        }
    }
    references
}

/// Whether a file under `root` whose module is reached from `reach` loads
/// the copy at `path`.
fn serves(disposition: Disposition, path: &str, root: FileRoot<'_>, reach: &BTreeSet<RootId>) -> bool {
    if disposition == Disposition::External {
        return true;
    }
    let in_workers = partition_of(path) == Partition::Workers;
    match root {
        FileRoot::Workers => in_workers,
        _ if in_workers => false,
        FileRoot::Subpackage(name) if disposition == Disposition::PerSubpackage => {
            path == subpackage_common_file(name)
        }
        // A root-level file used only by subpackages loads one copy: the one
        // of the first subpackage reaching it.
        FileRoot::Main if disposition == Disposition::PerSubpackage => reach
            .iter()
            .find_map(|r| match r {
                RootId::Subpackage(name) => Some(name.as_str()),
                RootId::Main | RootId::Workers => None,
            })
            .is_some_and(|name| path == subpackage_common_file(name)),
        FileRoot::Main | FileRoot::Subpackage(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use crate::planner::tests::{sub, Fixture};
    use crate::policy::SharingPolicy;
    use pretty_assertions::assert_eq;
    use weapp_config::{ShareMode, ShareStrategy};

    fn sample() -> ModuleGraph {
        let mut f = Fixture::new();
        f.page("pages/index/index", RootId::Main);
        let a = f.page("pkgA/cat/index", sub("pkgA"));
        let b = f.page("pkgB/dog/index", sub("pkgB"));
        let shared = f.module("shared/common");
        let util = f.module("shared/util");
        let local = f.module("pkgA/cat/helper");
        f.import(a, shared);
        f.import(b, shared);
        f.import(shared, util);
        f.import(b, util);
        f.import(a, local);
        f.finish()
    }

    #[test]
    fn test_hoist_layout() {
        let graph = sample();
        let policy = SharingPolicy::new(ShareMode::Common, ShareStrategy::Hoist);
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &policy));
        insta::assert_snapshot!(layout.render(&graph), @r"
        common.js: shared/common, shared/util
        pages/index/index.js: pages/index/index
        pkgA/cat/index.js: pkgA/cat/index, pkgA/cat/helper
        pkgB/dog/index.js: pkgB/dog/index
        ");
    }

    #[test]
    fn test_duplicate_layout_and_references() {
        let graph = sample();
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &SharingPolicy::default()));
        assert!(layout.file("common.js").is_none());
        let shared: Vec<&str> = layout.shared_files().map(|f| f.path.as_str()).collect();
        assert_eq!(
            shared,
            vec!["pkgA/weapp-shared/common.js", "pkgB/weapp-shared/common.js"]
        );
        assert_eq!(
            layout.references("pkgA/cat/index.js").collect::<Vec<_>>(),
            vec!["pkgA/weapp-shared/common.js"]
        );
        assert_eq!(
            layout.references("pkgB/dog/index.js").collect::<Vec<_>>(),
            vec!["pkgB/weapp-shared/common.js"]
        );
    }

    #[test]
    fn test_duplicated_copies_only_load_their_own_subpackage() {
        let graph = sample();
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &SharingPolicy::default()));
        for root in ["pkgA", "pkgB"] {
            let path = format!("{}/weapp-shared/common.js", root);
            let file = layout.file(&path).unwrap();
            let ids: Vec<&str> = file.modules.iter().map(|&m| graph.node(m).id.as_str()).collect();
            assert_eq!(ids, vec!["shared/common", "shared/util"]);
            // `shared/util` sits in the same copy, so nothing is loaded.
            assert_eq!(layout.references(&path).count(), 0);
        }
    }

    #[test]
    fn test_path_module_loads_copy_of_its_own_subpackage() {
        let mut f = Fixture::new();
        let a = f.page("pkgA/cat/index", sub("pkgA"));
        let a2 = f.page("pkgA/cow/index", sub("pkgA"));
        let b = f.page("pkgB/dog/index", sub("pkgB"));
        let b2 = f.page("pkgB/pig/index", sub("pkgB"));
        let shared = f.module("shared/common");
        let tool_a = f.module("pkgA/tool");
        let tool_b = f.module("pkgB/tool");
        for page in [a, a2, b, b2] {
            f.import(page, shared);
        }
        f.import(a, tool_a);
        f.import(a2, tool_a);
        f.import(b, tool_b);
        f.import(b2, tool_b);
        f.import(tool_a, shared);
        f.import(tool_b, shared);
        let graph = f.finish();
        let policy = SharingPolicy::default()
            .with_override("pkgA/tool", ShareMode::Path)
            .unwrap()
            .with_override("pkgB/tool", ShareMode::Path)
            .unwrap();
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &policy));
        assert_eq!(
            layout.references("pkgA/tool.js").collect::<Vec<_>>(),
            vec!["pkgA/weapp-shared/common.js"]
        );
        assert_eq!(
            layout.references("pkgB/tool.js").collect::<Vec<_>>(),
            vec!["pkgB/weapp-shared/common.js"]
        );
        assert_eq!(
            layout.references("pkgA/cat/index.js").collect::<Vec<_>>(),
            vec!["pkgA/tool.js", "pkgA/weapp-shared/common.js"]
        );
    }

    #[test]
    fn test_inline_layout_has_no_shared_files() {
        let graph = sample();
        let policy = SharingPolicy::new(ShareMode::Inline, ShareStrategy::Hoist);
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &policy));
        assert_eq!(layout.shared_files().count(), 0);
        assert_eq!(layout.references("pkgA/cat/index.js").count(), 0);
        let file = layout.file("pkgB/dog/index.js").unwrap();
        assert_eq!(file.modules.len(), 3);
    }

    #[test]
    fn test_workers_files_are_partitioned() {
        let mut f = Fixture::new();
        let w1 = f.page("workers/a", RootId::Workers);
        let w2 = f.page("workers/b", RootId::Workers);
        let shared = f.module("workers/shared");
        f.import(w1, shared);
        f.import(w2, shared);
        let graph = f.finish();
        let layout = ChunkLayout::assemble(&graph, &plan(&graph, &SharingPolicy::default()));
        let common = layout.file("workers/common.js").unwrap();
        assert_eq!(common.partition, Partition::Workers);
        assert_eq!(layout.references("workers/a.js").collect::<Vec<_>>(), vec!["workers/common.js"]);
        assert_eq!(layout.len(), 3);
    }
}
