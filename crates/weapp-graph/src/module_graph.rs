//! The module dependency graph.
//!
//! Nodes live in an arena addressed by [`ModuleIdx`]; everything else is
//! kept in side tables indexed the same way. Entries are nodes too, so a
//! page importing a shared module is an ordinary edge.

use crate::entry::{EntryKind, RootId};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Index of a node in a [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdx(u32);

impl ModuleIdx {
    /// The arena slot.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// An entry, which owns its own output files.
    Entry(EntryKind),
    /// A script module.
    Script,
    /// A template script module referenced from markup.
    Wxs,
    /// A package resolved by the npm build.
    Vendor,
}

/// One node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    /// Source-relative id, extension-less for scripts. Vendor ids are
    /// `npm:<package>`; template script modules keep their extension.
    pub id: SmolStr,
    /// What the node is.
    pub kind: ModuleKind,
    /// The source file, when there is one.
    pub path: Option<PathBuf>,
}

impl ModuleNode {
    /// Whether the node is an entry.
    pub fn is_entry(&self) -> bool {
        matches!(self.kind, ModuleKind::Entry(_))
    }

    /// The id followed by the source file's extension, e.g.
    /// `shared/a.ts`. `None` when the node has no file.
    pub fn id_with_extension(&self) -> Option<String> {
        let ext = self.path.as_deref()?.extension()?.to_str()?;
        Some(format!("{}.{}", self.id, ext))
    }
}

/// An outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportEdge {
    /// The imported node.
    pub target: ModuleIdx,
    /// Whether the import is a dynamic `import()`.
    pub dynamic: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ModuleFlags {
    dynamic_import_target: bool,
    vendor: bool,
}

/// Arena of modules plus side tables.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    by_id: FxHashMap<SmolStr, ModuleIdx>,
    roots: Vec<Option<RootId>>,
    reachable_from: Vec<BTreeSet<RootId>>,
    flags: Vec<ModuleFlags>,
    consumers: Vec<IndexSet<ModuleIdx>>,
    imports: Vec<Vec<ImportEdge>>,
}

impl ModuleGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, or replace the node with the same id in place. The
    /// index, edges and reachability of a replaced node are kept.
    pub fn upsert(&mut self, node: ModuleNode) -> ModuleIdx {
        if let Some(&idx) = self.by_id.get(&node.id) {
            let flags = &mut self.flags[idx.index()];
            flags.vendor = node.kind == ModuleKind::Vendor;
            self.nodes[idx.index()] = node;
            return idx;
        }
        let idx = ModuleIdx(self.nodes.len() as u32);
        self.by_id.insert(node.id.clone(), idx);
        self.flags.push(ModuleFlags {
            dynamic_import_target: false,
            vendor: node.kind == ModuleKind::Vendor,
        });
        self.nodes.push(node);
        self.roots.push(None);
        self.reachable_from.push(BTreeSet::new());
        self.consumers.push(IndexSet::new());
        self.imports.push(Vec::new());
        idx
    }

    /// Insert an entry node owned by `root`.
    pub fn upsert_entry(&mut self, node: ModuleNode, root: RootId) -> ModuleIdx {
        let idx = self.upsert(node);
        self.roots[idx.index()] = Some(root);
        idx
    }

    /// Look a node up by id.
    pub fn get(&self, id: &str) -> Option<ModuleIdx> {
        self.by_id.get(id).copied()
    }

    /// The node at `idx`.
    pub fn node(&self, idx: ModuleIdx) -> &ModuleNode {
        &self.nodes[idx.index()]
    }

    /// All node indices in insertion order.
    pub fn indices(&self) -> impl Iterator<Item = ModuleIdx> + '_ {
        (0..self.nodes.len() as u32).map(ModuleIdx)
    }

    /// All nodes with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleIdx, &ModuleNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (ModuleIdx(i as u32), node))
    }

    /// Record that `from` imports `to`. Duplicate edges are ignored, except
    /// that a dynamic import always marks its target.
    pub fn add_import(&mut self, from: ModuleIdx, to: ModuleIdx, dynamic: bool) {
        if dynamic {
            self.flags[to.index()].dynamic_import_target = true;
        }
        let edge = ImportEdge {
            target: to,
            dynamic,
        };
        let edges = &mut self.imports[from.index()];
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        self.consumers[to.index()].insert(from);
    }

    /// Replace the outgoing edges of `from`, as after a re-scan. Former
    /// targets lose `from` as a consumer; reachability is not retracted.
    pub fn replace_imports(&mut self, from: ModuleIdx, edges: &[ImportEdge]) {
        let old = std::mem::take(&mut self.imports[from.index()]);
        for edge in old {
            self.consumers[edge.target.index()].shift_remove(&from);
        }
        for edge in edges {
            self.add_import(from, edge.target, edge.dynamic);
        }
    }

    /// Outgoing edges of `idx` in discovery order.
    pub fn imports(&self, idx: ModuleIdx) -> &[ImportEdge] {
        &self.imports[idx.index()]
    }

    /// Direct importers of `idx` in discovery order.
    pub fn consumers(&self, idx: ModuleIdx) -> &IndexSet<ModuleIdx> {
        &self.consumers[idx.index()]
    }

    /// The root owning an entry node.
    pub fn entry_root(&self, idx: ModuleIdx) -> Option<&RootId> {
        self.roots[idx.index()].as_ref()
    }

    /// Roots the node is reachable from.
    pub fn reachable_from(&self, idx: ModuleIdx) -> &BTreeSet<RootId> {
        &self.reachable_from[idx.index()]
    }

    /// Whether some importer loads the node with `import()`.
    pub fn is_dynamic_import_target(&self, idx: ModuleIdx) -> bool {
        self.flags[idx.index()].dynamic_import_target
    }

    /// Whether the node is a vendor package.
    pub fn is_vendor(&self, idx: ModuleIdx) -> bool {
        self.flags[idx.index()].vendor
    }

    /// Add `root` to the reachability of `idx`. Returns whether the set
    /// grew. Sets only ever grow.
    pub fn mark_reachable(&mut self, idx: ModuleIdx, root: RootId) -> bool {
        self.reachable_from[idx.index()].insert(root)
    }

    /// Flood every entry's root through its imports. Idempotent.
    pub fn propagate_reachability(&mut self) {
        let seeds: Vec<(ModuleIdx, RootId)> = self
            .indices()
            .filter_map(|idx| self.entry_root(idx).cloned().map(|root| (idx, root)))
            .collect();
        for (entry, root) in seeds {
            let mut stack = vec![entry];
            while let Some(idx) = stack.pop() {
                if !self.mark_reachable(idx, root.clone()) {
                    continue;
                }
                stack.extend(self.imports[idx.index()].iter().map(|edge| edge.target));
            }
        }
    }
}
