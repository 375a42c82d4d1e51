//! Placement of every module into output files.
//!
//! Each non-entry module gets exactly one [`ChunkPlacement`]. Entries are
//! not placed: every entry with a script owns `<id>.js`.

use crate::policy::SharingPolicy;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use std::fmt;
use weapp_config::{DynamicImportMode, ShareMode, ShareStrategy};
use weapp_graph::{ModuleGraph, ModuleIdx, ModuleKind, ModuleNode, RootId};

/// The shared file at the root of a partition.
pub const COMMON_FILE: &str = "common.js";

/// Directory of the per-subpackage shared file.
pub const SUBPACKAGE_SHARED_DIR: &str = "weapp-shared";

/// Output directory of the workers partition.
pub const WORKERS_DIR: &str = "workers";

/// Output directory of vendor packages, written by the npm build.
pub const VENDOR_DIR: &str = "miniprogram_npm";

/// How a module ends up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// In the partition's root `common.js`.
    Common,
    /// Copied into `<root>/weapp-shared/common.js` of every subpackage
    /// reaching it.
    PerSubpackage,
    /// In its own file at its source-relative path.
    Path,
    /// Copied into every consumer.
    Inline,
    /// A dynamic-import target kept in its own chunk.
    DynamicChunk,
    /// A dynamic-import target merged into its only importer.
    MergedIntoImporter {
        /// The importer.
        importer: ModuleIdx,
    },
    /// Used by exactly one consumer and emitted with it.
    LocalTo {
        /// The consumer.
        consumer: ModuleIdx,
    },
    /// Provided by the npm build.
    External,
}

impl Disposition {
    /// Short name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::PerSubpackage => "per-subpackage",
            Self::Path => "path",
            Self::Inline => "inline",
            Self::DynamicChunk => "dynamic-chunk",
            Self::MergedIntoImporter { .. } => "merged",
            Self::LocalTo { .. } => "local",
            Self::External => "external",
        }
    }

    /// Whether the module lives in files of its own.
    pub fn owns_files(&self) -> bool {
        matches!(
            self,
            Self::Common | Self::PerSubpackage | Self::Path | Self::DynamicChunk
        )
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one module goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlacement {
    /// The module.
    pub module: ModuleIdx,
    /// Its id.
    pub module_id: SmolStr,
    /// The effective sharing mode.
    pub mode: ShareMode,
    /// The strategy in force.
    pub strategy: ShareStrategy,
    /// The decision.
    pub disposition: Disposition,
    /// Files the module is written to on its own. More than one only for
    /// [`Disposition::PerSubpackage`] or when both partitions reach it;
    /// empty for inline, merged and local modules.
    pub output_paths: Vec<String>,
    /// Files of the consumers that embed the module body. Empty unless the
    /// module is inline, merged or local.
    pub host_paths: Vec<String>,
}

/// The output file of an entry.
pub fn entry_file(id: &str) -> String {
    format!("{}.js", id)
}

/// The per-subpackage shared file of `root`.
pub fn subpackage_common_file(root: &str) -> String {
    format!("{}/{}/{}", root, SUBPACKAGE_SHARED_DIR, COMMON_FILE)
}

/// Move `rel` under the workers directory unless it already is.
pub fn workers_path(rel: &str) -> String {
    if rel.starts_with(WORKERS_DIR) && rel[WORKERS_DIR.len()..].starts_with('/') {
        rel.to_string()
    } else {
        format!("{}/{}", WORKERS_DIR, rel)
    }
}

/// Place every module of `graph` according to `policy`.
///
/// Deterministic: the result depends only on the graph and the policy, and
/// follows the graph's insertion order.
pub fn plan(graph: &ModuleGraph, policy: &SharingPolicy) -> Vec<ChunkPlacement> {
    let mut decisions: Vec<Decision> = graph
        .iter()
        .map(|(idx, node)| decide(graph, policy, idx, node))
        .collect();
    break_local_cycles(graph, policy, &mut decisions);

    let mut hosts = Hosts {
        graph,
        decisions: &decisions,
        memo: FxHashMap::default(),
    };

    let mut placements = Vec::new();
    for (idx, node) in graph.iter() {
        let (disposition, mode, output_paths, host_paths) = match &decisions[idx.index()] {
            Decision::Entry => continue,
            Decision::Owned {
                disposition,
                mode,
                paths,
            } => (*disposition, *mode, paths.clone(), Vec::new()),
            Decision::Follow {
                disposition,
                mode,
                consumer,
            } => (*disposition, *mode, Vec::new(), hosts.of(*consumer)),
            Decision::Inline { mode } => (Disposition::Inline, *mode, Vec::new(), hosts.of(idx)),
        };
        tracing::debug!(
            module = %node.id,
            disposition = %disposition,
            outputs = ?output_paths,
            "placed module"
        );
        placements.push(ChunkPlacement {
            module: idx,
            module_id: node.id.clone(),
            mode,
            strategy: policy.strategy,
            disposition,
            output_paths,
            host_paths,
        });
    }
    placements
}

enum Decision {
    Entry,
    Owned {
        disposition: Disposition,
        mode: ShareMode,
        paths: Vec<String>,
    },
    Follow {
        disposition: Disposition,
        mode: ShareMode,
        consumer: ModuleIdx,
    },
    Inline {
        mode: ShareMode,
    },
}

fn decide(graph: &ModuleGraph, policy: &SharingPolicy, idx: ModuleIdx, node: &ModuleNode) -> Decision {
    match node.kind {
        ModuleKind::Entry(_) => Decision::Entry,
        ModuleKind::Vendor => {
            let package = node.id.strip_prefix("npm:").unwrap_or(node.id.as_str());
            Decision::Owned {
                disposition: Disposition::External,
                mode: policy.default_mode,
                paths: vec![format!("{}/{}/index.js", VENDOR_DIR, package)],
            }
        }
        // Referenced by path from markup, so always kept at that path.
        ModuleKind::Wxs => Decision::Owned {
            disposition: Disposition::Path,
            mode: ShareMode::Path,
            paths: vec![node.id.to_string()],
        },
        ModuleKind::Script => {
            let id_with_extension = node.id_with_extension();
            let overridden = policy.override_mode(&node.id, id_with_extension.as_deref());
            let mode = overridden.unwrap_or(policy.default_mode);
            let consumers = graph.consumers(idx);
            let only_consumer = (consumers.len() == 1)
                .then(|| consumers.first().copied())
                .flatten();

            if graph.is_dynamic_import_target(idx) {
                return match (policy.dynamic_imports, only_consumer) {
                    (DynamicImportMode::Inline, Some(importer)) => Decision::Follow {
                        disposition: Disposition::MergedIntoImporter { importer },
                        mode,
                        consumer: importer,
                    },
                    (DynamicImportMode::Inline, None) | (DynamicImportMode::Preserve, _) => {
                        Decision::Owned {
                            disposition: Disposition::DynamicChunk,
                            mode,
                            paths: partitioned(graph, idx, &format!("{}.js", node.id)),
                        }
                    }
                };
            }

            match (overridden, only_consumer) {
                (None, Some(consumer)) => Decision::Follow {
                    disposition: Disposition::LocalTo { consumer },
                    mode,
                    consumer,
                },
                _ => by_mode(graph, policy, idx, node, mode),
            }
        }
    }
}

fn by_mode(
    graph: &ModuleGraph,
    policy: &SharingPolicy,
    idx: ModuleIdx,
    node: &ModuleNode,
    mode: ShareMode,
) -> Decision {
    let owned = |disposition, paths| Decision::Owned {
        disposition,
        mode,
        paths,
    };
    match (mode, policy.strategy) {
        (ShareMode::Inline, _) => Decision::Inline { mode },
        (ShareMode::Path, _) => owned(
            Disposition::Path,
            partitioned(graph, idx, &format!("{}.js", node.id)),
        ),
        (ShareMode::Common, ShareStrategy::Hoist) => {
            owned(Disposition::Common, partitioned(graph, idx, COMMON_FILE))
        }
        (ShareMode::Common, ShareStrategy::Duplicate) => {
            let reach = graph.reachable_from(idx);
            let subpackages: Vec<&str> = reach
                .iter()
                .filter_map(|root| match root {
                    RootId::Subpackage(name) => Some(name.as_str()),
                    RootId::Main | RootId::Workers => None,
                })
                .collect();
            if reach.contains(&RootId::Main) || subpackages.is_empty() {
                return owned(Disposition::Common, partitioned(graph, idx, COMMON_FILE));
            }
            let mut paths: Vec<String> = subpackages
                .into_iter()
                .map(subpackage_common_file)
                .collect();
            if reach.contains(&RootId::Workers) {
                paths.push(workers_path(COMMON_FILE));
            }
            owned(Disposition::PerSubpackage, paths)
        }
    }
}

/// `rel` for the app partition and its `workers/` twin for the workers
/// partition, for whichever partitions reach the module.
fn partitioned(graph: &ModuleGraph, idx: ModuleIdx, rel: &str) -> Vec<String> {
    let reach = graph.reachable_from(idx);
    let workers = reach.contains(&RootId::Workers);
    let app = reach.iter().any(|root| *root != RootId::Workers) || !workers;
    let mut paths = Vec::with_capacity(2);
    if app {
        paths.push(rel.to_string());
    }
    if workers {
        paths.push(workers_path(rel));
    }
    paths
}

/// Local chains that loop back on themselves have no host; their members
/// are placed by mode instead.
fn break_local_cycles(graph: &ModuleGraph, policy: &SharingPolicy, decisions: &mut [Decision]) {
    for start in graph.indices() {
        let mut chain = vec![start];
        let mut current = start;
        loop {
            let consumer = match &decisions[current.index()] {
                Decision::Follow { consumer, .. } => *consumer,
                _ => break,
            };
            if let Some(pos) = chain.iter().position(|&seen| seen == consumer) {
                for &member in &chain[pos..] {
                    let node = graph.node(member);
                    let mode = policy.effective_mode(&node.id, node.id_with_extension().as_deref());
                    tracing::debug!(module = %node.id, "local import cycle, placing by mode");
                    decisions[member.index()] = by_mode(graph, policy, member, node, mode);
                }
                break;
            }
            chain.push(consumer);
            current = consumer;
        }
    }
}

/// Resolves which files embed a module.
struct Hosts<'g> {
    graph: &'g ModuleGraph,
    decisions: &'g [Decision],
    memo: FxHashMap<ModuleIdx, Vec<String>>,
}

impl Hosts<'_> {
    /// The files holding `start`: walks consumers through inline and local
    /// modules until it meets entries or modules with files of their own.
    /// Each query keeps its own visited set, so import cycles cut the walk
    /// without losing hosts reached another way.
    fn of(&mut self, start: ModuleIdx) -> Vec<String> {
        if let Some(paths) = self.memo.get(&start) {
            return paths.clone();
        }
        let mut paths: Vec<String> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let found = match &self.decisions[idx.index()] {
                Decision::Entry => vec![entry_file(&self.graph.node(idx).id)],
                Decision::Owned { paths, .. } => paths.clone(),
                Decision::Follow { consumer, .. } => {
                    stack.push(*consumer);
                    continue;
                }
                Decision::Inline { .. } => {
                    stack.extend(self.graph.consumers(idx).iter().rev().copied());
                    continue;
                }
            };
            for path in found {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        self.memo.insert(start, paths.clone());
        paths
    }
}
