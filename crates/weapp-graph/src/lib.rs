//! Entry resolution and the module dependency graph.
//!
//! [`EntryResolver`] walks an app from `app.json` through pages,
//! subpackages, components, templates and workers, scanning every template
//! and extracting imports from every script. The result is a
//! [`ProjectGraph`]: the resolved [`Entry`] set plus a [`ModuleGraph`]
//! recording, for every module, which roots reach it and who imports it.

pub mod cancel;
pub mod entry;
pub mod error;
pub mod imports;
pub mod module_graph;
pub mod resolve;
pub mod resolver;

pub use cancel::CancelToken;
pub use entry::{Entry, EntryKind, Partition, RootId};
pub use error::{ResolveError, ResolveResult};
pub use imports::{extract_imports, ImportKind, ImportRef};
pub use module_graph::{ImportEdge, ModuleGraph, ModuleIdx, ModuleKind, ModuleNode};
pub use resolve::{SourceTree, Specifier};
pub use resolver::{EntryResolver, FsLoader, ProjectGraph, ResolveOptions, SourceLoader, APP_ID};
