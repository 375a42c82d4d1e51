//! Shared-chunk splitting.
//!
//! Given a resolved [`ModuleGraph`](weapp_graph::ModuleGraph) and a
//! [`SharingPolicy`], [`plan`] decides where every non-entry module goes and
//! [`ChunkLayout::assemble`] turns those decisions into output files.
//!
//! ```text
//! policy + graph ──plan──▶ placements ──assemble──▶ layout
//! ```

pub mod error;
pub mod layout;
pub mod planner;
pub mod policy;

pub use error::PolicyError;
pub use layout::{ChunkFile, ChunkLayout};
pub use planner::{
    entry_file, plan, subpackage_common_file, workers_path, ChunkPlacement, Disposition,
    COMMON_FILE, SUBPACKAGE_SHARED_DIR, VENDOR_DIR, WORKERS_DIR,
};
pub use policy::{ModuleMatcher, Override, SharingPolicy};
pub use weapp_config::{DynamicImportMode, ShareMode, ShareStrategy};
