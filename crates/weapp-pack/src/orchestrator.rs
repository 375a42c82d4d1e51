//! Orchestrator for running a build.

use crate::cache::ScanCache;
use crate::config::BuildConfig;
use crate::emit::{write_atomically, Emitter};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::sync::Arc;
use std::time::Instant;
use weapp_chunks::{plan, ChunkLayout, Disposition};
use weapp_graph::{CancelToken, EntryKind, EntryResolver, ResolveOptions};

/// Result of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Target platform.
    pub platform: String,
    /// Resolved entries, templates included.
    pub entry_count: usize,
    /// Pages among them.
    pub page_count: usize,
    /// Placed non-entry modules.
    pub module_count: usize,
    /// Shared chunk files.
    pub shared_chunks: Vec<String>,
    /// Output files, output-relative and sorted.
    pub files: Vec<String>,
    /// Where output went, or would go on a dry run.
    pub out_dir: String,
    /// Nothing was written.
    pub dry_run: bool,
    /// Time taken.
    pub duration_ms: u64,
}

/// Runs builds for one project. The scan cache lives as long as the
/// orchestrator, so repeated builds only rescan changed templates.
pub struct Orchestrator {
    config: BuildConfig,
    cache: Arc<ScanCache>,
    cancel: CancelToken,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            cache: Arc::new(ScanCache::new()),
            cancel: CancelToken::new(),
        }
    }

    /// Use `cancel` to stop builds early.
    #[cfg(test)]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The scan cache.
    #[cfg(test)]
    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    /// Resolve, plan, render and, unless this is a dry run, write.
    pub fn build(&self) -> Result<BuildReport> {
        let start = Instant::now();
        let config = &self.config;

        tracing::info!(
            project = %config.project_dir.display(),
            src = %config.src_root.display(),
            platform = %config.platform,
            "resolving entries"
        );
        let project = EntryResolver::new(&config.src_root, ResolveOptions::new(config.platform))
            .with_loader(self.cache.clone())
            .with_cancel(self.cancel.clone())
            .resolve()
            .into_diagnostic()
            .wrap_err("build failed")?;

        let placements = plan(&project.graph, &config.policy);
        let layout = ChunkLayout::assemble(&project.graph, &placements);
        tracing::debug!(
            modules = placements.len(),
            files = layout.len(),
            "planned chunks"
        );

        let outputs = Emitter {
            project: &project,
            layout: &layout,
            placements: &placements,
            loader: self.cache.as_ref(),
            handle: config.handle,
            cancel: &self.cancel,
        }
        .render()?;

        tracing::debug!(stats = ?self.cache.stats(), "scan cache");

        if config.dry_run {
            tracing::info!("dry run, nothing written");
        } else {
            write_atomically(&config.out_dir, &outputs, &self.cancel)?;
        }

        Ok(BuildReport {
            platform: config.platform.to_string(),
            entry_count: project.entries.len(),
            page_count: project.entries_of(EntryKind::Page).count(),
            module_count: placements
                .iter()
                .filter(|p| p.disposition != Disposition::External)
                .count(),
            shared_chunks: layout.shared_files().map(|f| f.path.clone()).collect(),
            files: outputs.into_iter().map(|f| f.path).collect(),
            out_dir: config.out_dir.display().to_string(),
            dry_run: config.dry_run,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
