//! Rendering build output and writing it all-or-nothing.

use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use weapp_chunks::{ChunkFile, ChunkLayout, ChunkPlacement};
use weapp_config::read_config;
use weapp_graph::{CancelToken, Entry, EntryKind, ProjectGraph, SourceLoader};
use wxml_parser::TokenRecord;
use wxml_transform::{handle, HandleOptions};

/// Name of the build manifest written next to the output.
pub const MANIFEST_FILE: &str = "weapp-manifest.json";

/// One file of build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Output-relative path.
    pub path: String,
    /// File contents.
    pub contents: String,
}

/// Renders every output file of a resolved and planned build.
pub struct Emitter<'a> {
    /// The resolved project.
    pub project: &'a ProjectGraph,
    /// Output files and references.
    pub layout: &'a ChunkLayout,
    /// Placement decisions, for the manifest.
    pub placements: &'a [ChunkPlacement],
    /// Where module bodies are read from.
    pub loader: &'a dyn SourceLoader,
    /// Markup handling.
    pub handle: HandleOptions,
    /// Checked between files.
    pub cancel: &'a CancelToken,
}

impl Emitter<'_> {
    /// Render all output, sorted by path.
    pub fn render(&self) -> Result<Vec<OutputFile>> {
        let mut files = self.templates()?;
        files.extend(self.configs()?);
        for chunk in self.layout.files() {
            self.cancel.check().into_diagnostic()?;
            files.push(self.chunk(chunk)?);
        }
        files.push(self.manifest()?);
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn templates(&self) -> Result<Vec<OutputFile>> {
        let scanned: Vec<(&Entry, &TokenRecord)> = self
            .project
            .entries
            .values()
            .filter_map(|entry| entry.token.as_deref().map(|token| (entry, token)))
            .collect();
        scanned
            .par_iter()
            .map(|&(entry, token)| -> Result<OutputFile> {
                self.cancel.check().into_diagnostic()?;
                Ok(OutputFile {
                    path: self.template_output(entry),
                    contents: handle(token, &self.handle).code,
                })
            })
            .collect()
    }

    fn template_output(&self, entry: &Entry) -> String {
        match entry.kind {
            EntryKind::Template => entry.id.to_string(),
            _ => format!("{}.{}", entry.id, self.project.platform.template_ext()),
        }
    }

    fn configs(&self) -> Result<Vec<OutputFile>> {
        let mut files = Vec::new();
        for entry in self.project.entries.values() {
            let Some(path) = &entry.json_path else {
                continue;
            };
            let value: serde_json::Value = read_config(path).into_diagnostic()?;
            files.push(OutputFile {
                path: format!("{}.json", entry.id),
                contents: pretty(&value)?,
            });
        }
        Ok(files)
    }

    fn chunk(&self, file: &ChunkFile) -> Result<OutputFile> {
        let graph = &self.project.graph;
        let mut contents = String::new();

        for path in self.layout.references(&file.path) {
            contents.push_str(&format!("require(\"{}\");\n", relative_path(&file.path, path)));
        }

        for &module in &file.modules {
            let node = graph.node(module);
            let Some(path) = &node.path else {
                continue;
            };
            let body = self
                .loader
                .read_script(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            contents.push_str(&format!("/* {} */\n", node.id));
            contents.push_str(&body);
            if !body.ends_with('\n') {
                contents.push('\n');
            }
        }

        Ok(OutputFile {
            path: file.path.clone(),
            contents,
        })
    }

    fn manifest(&self) -> Result<OutputFile> {
        let graph = &self.project.graph;
        let entries: Vec<_> = self
            .project
            .entries
            .values()
            .map(|entry| {
                json!({
                    "id": entry.id.as_str(),
                    "kind": entry.kind.as_str(),
                    "root": entry.root.to_string(),
                })
            })
            .collect();
        let chunks: Vec<_> = self
            .layout
            .files()
            .map(|file| {
                json!({
                    "path": file.path,
                    "partition": file.partition.as_str(),
                    "modules": file
                        .modules
                        .iter()
                        .map(|&m| graph.node(m).id.as_str())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        let placements: Vec<_> = self
            .placements
            .iter()
            .map(|placement| {
                json!({
                    "module": placement.module_id.as_str(),
                    "disposition": placement.disposition.as_str(),
                    "mode": placement.mode.as_str(),
                    "outputs": placement.output_paths,
                    "hosts": placement.host_paths,
                })
            })
            .collect();
        let manifest = json!({
            "platform": self.project.platform.as_str(),
            "entries": entries,
            "chunks": chunks,
            "placements": placements,
        });
        Ok(OutputFile {
            path: MANIFEST_FILE.to_string(),
            contents: pretty(&manifest)?,
        })
    }
}

fn pretty(value: &serde_json::Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).into_diagnostic()?;
    text.push('\n');
    Ok(text)
}

/// The path of `to` as seen from the directory of `from`, both
/// output-relative.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = from.split('/').collect();
    let from_dir = &from_dir[..from_dir.len().saturating_sub(1)];
    let target: Vec<&str> = to.split('/').collect();
    let common = from_dir
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;
    let rest = target[common..].join("/");
    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}

/// Write `files` into a staging directory beside `out_dir`, then swap it
/// in. On any failure, including cancellation, `out_dir` is untouched.
pub fn write_atomically(out_dir: &Path, files: &[OutputFile], cancel: &CancelToken) -> Result<()> {
    let parent = out_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    let staging = tempfile::Builder::new()
        .prefix(".weapp-pack-")
        .tempdir_in(parent)
        .into_diagnostic()
        .wrap_err("failed to create staging directory")?;

    for file in files {
        cancel.check().into_diagnostic()?;
        let dest = staging.path().join(&file.path);
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).into_diagnostic()?;
        }
        fs::write(&dest, &file.contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", dest.display()))?;
    }

    cancel.check().into_diagnostic()?;
    if out_dir.exists() {
        fs::remove_dir_all(out_dir)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to replace {}", out_dir.display()))?;
    }
    fs::rename(staging.path(), out_dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to move output into {}", out_dir.display()))?;
    tracing::debug!(out_dir = %out_dir.display(), files = files.len(), "output written");
    Ok(())
}
