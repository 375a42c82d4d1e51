//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;
use weapp_config::{DynamicImportMode, ShareMode, ShareStrategy};
use wxml_parser::Platform;

/// Mini-Program compiler: markup transforms, entry resolution and shared
/// chunk splitting
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "weapp-pack")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project directory holding weapp.config.json
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Source root, relative to the project directory
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Output directory, relative to the project directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Target platform (weapp, alipay, tt, swan, jd, qq, xhs)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Default placement of shared modules (common, path, inline)
    #[arg(long)]
    pub shared_mode: Option<ShareMode>,

    /// Placement of common modules outside the main package (duplicate, hoist)
    #[arg(long)]
    pub shared_strategy: Option<ShareStrategy>,

    /// Treatment of dynamic-import targets (preserve, inline)
    #[arg(long)]
    pub dynamic_imports: Option<DynamicImportMode>,

    /// Keep markup comments
    #[arg(long)]
    pub keep_comments: bool,

    /// Leave @event attributes untouched
    #[arg(long)]
    pub no_transform_event: bool,

    /// Plan the build without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Output format for the build report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
