//! Build configuration: `weapp.config.json` merged with the command line.

use crate::cli::Args;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use weapp_chunks::SharingPolicy;
use weapp_config::ProjectConfig;
use wxml_parser::Platform;
use wxml_transform::HandleOptions;

/// Conventional source directory used when the project root has no app.
const FALLBACK_SRC_ROOT: &str = "miniprogram";

const DEFAULT_OUT_DIR: &str = "dist";

/// Everything a build needs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project directory.
    pub project_dir: PathBuf,
    /// Source root holding `app.json`.
    pub src_root: PathBuf,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Target platform.
    pub platform: Platform,
    /// Markup handling.
    pub handle: HandleOptions,
    /// Shared chunk policy.
    pub policy: SharingPolicy,
    /// Plan only.
    pub dry_run: bool,
}

impl BuildConfig {
    /// Load `weapp.config.json` from `project_dir` and apply `args` on top.
    pub fn load(project_dir: &Path, args: &Args) -> Result<Self> {
        let file = ProjectConfig::load(project_dir)
            .into_diagnostic()
            .wrap_err("failed to load project configuration")?;

        let src_root = match args.src.clone().or_else(|| file.src_root.as_ref().map(PathBuf::from)) {
            Some(src) => project_dir.join(src),
            None => default_src_root(project_dir),
        };
        let out_dir = project_dir.join(
            args.out_dir
                .clone()
                .or_else(|| file.out_dir.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        );

        let mut chunks = file.chunks.clone();
        if let Some(mode) = args.shared_mode {
            chunks.default_mode = Some(mode);
        }
        if let Some(strategy) = args.shared_strategy {
            chunks.strategy = Some(strategy);
        }
        if let Some(mode) = args.dynamic_imports {
            chunks.dynamic_imports = Some(mode);
        }
        let policy = SharingPolicy::from_config(&chunks)
            .into_diagnostic()
            .wrap_err("invalid chunks configuration")?;

        let handle = HandleOptions {
            remove_comment: !args.keep_comments && file.remove_comment.unwrap_or(true),
            transform_event: !args.no_transform_event && file.transform_event.unwrap_or(true),
        };

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            src_root,
            out_dir,
            platform: args.platform.or(file.platform).unwrap_or_default(),
            handle,
            policy,
            dry_run: args.dry_run,
        })
    }
}

fn default_src_root(project_dir: &Path) -> PathBuf {
    let fallback = project_dir.join(FALLBACK_SRC_ROOT);
    if !project_dir.join("app.json").is_file() && fallback.join("app.json").is_file() {
        fallback
    } else {
        project_dir.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use weapp_config::{DynamicImportMode, ShareMode, ShareStrategy};

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load(dir.path(), &Args::default()).unwrap();
        assert_eq!(config.src_root, dir.path());
        assert_eq!(config.out_dir, dir.path().join("dist"));
        assert_eq!(config.platform, Platform::Weapp);
        assert_eq!(config.handle, HandleOptions::default());
        assert_eq!(config.policy.default_mode, ShareMode::Common);
        assert_eq!(config.policy.strategy, ShareStrategy::Duplicate);
    }

    #[test]
    fn test_falls_back_to_miniprogram_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("miniprogram")).unwrap();
        fs::write(dir.path().join("miniprogram/app.json"), "{}").unwrap();
        let config = BuildConfig::load(dir.path(), &Args::default()).unwrap();
        assert_eq!(config.src_root, dir.path().join("miniprogram"));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("weapp.config.json"),
            r#"{
                // project settings
                "srcRoot": "src",
                "outDir": "build",
                "platform": "tt",
                "transformEvent": false,
                "chunks": { "defaultMode": "path", "strategy": "hoist", "overrides": [{ "test": "lib/**", "mode": "inline" }] },
            }"#,
        )
        .unwrap();
        let args = Args {
            platform: Some(Platform::Swan),
            shared_mode: Some(ShareMode::Inline),
            dynamic_imports: Some(DynamicImportMode::Inline),
            keep_comments: true,
            ..Args::default()
        };
        let config = BuildConfig::load(dir.path(), &args).unwrap();
        assert_eq!(config.src_root, dir.path().join("src"));
        assert_eq!(config.out_dir, dir.path().join("build"));
        assert_eq!(config.platform, Platform::Swan);
        assert_eq!(
            config.handle,
            HandleOptions {
                remove_comment: false,
                transform_event: false,
            }
        );
        assert_eq!(config.policy.default_mode, ShareMode::Inline);
        assert_eq!(config.policy.strategy, ShareStrategy::Hoist);
        assert_eq!(config.policy.dynamic_imports, DynamicImportMode::Inline);
        assert_eq!(config.policy.overrides.len(), 1);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("weapp.config.json"),
            r#"{ "chunks": { "overrides": [{ "test": "/(oops/", "mode": "path" }] } }"#,
        )
        .unwrap();
        let err = BuildConfig::load(dir.path(), &Args::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid chunks configuration");
        assert!(err.chain().any(|cause| cause.to_string().contains("/(oops/")));
    }

    #[test]
    fn test_config_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("weapp.config.json"), "{ \"platform\": }").unwrap();
        let err = BuildConfig::load(dir.path(), &Args::default()).unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("weapp.config.json:1:")));
    }
}
