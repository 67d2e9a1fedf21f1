//! Asset mirroring into the output directory.
//!
//! Each entry of `build.assets` (a file or a directory, relative to the
//! root) is copied to the same relative location under the output
//! directory. Sync is best-effort: failures are logged, never returned.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Copy every configured asset into the output directory.
///
/// Returns the number of files copied.
pub fn sync_assets(config: &SiteConfig) -> usize {
    let root = config.get_root();
    let mut copied = 0;

    for asset in &config.build.assets {
        let source = root.join(asset);
        if !source.exists() {
            log!("assets"; "`{}` not found, skipped", asset.display());
            continue;
        }

        match copy_asset(&source, &config.build.output.join(asset)) {
            Ok(count) => copied += count,
            Err(err) => log!("error"; "{err:#}"),
        }
    }
    copied
}

/// Whether `path` (absolute) lies under one of the configured assets.
pub fn is_asset_path(path: &Path, config: &SiteConfig) -> bool {
    let root = config.get_root();
    config
        .build
        .assets
        .iter()
        .any(|asset| path.starts_with(root.join(asset)))
}

/// Copy a file, or a directory tree, to `dest`.
fn copy_asset(source: &Path, dest: &Path) -> Result<usize> {
    if source.is_file() {
        copy_file(source, dest)?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("Failed to read {}", source.display()))?;
        let rel = entry.path().strip_prefix(source)?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(source, dest).with_context(|| {
        format!("Failed to copy {} to {}", source.display(), dest.display())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.resolve_paths(dir.path());
        (dir, config)
    }

    #[test]
    fn test_sync_copies_files_and_directories() {
        let (dir, config) = setup();
        fs::write(dir.path().join("favicon.ico"), "ico").unwrap();
        fs::create_dir_all(dir.path().join("assets/css")).unwrap();
        fs::write(dir.path().join("assets/css/site.css"), "body{}").unwrap();
        fs::write(dir.path().join("assets/logo.png"), "png").unwrap();

        assert_eq!(sync_assets(&config), 3);

        let out = &config.build.output;
        assert_eq!(fs::read_to_string(out.join("favicon.ico")).unwrap(), "ico");
        assert_eq!(fs::read_to_string(out.join("assets/css/site.css")).unwrap(), "body{}");
        assert!(out.join("assets/logo.png").is_file());
    }

    #[test]
    fn test_sync_is_repeatable() {
        let (dir, config) = setup();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/a.txt"), "1").unwrap();

        sync_assets(&config);
        fs::write(dir.path().join("assets/a.txt"), "2").unwrap();
        sync_assets(&config);

        let copied = fs::read_to_string(config.build.output.join("assets/a.txt")).unwrap();
        assert_eq!(copied, "2");
    }

    #[test]
    fn test_sync_missing_assets_is_not_an_error() {
        let (_dir, config) = setup();
        assert_eq!(sync_assets(&config), 0);
        assert!(!config.build.output.join("assets").exists());
    }

    #[test]
    fn test_is_asset_path() {
        let (_dir, config) = setup();
        let root = config.get_root();
        assert!(is_asset_path(&root.join("assets/css/site.css"), &config));
        assert!(is_asset_path(&root.join("favicon.ico"), &config));
        assert!(!is_asset_path(&root.join("posts/a.page"), &config));
        assert!(!is_asset_path(&root.join("assets-old/x"), &config));
    }
}
