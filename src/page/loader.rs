//! Page discovery and loading.
//!
//! Loading is total: every requested path yields a [`LoadedPage`], valid or
//! not. Failures are logged under `skip` and never propagate.

use super::{LoadedPage, PageError, PageResolver};
use crate::{config::SiteConfig, log};
use rayon::prelude::*;
use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

/// Walk the project root for page sources, skipping the output directory.
///
/// Hidden entries (`.git`, editor swap dirs) are not descended into.
/// Returned paths are relative to the root, in file-name order.
pub fn discover_source_files(config: &SiteConfig) -> Vec<PathBuf> {
    let root = config.get_root();

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
            !hidden && !config.build.is_in_output(entry.path())
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && config.build.is_source_file(entry.path()))
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

/// Load a single page.
///
/// `path` may be absolute or root-relative, and may name the output file
/// (`posts/a.html`) instead of the source (`posts/a.page`).
pub fn load_page(path: &Path, config: &SiteConfig, resolver: &dyn PageResolver) -> LoadedPage {
    let root = config.get_root();
    let rel = source_path(path, root, &config.build.source_ext, &config.build.output_ext);
    let abs = root.join(&rel);

    let result = if rel.has_root() || rel.starts_with("..") {
        Err(PageError::OutsideRoot(rel.clone()))
    } else if abs
        .parent()
        .is_some_and(|dir| config.build.is_in_output(dir))
    {
        Err(PageError::InsideOutput(rel.clone()))
    } else {
        resolver.resolve(&abs)
    };

    match result {
        Ok(source) => LoadedPage::valid(rel, source),
        Err(err) => {
            log!("skip"; "{err}");
            LoadedPage::invalid(rel, err)
        }
    }
}

/// Load an explicit list of pages in parallel, preserving input order.
pub fn load_pages(
    files: &[PathBuf],
    config: &SiteConfig,
    resolver: &dyn PageResolver,
) -> Vec<LoadedPage> {
    files
        .par_iter()
        .map(|path| load_page(path, config, resolver))
        .collect()
}

/// Discover and load every page under the root.
pub fn load_all_pages(config: &SiteConfig, resolver: &dyn PageResolver) -> Vec<LoadedPage> {
    load_pages(&discover_source_files(config), config, resolver)
}

/// Canonical root-relative source path for a requested page path.
///
/// `./posts/a.html` → `posts/a.page`, `about` → `about.page`
fn source_path(path: &Path, root: &Path, source_ext: &str, output_ext: &str) -> PathBuf {
    let rel = normalize(path.strip_prefix(root).unwrap_or(path));

    match rel.extension() {
        Some(ext) if ext == source_ext || ext == output_ext => rel.with_extension(source_ext),
        _ => {
            let mut name = OsString::from(rel);
            name.push(".");
            name.push(source_ext);
            PathBuf::from(name)
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
