//! Site building orchestration.
//!
//! # Flow
//!
//! ```text
//! build_site()
//!     │
//!     ├── select ──► explicit files (parallel load) | every discovered page
//!     │
//!     ├── sitemap + assets (full builds, or `--generate-sitemap`)
//!     │
//!     ├── fallback ──► all selected pages invalid? load everything
//!     │
//!     └── render + write each valid page ──► <output>/<path>.html
//! ```
//!
//! A build is best-effort over independent pages: an invalid page, a failed
//! render or a failed write is logged and skipped.

use crate::{
    assets::sync_assets,
    config::SiteConfig,
    log,
    page::{LoadedPage, PageResolver, load_all_pages, load_pages},
    render::render_page,
    sitemap::{build_sitemap, persist},
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What to build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions<'a> {
    /// Pages to build; empty means a full build.
    pub files: &'a [PathBuf],
    /// Regenerate the sitemap and sync assets even for a partial build.
    pub generate_sitemap: bool,
    /// Inject the auto-reload script.
    pub dev_mode: bool,
}

impl BuildOptions<'_> {
    pub const fn is_full(&self) -> bool {
        self.files.is_empty()
    }
}

/// Build the site.
///
/// Only a failure to create the output directory is an error; everything
/// page-level is logged and skipped.
pub fn build_site(
    config: &SiteConfig,
    resolver: &dyn PageResolver,
    options: &BuildOptions<'_>,
) -> Result<()> {
    let output = &config.build.output;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let mut pages = if options.is_full() {
        load_all_pages(config, resolver)
    } else {
        load_pages(options.files, config, resolver)
    };

    if options.is_full() || options.generate_sitemap {
        let all_pages;
        let everything = if options.is_full() {
            &pages
        } else {
            all_pages = load_all_pages(config, resolver);
            &all_pages
        };
        update_sitemap(everything, config);
        sync_assets(config);
    }

    if !options.is_full() && pages.iter().all(|page| !page.is_valid()) {
        log!("build"; "no valid page among {} requested, building all pages", pages.len());
        pages = load_all_pages(config, resolver);
    }

    for page in pages.iter().filter(|page| page.is_valid()) {
        match write_page(page, options.dev_mode, config) {
            Ok(path) => log!("build"; "-> {}", rel_path(&path, config.get_root())),
            Err(err) => log!("error"; "{}: {err:#}", page.path.display()),
        }
    }

    Ok(())
}

fn update_sitemap(pages: &[LoadedPage], config: &SiteConfig) {
    let sitemap = build_sitemap(pages, config);
    if let Err(err) = persist(&sitemap, config) {
        log!("error"; "{err:#}");
    }
}

/// Render `page` and write it to its output location.
fn write_page(page: &LoadedPage, dev_mode: bool, config: &SiteConfig) -> Result<PathBuf> {
    let html = render_page(page, dev_mode, config)?;
    let path = config.build.output_path(&page.path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
