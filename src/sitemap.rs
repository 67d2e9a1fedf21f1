//! Hierarchical sitemap used for cross-page navigation.
//!
//! # Format
//!
//! ```toml
//! # Generated by quire. Do not edit.
//! # Delete this file to regenerate it from scratch.
//!
//! [index]
//! title = "Home"
//! path = "index.page"
//!
//! [posts.my_post]
//! title = "My Post"
//! path = "posts/my-post.page"
//! ```
//!
//! Each build overlays the fresh sitemap onto the persisted one key by key
//! at the top level. Entries for deleted or renamed pages are not pruned;
//! delete the file to start clean.

use crate::{
    config::SiteConfig,
    log,
    page::{LoadedPage, PageData, PageResolver, load_all_pages, to_slash},
};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path},
    sync::LazyLock,
};

const HEADER: &str = "\
# Generated by quire. Do not edit.
# Delete this file to regenerate it from scratch.

";

/// Directory level of the sitemap, keyed by segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sitemap(pub BTreeMap<String, SitemapNode>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SitemapNode {
    Page(SitemapEntry),
    Dir(Sitemap),
}

/// A page's metadata plus its source path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    #[serde(flatten)]
    pub data: PageData,
    pub path: String,
}

impl Sitemap {
    /// Insert `entry` under `key` below the nested `dirs` levels,
    /// creating missing levels.
    fn insert(&mut self, dirs: &[&str], key: String, entry: SitemapEntry) {
        let Some((dir, rest)) = dirs.split_first() else {
            if matches!(self.0.get(&key), Some(SitemapNode::Dir(_))) {
                log!("sitemap"; "`{}` collides with directory `{key}`, keeping the directory", entry.path);
            } else {
                self.0.insert(key, SitemapNode::Page(entry));
            }
            return;
        };

        let node = self
            .0
            .entry((*dir).to_owned())
            .or_insert_with(|| SitemapNode::Dir(Self::default()));
        if let SitemapNode::Page(page) = node {
            log!("sitemap"; "`{}` collides with directory `{dir}`, keeping the directory", page.path);
            *node = SitemapNode::Dir(Self::default());
        }
        if let SitemapNode::Dir(child) = node {
            child.insert(rest, key, entry);
        }
    }
}

/// Normalize a file stem into a lookup key.
///
/// `my-post.v2` → `my_post_v2`
pub fn sitemap_key(stem: &str) -> String {
    static RE_KEY_SEPARATOR: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s.\-_]").unwrap());
    RE_KEY_SEPARATOR.replace_all(stem, "_").into_owned()
}

/// Build the sitemap from `pages`, overlaid onto the persisted one.
///
/// Invalid pages and non-source paths are skipped.
pub fn build_sitemap(pages: &[LoadedPage], config: &SiteConfig) -> Sitemap {
    let mut fresh = Sitemap::default();

    for page in pages
        .iter()
        .filter(|page| page.is_valid() && config.build.is_source_file(&page.path))
    {
        let Some(stem) = page.path.file_stem() else {
            continue;
        };
        let dirs: Vec<&str> = page
            .path
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => s.to_str(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entry = SitemapEntry {
            data: page.data().clone(),
            path: to_slash(&page.path),
        };
        fresh.insert(&dirs, sitemap_key(&stem.to_string_lossy()), entry);
    }

    let mut merged = load_previous(&config.build.sitemap);
    merged.0.extend(fresh.0);
    merged
}

/// Read the persisted sitemap. Missing or malformed files yield an empty one.
pub fn load_previous(path: &Path) -> Sitemap {
    let Ok(content) = fs::read_to_string(path) else {
        return Sitemap::default();
    };

    toml::from_str(&content).unwrap_or_else(|err| {
        log!("sitemap"; "ignoring malformed `{}`: {err}", path.display());
        Sitemap::default()
    })
}

/// Write the sitemap file with its generated-file header.
pub fn persist(sitemap: &Sitemap, config: &SiteConfig) -> Result<()> {
    let path = &config.build.sitemap;
    let body = toml::to_string_pretty(sitemap).context("Failed to serialize sitemap")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{HEADER}{body}"))
        .with_context(|| format!("Failed to write sitemap {}", path.display()))?;
    Ok(())
}

/// Load every page, then build and persist the sitemap.
pub fn regenerate(config: &SiteConfig, resolver: &dyn PageResolver) -> Result<Sitemap> {
    let pages = load_all_pages(config, resolver);
    let sitemap = build_sitemap(&pages, config);
    persist(&sitemap, config)?;

    let root = config.get_root();
    let rel = config.build.sitemap.strip_prefix(root).unwrap_or(&config.build.sitemap);
    log!("sitemap"; "-> {}", rel.display());
    Ok(sitemap)
}

#[cfg(test)]
impl Sitemap {
    pub fn get(&self, key: &str) -> Option<&SitemapNode> {
        self.0.get(key)
    }

    /// Look up a page by its `/`-separated key path, e.g. `posts/my_post`.
    pub fn page(&self, keys: &str) -> Option<&SitemapEntry> {
        let mut level = self;
        let mut segments = keys.split('/').peekable();
        while let Some(segment) = segments.next() {
            match (level.get(segment)?, segments.peek()) {
                (SitemapNode::Page(entry), None) => return Some(entry),
                (SitemapNode::Dir(dir), Some(_)) => level = dir,
                _ => return None,
            }
        }
        None
    }
}
