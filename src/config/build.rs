//! `[build]` section configuration.
//!
//! Contains the output layout: where pages are written, where the sitemap
//! lives, which assets are mirrored, and the source/output extensions.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[build]` section in quire.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// output = "_build"              # Output directory
/// sitemap = "sitemap_gen.toml"   # Generated sitemap file
/// assets = ["favicon.ico", "assets"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root", skip_serializing_if = "Option::is_none")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Generated sitemap file.
    #[serde(default = "defaults::build::sitemap")]
    #[educe(Default = defaults::build::sitemap())]
    pub sitemap: PathBuf,

    /// Files and directories copied verbatim into the output directory.
    /// Always relative to the project root.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: Vec<PathBuf>,

    /// Optional layout template wrapping every page body.
    #[serde(default = "defaults::build::layout")]
    #[educe(Default = defaults::build::layout())]
    pub layout: PathBuf,

    /// Extension of page source files (without the dot).
    #[serde(default = "defaults::build::source_ext")]
    #[educe(Default = defaults::build::source_ext())]
    pub source_ext: String,

    /// Extension of rendered output files (without the dot).
    #[serde(default = "defaults::build::output_ext")]
    #[educe(Default = defaults::build::output_ext())]
    pub output_ext: String,
}

impl BuildConfig {
    /// Whether `path` carries the page-source extension.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.source_ext.as_str())
    }

    /// Whether `path` lies inside the output directory.
    pub fn is_in_output(&self, path: &Path) -> bool {
        path.starts_with(&self.output)
    }

    /// Map a source-relative page path to its location in the output tree.
    ///
    /// `posts/a.page` → `<output>/posts/a.html`
    pub fn output_path(&self, page_path: &Path) -> PathBuf {
        self.output.join(page_path.with_extension(&self.output_ext))
    }
}
