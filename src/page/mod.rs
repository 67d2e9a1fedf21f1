//! Page model and loading.
//!
//! A page is anything implementing [`PageSource`]: metadata plus a pure
//! `render` producing a [`VisualTree`]. Pages are resolved from paths at
//! run time through a [`PageResolver`], so a missing or broken source is an
//! ordinary value ([`PageState::Invalid`]) rather than an abort.
//!
//! ```text
//! discover_source_files() ──► load_page() ──► PageResolver::resolve()
//!                                  │
//!                                  ▼
//!                     LoadedPage { Valid | Invalid }
//! ```

mod loader;
mod source;
mod tree;

pub use loader::{discover_source_files, load_all_pages, load_page, load_pages};
pub use source::FilePageResolver;
pub use tree::{VisualTree, render_tree_to_string};

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Page metadata surfaced in navigation and the sitemap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Placeholder metadata carried by invalid pages.
static PLACEHOLDER_DATA: PageData = PageData {
    title: String::new(),
    desc: None,
    image: None,
    date: None,
};

/// A page: metadata plus a side-effect-free render.
pub trait PageSource: Send + Sync {
    fn data(&self) -> &PageData;
    fn render(&self) -> VisualTree;
}

/// Resolves a page-source path to a page at run time.
pub trait PageResolver: Send + Sync {
    /// `path` is absolute. Any failure is reported, never panicked.
    fn resolve(&self, path: &Path) -> Result<Box<dyn PageSource>, PageError>;
}

/// Why a page could not be loaded.
#[derive(Debug, Error)]
pub enum PageError {
    /// Source could not be read.
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// Source was read but could not be parsed.
    #[error("cannot parse `{0}`: {1}")]
    Syntax(PathBuf, String),

    /// Source parsed but is not shaped like a page.
    #[error("`{0}` is not a page: {1}")]
    Shape(PathBuf, &'static str),

    /// Path points into the build output.
    #[error("`{0}` lies inside the output directory")]
    InsideOutput(PathBuf),

    /// Path resolves to somewhere outside the project root.
    #[error("`{0}` lies outside the project root")]
    OutsideRoot(PathBuf),
}

/// Outcome of loading one page source.
pub enum PageState {
    Valid(Box<dyn PageSource>),
    Invalid(PageError),
}

/// A page together with its source-relative path.
pub struct LoadedPage {
    /// Relative to the project root, always ending in the source extension.
    pub path: PathBuf,
    pub state: PageState,
}

impl LoadedPage {
    pub fn valid(path: PathBuf, source: Box<dyn PageSource>) -> Self {
        Self {
            path,
            state: PageState::Valid(source),
        }
    }

    pub fn invalid(path: PathBuf, error: PageError) -> Self {
        Self {
            path,
            state: PageState::Invalid(error),
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self.state, PageState::Valid(_))
    }

    pub fn source(&self) -> Option<&dyn PageSource> {
        match &self.state {
            PageState::Valid(source) => Some(source.as_ref()),
            PageState::Invalid(_) => None,
        }
    }

    pub const fn error(&self) -> Option<&PageError> {
        match &self.state {
            PageState::Valid(_) => None,
            PageState::Invalid(err) => Some(err),
        }
    }

    /// Page metadata; invalid pages report an empty title.
    pub fn data(&self) -> &PageData {
        self.source().map_or(&PLACEHOLDER_DATA, |source| source.data())
    }

    /// Render the page; invalid pages render an empty `div`.
    pub fn render(&self) -> VisualTree {
        self.source().map_or_else(
            || VisualTree::element("div", vec![], vec![]),
            |source| source.render(),
        )
    }
}

impl std::fmt::Debug for LoadedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPage")
            .field("path", &self.path)
            .field("data", self.data())
            .field("error", &self.error())
            .finish()
    }
}

/// Check that parsed page parts have the shape of a page.
///
/// This is a capability check, not a schema: `data` must be a table with a
/// non-empty string `title`, and there must be something to render. Other
/// keys are ignored; optional fields of the wrong type are dropped.
pub fn check_page(
    data: Option<&toml::Table>,
    render: Option<&str>,
) -> Result<PageData, &'static str> {
    let data = data.ok_or("missing data")?;

    let title = match data.get("title") {
        Some(toml::Value::String(title)) if !title.is_empty() => title.clone(),
        _ => return Err("data.title must be a non-empty string"),
    };

    if render.is_none_or(|body| body.trim().is_empty()) {
        return Err("missing render");
    }

    let field = |key: &str| match data.get(key) {
        Some(toml::Value::String(s)) => Some(s.clone()),
        Some(toml::Value::Datetime(dt)) => Some(dt.to_string()),
        _ => None,
    };

    Ok(PageData {
        title,
        desc: field("desc"),
        image: field("image"),
        date: field("date"),
    })
}

/// Render a relative path with `/` separators, dropping `.` segments.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
