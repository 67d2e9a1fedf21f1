//! Link rewriting from source space to output space.
//!
//! Pages link to each other by source path relative to the project root
//! (`posts/b.page`, or `/posts/b.page`). Output files mirror the source
//! tree, so each link is rewritten to a path relative to the output file
//! that contains it (`./b.html` from `posts/a.html`).
//!
//! | Page           | Href              | Output             |
//! |----------------|-------------------|--------------------|
//! | `posts/a.page` | `posts/b.page`    | `./b.html`         |
//! | `index.page`   | `posts/a.page#x`  | `./posts/a.html#x` |
//! | `posts/a.page` | `index.page`      | `../index.html`    |
//! | `posts/a.page` | `docs/x.page`     | `../docs/x.html`   |
//! | any            | `https://a.b/c`   | unchanged          |

use crate::config::BuildConfig;
use crate::page::to_slash;
use std::path::Path;

/// Rewrites `href`/`src` values for one build.
#[derive(Debug, Clone, Copy)]
pub struct LinkRewriter<'a> {
    source_ext: &'a str,
    output_ext: &'a str,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(build: &'a BuildConfig) -> Self {
        Self {
            source_ext: &build.source_ext,
            output_ext: &build.output_ext,
        }
    }

    /// Rewrite `href` found in the page whose source is `page_path`.
    ///
    /// `page_path` is root-relative. External, fragment-only and query-only
    /// hrefs are returned unchanged; an empty href stays empty.
    pub fn rewrite(&self, page_path: &Path, href: &str) -> String {
        if href.is_empty() || href.starts_with(['#', '?']) || is_external_link(href) {
            return href.to_owned();
        }

        let (path, suffix) = href
            .find(['?', '#'])
            .map_or((href, ""), |pos| href.split_at(pos));
        let trailing_slash = path.ends_with('/');

        let target = self.map_extension(path.trim_start_matches('/'));
        let to = resolve_segments(&target);

        let page = to_slash(&page_path.with_extension(self.output_ext));
        let from = resolve_segments(&page);

        let mut rel = relative_path(&from, &to);
        rel = if rel.is_empty() {
            // Self link
            format!("./{}", to.last().copied().unwrap_or_default())
        } else {
            collapse_parent_escape(&rel)
        };

        if trailing_slash && !rel.ends_with('/') {
            rel.push('/');
        }
        rel.push_str(suffix);
        rel
    }

    /// `posts/a.page` → `posts/a.html`; other paths are unchanged.
    fn map_extension(&self, path: &str) -> String {
        path.strip_suffix(self.source_ext)
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
            .map_or_else(|| path.to_owned(), |stem| format!("{stem}.{}", self.output_ext))
    }
}

/// Check if a link is external (has a scheme like `https:` or `mailto:`,
/// or is protocol-relative).
pub fn is_external_link(link: &str) -> bool {
    link.starts_with("//")
        || link.find(':').is_some_and(|pos| {
            pos > 0
                && link[..pos]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Split a `/`-separated path into segments, resolving `.` and `..`.
///
/// A `..` that would climb above the start is kept.
fn resolve_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." if segments.last().is_some_and(|last| *last != "..") => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments
}

/// Generic relative path from `from` to `to`, treating `from` itself as a
/// directory.
///
/// `a/b.html` → `a/c.html` gives `../c.html`.
fn relative_path(from: &[&str], to: &[&str]) -> String {
    let common = from.iter().zip(to).take_while(|(a, b)| a == b).count();

    let mut parts = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}

/// Drop the one spurious parent escape introduced by measuring from the
/// output file rather than its directory.
///
/// `../b.html` → `./b.html`, `../../x.html` → `../x.html`, `..` → `.`
fn collapse_parent_escape(rel: &str) -> String {
    match rel.strip_prefix("../") {
        Some(rest) if rest == ".." || rest.starts_with("../") => rest.to_owned(),
        Some(rest) => format!("./{rest}"),
        None if rel == ".." => ".".to_owned(),
        None => rel.to_owned(),
    }
}
