//! File-backed page sources.
//!
//! A page file is a `+++`-delimited TOML front-matter block followed by an
//! HTML body:
//!
//! ```text
//! +++
//! title = "Home"
//! +++
//! <h1>Hello</h1>
//! ```

use super::{PageData, PageError, PageResolver, PageSource, VisualTree, check_page};
use crate::config::{BaseConfig, SiteConfig};
use std::{
    fs,
    path::{Path, PathBuf},
};

const FRONT_MATTER_DELIMITER: &str = "+++";

/// Resolves page paths by reading and parsing the file on every call.
///
/// Nothing is cached: a dev rebuild always sees the current file contents.
#[derive(Debug, Clone)]
pub struct FilePageResolver {
    site: BaseConfig,
    layout: PathBuf,
}

impl FilePageResolver {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            site: config.base.clone(),
            layout: config.build.layout.clone(),
        }
    }

    /// Layout template, if the project has one.
    fn read_layout(&self) -> Option<String> {
        fs::read_to_string(&self.layout).ok()
    }
}

impl PageResolver for FilePageResolver {
    fn resolve(&self, path: &Path) -> Result<Box<dyn PageSource>, PageError> {
        let content =
            fs::read_to_string(path).map_err(|err| PageError::Io(path.to_path_buf(), err))?;

        let (front, body) = split_front_matter(&content)
            .map_err(|msg| PageError::Syntax(path.to_path_buf(), msg.to_owned()))?;

        let data = front
            .map(str::parse::<toml::Table>)
            .transpose()
            .map_err(|err| PageError::Syntax(path.to_path_buf(), err.to_string()))?;

        let data = check_page(data.as_ref(), Some(body))
            .map_err(|reason| PageError::Shape(path.to_path_buf(), reason))?;

        Ok(Box::new(FilePage {
            title: self.site.page_title(&data.title),
            site: self.site.title.clone(),
            data,
            body: body.to_owned(),
            layout: self.read_layout(),
        }))
    }
}

/// A page parsed from a file.
struct FilePage {
    data: PageData,
    /// Full document title.
    title: String,
    site: String,
    body: String,
    layout: Option<String>,
}

impl PageSource for FilePage {
    fn data(&self) -> &PageData {
        &self.data
    }

    fn render(&self) -> VisualTree {
        match &self.layout {
            Some(template) => self.render_template(template),
            None => VisualTree::element(
                "html",
                vec![],
                vec![
                    VisualTree::element(
                        "head",
                        vec![],
                        vec![
                            VisualTree::element("meta", vec![("charset", "utf-8")], vec![]),
                            VisualTree::element("title", vec![], vec![VisualTree::text(&self.title)]),
                        ],
                    ),
                    VisualTree::element("body", vec![], vec![VisualTree::raw(&self.body)]),
                ],
            ),
        }
    }
}

impl FilePage {
    /// Fill `{{title}}`, `{{site}}` and `{{content}}` in a layout template.
    ///
    /// Titles are inserted as text, the body verbatim. Unknown `{{...}}`
    /// sequences are left alone.
    fn render_template(&self, template: &str) -> VisualTree {
        let mut nodes = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let (before, tail) = rest.split_at(start);
            let Some(end) = tail.find("}}") else {
                break;
            };

            let node = match tail[2..end].trim() {
                "title" => VisualTree::text(&self.title),
                "site" => VisualTree::text(&self.site),
                "content" => VisualTree::raw(&self.body),
                _ => VisualTree::raw(&tail[..end + 2]),
            };
            if !before.is_empty() {
                nodes.push(VisualTree::raw(before));
            }
            nodes.push(node);
            rest = &tail[end + 2..];
        }

        if !rest.is_empty() {
            nodes.push(VisualTree::raw(rest));
        }
        VisualTree::Fragment(nodes)
    }
}

/// Split a page file into its front matter and body.
///
/// Returns `None` for the front matter when the file does not open with a
/// delimiter line. An opening delimiter without a closing one is an error.
fn split_front_matter(content: &str) -> Result<(Option<&str>, &str), &'static str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(first_len) = line_len(content, 0) else {
        return Ok((None, content));
    };
    if content[..first_len].trim_end() != FRONT_MATTER_DELIMITER {
        return Ok((None, content));
    }

    let front_start = next_line(content, 0);
    let mut pos = front_start;
    while pos < content.len() {
        let len = line_len(content, pos).unwrap_or(content.len() - pos);
        if content[pos..pos + len].trim_end() == FRONT_MATTER_DELIMITER {
            let body = &content[next_line(content, pos)..];
            return Ok((Some(&content[front_start..pos]), body));
        }
        pos = next_line(content, pos);
    }

    Err("unterminated front matter")
}

/// Length of the line starting at `pos`, without its newline.
fn line_len(content: &str, pos: usize) -> Option<usize> {
    if pos >= content.len() {
        return None;
    }
    Some(content[pos..].find('\n').unwrap_or(content.len() - pos))
}

/// Offset of the line after the one starting at `pos`.
fn next_line(content: &str, pos: usize) -> usize {
    content[pos..]
        .find('\n')
        .map_or(content.len(), |i| pos + i + 1)
}
