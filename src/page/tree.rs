//! Renderable page tree and its HTML serialization.
//!
//! The tree is deliberately small: elements, escaped text, raw HTML
//! fragments and fragments of siblings. Page bodies are usually `Raw`.

use std::fmt::Write;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A renderable tree produced by [`super::PageSource::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualTree {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<VisualTree>,
    },
    /// Text content, escaped on output.
    Text(String),
    /// Trusted HTML, written verbatim.
    Raw(String),
    Fragment(Vec<VisualTree>),
}

impl VisualTree {
    pub fn element(
        tag: impl Into<String>,
        attrs: Vec<(&str, &str)>,
        children: Vec<VisualTree>,
    ) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw(html.into())
    }
}

/// Serialize a tree to an HTML string.
///
/// An `html` root element is prefixed with `<!DOCTYPE html>`.
pub fn render_tree_to_string(tree: &VisualTree) -> String {
    let mut out = String::with_capacity(4096);
    if matches!(tree, VisualTree::Element { tag, .. } if tag.eq_ignore_ascii_case("html")) {
        out.push_str("<!DOCTYPE html>");
    }
    write_node(&mut out, tree);
    out
}

fn write_node(out: &mut String, node: &VisualTree) {
    match node {
        VisualTree::Element {
            tag,
            attrs,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attrs {
                // Writing into a String cannot fail
                let _ = write!(out, r#" {key}="{}""#, escape_html(value, true));
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str()) {
                return;
            }

            for child in children {
                write_node(out, child);
            }
            let _ = write!(out, "</{tag}>");
        }
        VisualTree::Text(text) => out.push_str(&escape_html(text, false)),
        VisualTree::Raw(html) => out.push_str(html),
        VisualTree::Fragment(nodes) => {
            for child in nodes {
                write_node(out, child);
            }
        }
    }
}

/// Escape HTML special characters; quotes only inside attribute values.
fn escape_html(s: &str, attr: bool) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attr => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
