//! Page rendering: tree → HTML, then structural link rewriting.
//!
//! The serialized page is re-read with a lenient streaming parser and
//! written back event by event. Only `href`/`src` attributes of link-bearing
//! elements change, so text that merely looks like a link is never touched.

use crate::{
    config::SiteConfig,
    link::LinkRewriter,
    page::{LoadedPage, render_tree_to_string},
};
use anyhow::Result;
use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
};
use std::{
    io::{Cursor, Write},
    path::Path,
};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Reloads the tab after it regains focus, so an editor save followed by
/// switching back to the browser shows the rebuilt page.
const RELOAD_SCRIPT: &str = concat!(
    "<script>(() => {",
    "let armed = false;",
    "window.addEventListener(\"blur\", () => { armed = true; });",
    "window.addEventListener(\"focus\", () => {",
    "if (armed) { armed = false; setTimeout(() => location.reload(), 200); }",
    "});",
    "})();</script>"
);

/// Render a page to its final HTML.
///
/// The reload script is added only when `dev_mode` is set and
/// `serve.auto_reload` is enabled.
pub fn render_page(page: &LoadedPage, dev_mode: bool, config: &SiteConfig) -> Result<String> {
    let html = render_tree_to_string(&page.render());
    let rewriter = LinkRewriter::new(&config.build);
    let reload = dev_mode && config.serve.auto_reload;

    rewrite_html(html.as_bytes(), &page.path, rewriter, reload)
}

/// Create a reader that accepts real-world HTML.
fn create_html_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.enable_all_checks(false);
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

/// Elements whose content is raw text, not markup.
const RAW_TEXT_ELEMENTS: [&[u8]; 4] = [b"script", b"style", b"textarea", b"title"];

fn rewrite_html(
    content: &[u8],
    page_path: &Path,
    rewriter: LinkRewriter<'_>,
    reload: bool,
) -> Result<String> {
    let mut reader = create_html_reader(content);
    // Offset of the reader's input within `content`
    let mut base = 0;
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(content.len() + 512)));
    let mut injected = !reload;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let name = elem.name().as_ref().to_ascii_lowercase();
                let elem = rewrite_element(&elem, page_path, rewriter);
                writer.write_event(Event::Start(elem))?;

                if RAW_TEXT_ELEMENTS.contains(&name.as_slice()) {
                    let start = base + reader.buffer_position() as usize;
                    let end = find_closing_tag(&content[start..], &name)
                        .map_or(content.len(), |offset| start + offset);
                    writer.get_mut().write_all(&content[start..end])?;
                    base = end;
                    reader = create_html_reader(&content[end..]);
                }
            }
            Ok(Event::Empty(elem)) => {
                let elem = rewrite_element(&elem, page_path, rewriter);
                writer.write_event(Event::Empty(elem))?;
            }
            Ok(Event::End(elem)) => {
                if !injected && elem.name().as_ref().eq_ignore_ascii_case(b"body") {
                    write_reload_script(&mut writer)?;
                    injected = true;
                }
                writer.write_event(Event::End(elem))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            // Markup left open until the end of input (a bare `<`, an
            // unterminated comment) holds no further tags: keep it as text.
            Err(_) => {
                let start = base + reader.error_position() as usize;
                writer.get_mut().write_all(&content[start..])?;
                break;
            }
        }
    }

    if !injected {
        write_reload_script(&mut writer)?;
    }

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Offset of the `</name` tag closing a raw-text element, if any.
fn find_closing_tag(text: &[u8], name: &[u8]) -> Option<usize> {
    let tag_len = name.len() + 2;
    (0..text.len()).find(|&i| {
        text[i..].starts_with(b"</")
            && text
                .get(i + 2..i + tag_len)
                .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
            && text
                .get(i + tag_len)
                .is_none_or(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
    })
}

/// Attribute holding a link for the given (lowercased) tag, if any.
fn link_attribute(tag: &[u8]) -> Option<&'static [u8]> {
    match tag {
        b"a" | b"link" | b"area" | b"base" => Some(b"href"),
        b"img" | b"audio" | b"video" | b"source" | b"script" | b"iframe" | b"input"
        | b"track" | b"embed" => Some(b"src"),
        _ => None,
    }
}

/// Rebuild an element with its link attribute rewritten.
///
/// Elements without a link attribute, or whose attributes do not parse
/// cleanly, are returned unchanged.
fn rewrite_element(
    elem: &BytesStart<'_>,
    page_path: &Path,
    rewriter: LinkRewriter<'_>,
) -> BytesStart<'static> {
    let tag_lower = elem.name().as_ref().to_ascii_lowercase();
    let Some(link_attr) = link_attribute(&tag_lower) else {
        return elem.to_owned();
    };
    let Ok(attrs) = elem.html_attributes().collect::<Result<Vec<_>, _>>() else {
        return elem.to_owned();
    };

    let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut new_elem = BytesStart::new(tag);

    for attr in attrs {
        let key = attr.key.as_ref();
        if key.eq_ignore_ascii_case(link_attr) {
            let value = String::from_utf8_lossy(attr.value.as_ref());
            let rewritten = rewriter.rewrite(page_path, &value);
            new_elem.push_attribute((key, rewritten.as_bytes()));
        } else {
            new_elem.push_attribute((key, attr.value.as_ref()));
        }
    }
    new_elem
}

fn write_reload_script(writer: &mut XmlWriter) -> Result<()> {
    writer.get_mut().write_all(RELOAD_SCRIPT.as_bytes())?;
    Ok(())
}
