//! Development server.
//!
//! Serves the output directory over HTTP with `tiny_http` while the
//! watcher rebuilds changed pages in the background.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Serve files             Partial rebuilds
//!          └───────────┬───────────┘
//!                      ▼
//!             config.build.output
//! ```
//!
//! A request may observe a half-rebuilt tree while a multi-page rebuild is
//! in progress; this is accepted for local development.

use crate::{config::SiteConfig, log, page::PageResolver, watch::start_watcher};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Successive ports tried when the configured one is in use.
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Watch for changes and serve the output directory until Ctrl+C.
///
/// Failing to start the watcher or to bind a port is fatal.
pub fn serve_site(config: &'static SiteConfig, resolver: &'static dyn PageResolver) -> Result<()> {
    let _watcher = start_watcher(config, resolver)?;

    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    // Blocks until Ctrl+C unblocks the server
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &config.build.output) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {max_retries} attempts (ports {base_port}-{}): {}",
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map_or_else(|| "no attempt made".to_owned(), |e| e.to_string())
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Where a request URL points inside the served directory.
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(PathBuf),
    NotFound,
    Forbidden,
}

/// Map a request URL to a file under `serve_root`.
///
/// Resolution order: exact file, then `index.html` of a directory.
fn resolve_request(url: &str, serve_root: &Path) -> Resolved {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(url)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path
    let path_without_query = url_path.split(['?', '#']).next().unwrap_or(&url_path);
    let request_path = Path::new(path_without_query.trim_matches('/'));

    if request_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Resolved::Forbidden;
    }

    let local_path = serve_root.join(request_path);
    if local_path.is_file() {
        return Resolved::File(local_path);
    }

    let index_path = local_path.join("index.html");
    if local_path.is_dir() && index_path.is_file() {
        return Resolved::File(index_path);
    }

    Resolved::NotFound
}

fn handle_request(request: Request, serve_root: &Path) -> Result<()> {
    match resolve_request(request.url(), serve_root) {
        Resolved::File(path) => serve_file(request, &path),
        Resolved::NotFound => serve_status(request, 404, "404 Not Found"),
        Resolved::Forbidden => serve_status(request, 403, "403 Forbidden"),
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("Invalid header value `{value}`"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content).with_header(content_type(guess_content_type(path))?);

    request.respond(response)?;
    Ok(())
}

/// Serve a plain-text status response.
fn serve_status(request: Request, code: u16, body: &'static str) -> Result<()> {
    let response = Response::new(
        StatusCode(code),
        vec![content_type("text/plain")?],
        Cursor::new(body),
        Some(body.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("toml") => "application/toml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Media
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("vtt") => "text/vtt; charset=utf-8",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("posts/index.html"), "posts").unwrap();
        fs::write(dir.path().join("posts/my post.html"), "spaced").unwrap();
        dir
    }

    #[test]
    fn test_resolve_file() {
        let dir = site();
        assert_eq!(
            resolve_request("/posts/index.html?t=123", dir.path()),
            Resolved::File(dir.path().join("posts/index.html"))
        );
    }

    #[test]
    fn test_resolve_url_encoded() {
        let dir = site();
        assert_eq!(
            resolve_request("/posts/my%20post.html", dir.path()),
            Resolved::File(dir.path().join("posts/my post.html"))
        );
    }

    #[test]
    fn test_resolve_directory_index() {
        let dir = site();
        assert_eq!(
            resolve_request("/", dir.path()),
            Resolved::File(dir.path().join("index.html"))
        );
        assert_eq!(
            resolve_request("/posts/", dir.path()),
            Resolved::File(dir.path().join("posts/index.html"))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let dir = site();
        assert_eq!(resolve_request("/nope.html", dir.path()), Resolved::NotFound);
        assert_eq!(resolve_request("/empty/", dir.path()), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_rejects_parent_segments() {
        let dir = site();
        assert_eq!(resolve_request("/../secret", dir.path()), Resolved::Forbidden);
        assert_eq!(resolve_request("/posts/%2E%2E/%2E%2E/x", dir.path()), Resolved::Forbidden);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("a/b.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("logo.PNG")), "application/octet-stream");
        assert_eq!(guess_content_type(Path::new("favicon.ico")), "image/x-icon");
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }
}
