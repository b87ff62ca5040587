//! Development server composing pages on request.
//!
//! Serves straight from the site root: every `.html` page is bootstrapped
//! when it is requested, so edits to pages and fragments show up on the next
//! reload without a build step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (stitch.toml)   │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    cfg() per request       reload_config()
//!    compose / serve file
//! ```

use crate::{
    bootstrap::Bootstrapper,
    build::{is_page, url_path},
    config::{SiteConfig, cfg},
    fragment::{FsSource, page_dir},
    log,
    path::PathContext,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use std::{
    borrow::Cow,
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const NOT_FOUND: &str = "404 Not Found";

/// Start the development server, with the config watcher if enabled.
///
/// Blocks until Ctrl+C is received.
pub fn serve_site() -> Result<()> {
    let c = cfg();
    let interface: IpAddr = c.serve.interface.parse()?;

    let (server, addr) = try_bind_port(interface, c.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if c.serve.watch {
        std::thread::spawn(|| {
            if let Err(err) = watch_for_changes_blocking() {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        // config may have been swapped by the watcher since the last request
        if let Err(e) = handle_request(request, &cfg()) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// What a request maps to under the site root.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    /// Composed on the fly; `rel` is relative to the site root.
    Page { path: PathBuf, rel: PathBuf },
    File(PathBuf),
    /// Directory requested without a trailing slash; relative links in its
    /// index page only resolve once the browser sees the slash.
    Redirect(String),
    NotFound,
}

/// Resolve a raw request URL against the site root.
///
/// Resolution order:
/// 1. Exact file match
/// 2. Directory with `index.html`, redirected first if the slash is missing
/// 3. Nothing found (also for paths escaping the root or hitting the output dir)
fn resolve_target(url: &str, config: &SiteConfig) -> Target {
    let root = config.get_root();

    let decoded = urlencoding::decode(url).unwrap_or(Cow::Borrowed(url));
    let decoded_path = decoded.split(['?', '#']).next().unwrap_or_default();
    let request_path = decoded_path.trim_matches('/');

    let rel = Path::new(request_path);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Target::NotFound;
    }

    let mut local = root.join(rel);
    if local.starts_with(&config.build.output) {
        return Target::NotFound;
    }
    if local.is_dir() {
        if !request_path.is_empty() && !decoded_path.ends_with('/') {
            // keep the client's encoding; a leading `//` would leave the host
            let (path, query) = url.split_at(url.find('?').unwrap_or(url.len()));
            return Target::Redirect(format!("/{}/{query}", path.trim_matches('/')));
        }
        local = local.join("index.html");
    }
    if !local.is_file() {
        return Target::NotFound;
    }

    let page = local
        .strip_prefix(root)
        .ok()
        .filter(|rel| is_page(rel))
        .map(Path::to_path_buf);
    match page {
        Some(rel) => Target::Page { path: local, rel },
        None => Target::File(local),
    }
}

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    match resolve_target(request.url(), config) {
        Target::Page { path, rel } => {
            let html = compose(&path, &rel, config)?;
            respond(request, html.into_bytes(), "text/html; charset=utf-8")
        }
        Target::File(path) => {
            let content =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            respond(request, content, guess_content_type(&path))
        }
        Target::Redirect(location) => redirect(request, &location),
        Target::NotFound => serve_not_found(request),
    }
}

/// Bootstrap one page from the source tree.
fn compose(path: &Path, rel: &Path, config: &SiteConfig) -> Result<String> {
    let html =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let ctx = PathContext::resolve(&url_path(rel), &config.site.markers);
    let source = FsSource::new(config.get_root(), page_dir(rel));
    let report = Bootstrapper::new(config, &source).bootstrap(&html, &ctx);
    log!("serve"; "{} ({} fragments)", rel.display(), report.injected());
    Ok(report.html)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type_header(content_type: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", content_type)
        .map_err(|()| anyhow!("invalid content type: {content_type}"))
}

fn respond(request: Request, content: Vec<u8>, content_type: &str) -> Result<()> {
    let response = Response::from_data(content).with_header(content_type_header(content_type)?);
    request.respond(response)?;
    Ok(())
}

fn redirect(request: Request, location: &str) -> Result<()> {
    let header = Header::from_bytes("Location", location)
        .map_err(|()| anyhow!("invalid redirect location: {location}"))?;
    request.respond(Response::empty(StatusCode(301)).with_header(header))?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![content_type_header("text/plain")?],
        Cursor::new(NOT_FOUND),
        Some(NOT_FOUND.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}
