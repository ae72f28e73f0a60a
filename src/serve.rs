//! Development server.
//!
//! A lightweight HTTP server built on `tiny_http`, serving the site's query
//! surfaces directly from the catalog. Every request re-resolves the
//! snapshot, so content edits show up on the next reload without a rebuild
//! step.
//!
//! # Routes
//!
//! | Route                  | Behavior                                      |
//! |------------------------|-----------------------------------------------|
//! | `GET /`                | Redirect to the listing                       |
//! | `GET /content?tag=..`  | Listing page with tag facets and filter       |
//! | `GET /content/<slug>`  | Post page, or 404 with a link home            |
//! | `GET /demos/combobox`  | Combobox demo backed by the local keyed store |
//! | `POST /demos/combobox` | Create a new option, redirect back            |
//! | `GET /sitemap.xml`     | Sitemap, generated fresh                      |
//! | `GET /rss.xml`         | rss feed, generated fresh                     |
//!
//! Catalog-backed responses carry a `Server-Timing` header with the source
//! read duration. Handler failures surface as a generic 500 page; everything
//! unmatched is a 404 page with a recovery link home.

use crate::{
    catalog::{Catalog, CatalogView, ContentRecord, source},
    config::SiteConfig,
    generator::{rss::rss_xml, sitemap::sitemap_xml},
    log,
    store::{DirSlot, KeyedStore},
    utils::timing::{SERVER_TIMING_HEADER, Timings},
};
use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use std::{borrow::Cow, io::Read, net::SocketAddr, sync::Arc};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

// ============================================================================
// Constants - HTML Templates
// ============================================================================

/// Listing page template (embedded at compile time)
const LISTING_TEMPLATE: &str = include_str!("embed/serve/listing.html");

/// Post page template
const POST_TEMPLATE: &str = include_str!("embed/serve/post.html");

/// Combobox demo page template
const DEMO_TEMPLATE: &str = include_str!("embed/serve/combobox.html");

/// 404 page with a link home
const NOT_FOUND_TEMPLATE: &str = include_str!("embed/serve/not_found.html");

/// Store name for the combobox demo's options.
const GENRE_STORE: &str = "combobox:genres";

/// Options seeded on first access, so the demo is never empty.
const DEFAULT_GENRES: &[&str] = &["Rock", "Pop", "Jazz"];

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server.
///
/// Binds to the configured interface and port (with auto-retry on port
/// conflict), sets up Ctrl+C for graceful shutdown, then handles requests in
/// the main thread until shutdown.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    // One explicit store handle for the demo, scoped to its store name
    let genres = KeyedStore::new(GENRE_STORE, DirSlot::new(config.store_dir()));

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, config, &genres) {
            log!("serve"; "request error: {err:#}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
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
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// A response waiting to be sent.
struct Page {
    status: u16,
    content_type: &'static str,
    body: String,
    headers: Vec<(String, String)>,
}

impl Page {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
            headers: Vec::new(),
        }
    }

    fn xml(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/xml; charset=utf-8",
            body,
            headers: Vec::new(),
        }
    }

    fn redirect(status: u16, location: &str) -> Self {
        Self::html(status, String::new()).with_header("Location", location)
    }

    fn not_found() -> Self {
        Self::html(404, NOT_FOUND_TEMPLATE.to_owned())
    }

    fn internal_error() -> Self {
        Self::html(500, "<h1>500</h1><p>Something went wrong</p>".to_owned())
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }
}

/// Handle a single HTTP request: route it, fall back to the generic error
/// surface on handler failure, send the response.
fn handle_request(
    mut request: Request,
    config: &SiteConfig,
    genres: &KeyedStore<DirSlot>,
) -> Result<()> {
    let page = route(&mut request, config, genres).unwrap_or_else(|err| {
        log!("error"; "{err:#}");
        Page::internal_error()
    });
    respond(request, page)
}

/// Dispatch a request to its handler.
fn route(
    request: &mut Request,
    config: &SiteConfig,
    genres: &KeyedStore<DirSlot>,
) -> Result<Page> {
    let url = request.url().to_owned();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    // Decode URL-encoded characters (e.g., %20 → space)
    let path = urlencoding::decode(path)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned());
    let path = path.trim_matches('/');

    match (request.method().clone(), path) {
        (Method::Get, "") => Ok(Page::redirect(302, "/content")),
        (Method::Get, "content") => listing_page(config, query_param(query, "tag").as_deref()),
        (Method::Get, "sitemap.xml") => sitemap_page(config),
        (Method::Get, "rss.xml") => rss_page(config),
        (Method::Get, "demos/combobox") => demo_page(genres),
        (Method::Post, "demos/combobox") => create_demo_option(request, genres),
        (Method::Get, path) => match path.strip_prefix("content/") {
            Some(slug) => post_page(config, slug),
            None => Ok(Page::not_found()),
        },
        _ => Ok(Page::not_found()),
    }
}

/// Send a finished page down the wire.
fn respond(request: Request, page: Page) -> Result<()> {
    let mut response = Response::from_string(page.body)
        .with_status_code(StatusCode(page.status))
        .with_header(header("Content-Type", page.content_type)?);
    for (name, value) in &page.headers {
        response = response.with_header(header(name, value)?);
    }
    request.respond(response).context("failed to send response")
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header `{name}`"))
}

// ============================================================================
// Catalog Pages
// ============================================================================

/// Resolve a fresh catalog snapshot for one request.
fn resolve_catalog(config: &SiteConfig, timings: &mut Timings) -> Result<CatalogView> {
    let source = source::from_config(config);
    Catalog::new(source.as_ref()).resolve(timings)
}

fn listing_page(config: &SiteConfig, tag: Option<&str>) -> Result<Page> {
    let mut timings = Timings::new();
    let view = resolve_catalog(config, &mut timings)?;

    let title = if config.base.title.is_empty() {
        "All posts"
    } else {
        config.base.title.as_str()
    };
    let body = LISTING_TEMPLATE
        .replace("{{title}}", &html_escape(title))
        .replace("{{tags}}", &facet_list_html(&view.tag_facets(), tag))
        .replace("{{posts}}", &post_list_html(&view.list(tag)));

    Ok(Page::html(200, body).with_header(SERVER_TIMING_HEADER, &timings.header_value()))
}

fn post_page(config: &SiteConfig, slug: &str) -> Result<Page> {
    let mut timings = Timings::new();
    let view = resolve_catalog(config, &mut timings)?;

    let Some(record) = view.find(slug) else {
        return Ok(Page::not_found());
    };

    let body = POST_TEMPLATE
        .replace("{{title}}", &html_escape(&record.title))
        .replace("{{timestamp}}", record.timestamp.as_deref().unwrap_or(""))
        .replace("{{tags}}", &html_escape(&record.tags.join(", ")))
        .replace("{{body}}", &html_escape(&record.body));

    Ok(Page::html(200, body).with_header(SERVER_TIMING_HEADER, &timings.header_value()))
}

fn sitemap_page(config: &SiteConfig) -> Result<Page> {
    let mut timings = Timings::new();
    let view = resolve_catalog(config, &mut timings)?;
    let xml = sitemap_xml(config, &view.sitemap_entries());
    Ok(Page::xml(xml).with_header(SERVER_TIMING_HEADER, &timings.header_value()))
}

fn rss_page(config: &SiteConfig) -> Result<Page> {
    let mut timings = Timings::new();
    let view = resolve_catalog(config, &mut timings)?;
    let xml = rss_xml(config, &view)?;
    Ok(Page::xml(xml).with_header(SERVER_TIMING_HEADER, &timings.header_value()))
}

/// Render the facet link list; the active entry is bold instead of a link.
fn facet_list_html(facets: &[String], current: Option<&str>) -> String {
    let mut html = String::new();

    let all = match current {
        None => "<strong>All posts</strong>".to_owned(),
        Some(_) => r#"<a href="/content">All posts</a>"#.to_owned(),
    };
    html.push_str(&format!("    <li>{all}</li>\n"));

    for tag in facets {
        let item = if current == Some(tag.as_str()) {
            format!("<strong>{}</strong>", html_escape(tag))
        } else {
            format!(
                r#"<a href="/content?tag={}">{}</a>"#,
                urlencoding::encode(tag),
                html_escape(tag)
            )
        };
        html.push_str(&format!("    <li>{item}</li>\n"));
    }

    html
}

/// Render listing rows, one per record in snapshot order.
fn post_list_html(records: &[&ContentRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let time = record
                .timestamp
                .as_deref()
                .map(|ts| format!("<time>{ts}</time> "))
                .unwrap_or_default();
            format!(
                "    <li>{}<a href=\"/content/{}\">{}</a></li>\n",
                time,
                record.slug,
                html_escape(&record.title)
            )
        })
        .collect()
}

// ============================================================================
// Demo Store Pages
// ============================================================================

fn demo_page(genres: &KeyedStore<DirSlot>) -> Result<Page> {
    // Seed defaults on first access so the demo is never empty
    if genres.find_all().is_empty() {
        for name in DEFAULT_GENRES {
            genres.create_one(option_payload(name))?;
        }
    }

    let options: String = genres
        .find_all()
        .iter()
        .map(|entry| {
            format!(
                "    <li data-id=\"{}\">{}</li>\n",
                html_escape(&entry.id),
                html_escape(entry.get_str("name").unwrap_or_default())
            )
        })
        .collect();

    Ok(Page::html(200, DEMO_TEMPLATE.replace("{{options}}", &options)))
}

fn create_demo_option(request: &mut Request, genres: &KeyedStore<DirSlot>) -> Result<Page> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .context("failed to read request body")?;

    for (key, value) in form_fields(&body) {
        let name = value.trim();
        if key == "name" && !name.is_empty() {
            let entry = genres.create_one(option_payload(name))?;
            log!("store"; "created option `{name}` ({})", entry.id);
        }
    }

    Ok(Page::redirect(303, "/demos/combobox"))
}

fn option_payload(name: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".to_owned(), Value::String(name.to_owned()));
    payload
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract a single query parameter; an empty value counts as absent.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| decode_component(v))
    })
}

/// Parse an `application/x-www-form-urlencoded` body.
fn form_fields(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((decode_component(key), decode_component(value)))
        })
        .collect()
}

/// Decode one form component (`+` means space).
fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.clone())
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug: &str, title: &str, timestamp: Option<&str>) -> ContentRecord {
        ContentRecord {
            slug: slug.to_owned(),
            title: title.to_owned(),
            timestamp: timestamp.map(str::to_owned),
            tags: Vec::new(),
            published: true,
            body: String::new(),
        }
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("tag=remix", "tag").as_deref(), Some("remix"));
        assert_eq!(
            query_param("other=1&tag=advanced%20forms", "tag").as_deref(),
            Some("advanced forms")
        );
        assert_eq!(query_param("tag=a+b", "tag").as_deref(), Some("a b"));
        assert_eq!(query_param("", "tag"), None);
        assert_eq!(query_param("tag=", "tag"), None);
        assert_eq!(query_param("other=1", "tag"), None);
    }

    #[test]
    fn test_form_fields() {
        let fields = form_fields("name=Lo-fi+House&genreId=abc%2D1");
        assert_eq!(
            fields,
            vec![
                ("name".to_owned(), "Lo-fi House".to_owned()),
                ("genreId".to_owned(), "abc-1".to_owned()),
            ]
        );
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("plain"), "plain");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & \"b\""), "a &amp; &quot;b&quot;");
    }

    #[test]
    fn test_facet_list_html_marks_current() {
        let facets = vec!["forms".to_owned(), "remix".to_owned()];

        let unfiltered = facet_list_html(&facets, None);
        assert!(unfiltered.contains("<strong>All posts</strong>"));
        assert!(unfiltered.contains(r#"<a href="/content?tag=forms">forms</a>"#));

        let filtered = facet_list_html(&facets, Some("forms"));
        assert!(filtered.contains(r#"<a href="/content">All posts</a>"#));
        assert!(filtered.contains("<strong>forms</strong>"));
        assert!(filtered.contains(r#"<a href="/content?tag=remix">remix</a>"#));
    }

    #[test]
    fn test_facet_list_html_encodes_tag_links() {
        let facets = vec!["advanced forms".to_owned()];
        let html = facet_list_html(&facets, None);
        assert!(html.contains(r#"href="/content?tag=advanced%20forms""#));
        assert!(html.contains(">advanced forms</a>"));
    }

    #[test]
    fn test_post_list_html() {
        let dated = record("hello", "Hello <World>", Some("2024-01-15"));
        let undated = record("notes", "Notes", None);
        let html = post_list_html(&[&dated, &undated]);

        assert!(html.contains(r#"<a href="/content/hello">Hello &lt;World&gt;</a>"#));
        assert!(html.contains("<time>2024-01-15</time>"));
        assert!(html.contains(r#"<a href="/content/notes">Notes</a>"#));
    }

    #[test]
    fn test_page_redirect_carries_location() {
        let page = Page::redirect(303, "/demos/combobox");
        assert_eq!(page.status, 303);
        assert!(page
            .headers
            .iter()
            .any(|(name, value)| name == "Location" && value == "/demos/combobox"));
    }

    #[test]
    fn test_page_not_found_links_home() {
        let page = Page::not_found();
        assert_eq!(page.status, 404);
        assert!(page.body.contains(r#"<a href="/">"#));
    }
}
