//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! classification, session handling, and dispatch to the page, static file,
//! or API layers.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{self, ApiContext, Envelope};
use crate::config::{AppState, SiteConfig};
use crate::handler::{pages, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::template;

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Redirect to the index page under the mount prefix
    RedirectToIndex,
    /// Envelope from query parameters (`GET <prefix>/get/read`)
    ApiGet,
    /// Envelope from JSON body (`POST <prefix>/post/read`)
    ApiPost,
    /// Static asset under the static prefix (or a favicon path)
    Static,
    /// Template page; carries the resolved template path
    Page(String),
    NotFound,
}

/// Classify a request path against the site configuration
pub fn classify(path: &str, site: &SiteConfig) -> Route {
    let prefix = site.prefix();

    if path == "/" || path == prefix || path == format!("{prefix}/") {
        return Route::RedirectToIndex;
    }

    if path == format!("{prefix}/get/read") {
        return Route::ApiGet;
    }
    if path == format!("{prefix}/post/read") {
        return Route::ApiPost;
    }

    if path == "/favicon.ico"
        || path == "/favicon.svg"
        || path.starts_with(&format!("{}/", site.static_prefix))
    {
        return Route::Static;
    }

    if path.starts_with(&format!("{prefix}/")) {
        return Route::Page(template::resolve(path, prefix));
    }

    Route::NotFound
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let is_head = method == Method::HEAD;

    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path.clone());
    entry.query = query.clone();
    entry.http_version = format!("{:?}", req.version()).replace("HTTP/", "");
    entry.user_agent = header(&req, "user-agent");

    // 1. Method gate: GET/HEAD/POST carry on, OPTIONS answered, rest 405
    if let Some(resp) = check_http_method(&method, state.config.http.enable_cors) {
        return Ok(finish(resp, entry, &state));
    }

    // 2. Body size gate
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(finish(resp, entry, &state));
    }

    // 3. Header debug logging
    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let cookie_header = header(&req, "cookie");
    let if_none_match = header(&req, "if-none-match");

    // 4. Route and serve
    let route = classify(&path, &state.config.site);
    let response = match route {
        Route::RedirectToIndex => {
            http::build_redirect_response(&state.config.site.index_path())
        }
        Route::Static => {
            if method == Method::POST {
                http::build_405_response()
            } else {
                static_files::serve(&state, &path, if_none_match.as_deref(), is_head).await
            }
        }
        Route::Page(template_path) => {
            if method == Method::POST {
                http::build_405_response()
            } else {
                let session = state.sessions.ensure(cookie_header.as_deref()).await;
                pages::serve(&state, &template_path, &session, is_head).await
            }
        }
        Route::ApiGet => {
            if method == Method::POST {
                http::build_405_response()
            } else {
                let session = state.sessions.ensure(cookie_header.as_deref()).await;
                let envelope = Envelope::from_query(query.as_deref().unwrap_or(""));
                serve_dispatch(&state, envelope, &session, &path)
            }
        }
        Route::ApiPost => {
            if method == Method::POST {
                let session = state.sessions.ensure(cookie_header.as_deref()).await;
                let envelope = read_json_envelope(req).await;
                serve_dispatch(&state, envelope, &session, &path)
            } else {
                http::build_405_response()
            }
        }
        Route::NotFound => http::build_404_response(),
    };

    Ok(finish(response, entry, &state))
}

/// Run the dispatcher and wrap the result as a JSON response
fn serve_dispatch(
    state: &Arc<AppState>,
    envelope: Result<Envelope, api::ApiError>,
    session: &crate::session::SessionHandle,
    path: &str,
) -> Response<Full<Bytes>> {
    let ctx = ApiContext {
        env: &state.env,
        session_id: &session.id,
    };
    let body = api::dispatch(&state.registry, envelope, &ctx, path);

    http::build_json_response(
        body.to_string(),
        &state.config.http,
        session.set_cookie.as_deref(),
    )
}

/// Collect the request body and parse the envelope from it
async fn read_json_envelope(req: Request<hyper::body::Incoming>) -> Result<Envelope, api::ApiError> {
    match req.collect().await {
        Ok(collected) => Envelope::from_json_slice(&collected.to_bytes()),
        Err(e) => Err(api::ApiError::InvalidEnvelope(format!(
            "failed to read body: {e}"
        ))),
    }
}

/// Check HTTP method and answer OPTIONS / reject unsupported methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD | Method::POST => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Complete the access log entry from the response and emit it
fn finish(
    response: Response<Full<Bytes>>,
    mut entry: AccessLogEntry,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn site() -> SiteConfig {
        SiteConfig {
            mount_prefix: "/bp".to_string(),
            template_dir: "templates".to_string(),
            template_ext: "htm".to_string(),
            static_prefix: "/static".to_string(),
            static_dir: "static".to_string(),
            env: HashMap::new(),
        }
    }

    #[test]
    fn test_root_redirects_to_index() {
        let site = site();
        assert_eq!(classify("/", &site), Route::RedirectToIndex);
        assert_eq!(classify("/bp", &site), Route::RedirectToIndex);
        assert_eq!(classify("/bp/", &site), Route::RedirectToIndex);
        assert_eq!(site.index_path(), "/bp/index");
    }

    #[test]
    fn test_dispatch_endpoints() {
        let site = site();
        assert_eq!(classify("/bp/get/read", &site), Route::ApiGet);
        assert_eq!(classify("/bp/post/read", &site), Route::ApiPost);
    }

    #[test]
    fn test_page_paths_resolve_templates() {
        let site = site();
        assert_eq!(
            classify("/bp/foo/bar", &site),
            Route::Page("foo/bar".to_string())
        );
        assert_eq!(classify("/bp/index", &site), Route::Page("index".to_string()));
    }

    #[test]
    fn test_static_and_favicon() {
        let site = site();
        assert_eq!(classify("/static/app.css", &site), Route::Static);
        assert_eq!(classify("/favicon.ico", &site), Route::Static);
        assert_eq!(classify("/favicon.svg", &site), Route::Static);
    }

    #[test]
    fn test_outside_prefix_is_not_found() {
        let site = site();
        assert_eq!(classify("/other", &site), Route::NotFound);
        assert_eq!(classify("/bpx/page", &site), Route::NotFound);
    }

    #[test]
    fn test_empty_prefix_serves_at_root() {
        let mut site = site();
        site.mount_prefix = String::new();
        assert_eq!(classify("/", &site), Route::RedirectToIndex);
        assert_eq!(site.index_path(), "/index");
        assert_eq!(
            classify("/foo/bar", &site),
            Route::Page("foo/bar".to_string())
        );
        assert_eq!(classify("/get/read", &site), Route::ApiGet);
    }
}
