//! Static file serving module
//!
//! Serves assets under the static prefix plus the favicon paths, with
//! traversal protection, MIME detection and ETag validation.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::config::AppState;
use crate::http::{self, cache, mime};
use crate::logger;

/// Serve a static asset request
pub async fn serve(
    state: &Arc<AppState>,
    path: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let site = &state.config.site;

    // Favicons live at the top of the static directory
    let relative = if path == "/favicon.ico" || path == "/favicon.svg" {
        path.trim_start_matches('/')
    } else {
        match path.strip_prefix(&format!("{}/", site.static_prefix)) {
            Some(rest) => rest,
            None => return http::build_404_response(),
        }
    };

    match load(&site.static_dir, relative).await {
        Some((content, content_type)) => {
            build_asset_response(&content, content_type, if_none_match, is_head)
        }
        None => http::build_404_response(),
    }
}

/// Load a file from the static directory, refusing paths that escape it
async fn load(static_dir: &str, relative: &str) -> Option<(Vec<u8>, &'static str)> {
    let clean = relative.trim_start_matches('/');
    if clean
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {relative}"));
        return None;
    }

    let file_path = Path::new(static_dir).join(clean);

    // Canonicalize both sides so symlinks cannot step outside either
    let dir_canonical = Path::new(static_dir).canonicalize().ok()?;
    let file_canonical = file_path.canonicalize().ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            file_canonical.display()
        ));
        return None;
    }

    let content = fs::read(&file_path).await.ok()?;
    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Build the asset response with ETag/304 handling
fn build_asset_response(
    data: &[u8],
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::response::build_cached_response(Bytes::from(data.to_owned()), content_type, &etag, is_head)
}
