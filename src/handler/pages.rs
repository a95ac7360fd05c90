//! Template page serving module
//!
//! Renders the template named by the URL path with the site env map.
//! Page requests carry the session cookie; a missing template file is a 404.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::session::SessionHandle;
use crate::template;

/// Serve a template page for the resolved template path
pub async fn serve(
    state: &Arc<AppState>,
    template_path: &str,
    session: &SessionHandle,
    is_head: bool,
) -> Response<Full<Bytes>> {
    // Pages render with an empty per-request data object; only the
    // dispatcher ever carries request data.
    let data = Value::Object(serde_json::Map::new());

    match template::render(&state.config.site, template_path, &state.env, &data).await {
        Some(html) => http::build_html_response(
            html,
            &state.config.http,
            session.set_cookie.as_deref(),
            is_head,
        ),
        None => {
            logger::log_debug(&format!("Template not found: {template_path}"));
            http::build_404_response()
        }
    }
}
