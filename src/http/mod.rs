//! HTTP protocol layer module
//!
//! Response builders, MIME detection and cache validation helpers,
//! decoupled from page and dispatch business logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_html_response, build_json_response, build_options_response, build_redirect_response,
};
