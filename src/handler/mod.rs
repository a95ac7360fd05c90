//! Request handler module
//!
//! Routes incoming requests to template pages, static assets, or the
//! generic dispatch endpoints.

pub mod pages;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
