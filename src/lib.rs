//! Backend scaffold: server-rendered template pages keyed by URL path,
//! plus one generic JSON endpoint dispatching on a client-supplied method
//! name through an explicit registry.

pub mod api;
pub mod cli;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod session;
pub mod template;
