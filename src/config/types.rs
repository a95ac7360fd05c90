// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Site configuration - template pages and static assets
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Path prefix under which template pages and dispatch endpoints live
    pub mount_prefix: String,
    /// Directory holding template files
    pub template_dir: String,
    /// Template file extension (without dot)
    pub template_ext: String,
    /// Path prefix for static assets
    pub static_prefix: String,
    /// Directory holding static assets
    pub static_dir: String,
    /// Site-wide template variables, frozen at startup
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Session store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Directory for session files
    pub dir: String,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Session lifetime in days
    pub lifetime_days: u64,
    /// Prune oldest session files once the store exceeds this count
    pub file_threshold: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub default_content_type: String,
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

impl SiteConfig {
    /// Mount prefix with any trailing slash removed, e.g. "/bp"
    pub fn prefix(&self) -> &str {
        self.mount_prefix.trim_end_matches('/')
    }

    /// Absolute path of the index page under the mount prefix
    pub fn index_path(&self) -> String {
        format!("{}/index", self.prefix())
    }
}
