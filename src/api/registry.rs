// Method registry module
// Explicit name -> handler mapping, built once at startup

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::handlers;

/// Read-only context passed to every dispatch handler
pub struct ApiContext<'a> {
    /// Site-wide env map, frozen at startup
    pub env: &'a HashMap<String, String>,
    /// Session id of the calling request
    pub session_id: &'a str,
}

/// A dispatch handler: takes the envelope's `data`, returns the response body
pub type ApiHandler = fn(&ApiContext, Value) -> Result<Value, ApiError>;

/// Classified dispatch failure
///
/// The Display form is what clients see; it is deliberately short and never
/// carries internals. Full detail goes to the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No handler registered under the requested method name
    UnknownMethod(String),
    /// The request envelope could not be parsed
    InvalidEnvelope(String),
    /// The handler itself failed
    Handler(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod(name) => write!(f, "unknown method: {name}"),
            Self::InvalidEnvelope(reason) => write!(f, "invalid envelope: {reason}"),
            Self::Handler(reason) => write!(f, "handler failed: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Registry of dispatch methods
///
/// Replaces lookup-by-naming-convention with an explicit map: every callable
/// method is registered here by name, so the full method surface is visible
/// in one place and a bad method string can only ever produce
/// `ApiError::UnknownMethod`.
pub struct MethodRegistry {
    handlers: HashMap<&'static str, ApiHandler>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the built-in method set
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("echo", handlers::echo);
        registry.register("ping", handlers::ping);
        registry.register("env", handlers::env);
        registry.register("session", handlers::session);
        registry
    }

    pub fn register(&mut self, name: &'static str, handler: ApiHandler) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<ApiHandler> {
        self.handlers.get(name).copied()
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_methods_registered() {
        let registry = MethodRegistry::builtin();
        assert_eq!(registry.names(), vec!["echo", "env", "ping", "session"]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("post_echo").is_none());
    }

    #[test]
    fn test_error_display_is_bounded() {
        let err = ApiError::UnknownMethod("missing".to_string());
        assert_eq!(err.to_string(), "unknown method: missing");
        let err = ApiError::Handler("boom".to_string());
        assert_eq!(err.to_string(), "handler failed: boom");
    }
}
