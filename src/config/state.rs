// Application state module
// Read-only process-wide state assembled once at startup

use std::collections::HashMap;
use std::sync::Arc;

use super::types::Config;
use crate::api::MethodRegistry;
use crate::session::SessionStore;

/// Application state
///
/// Everything in here is frozen before the first request is accepted;
/// handlers share it behind an `Arc` and never mutate it.
pub struct AppState {
    pub config: Config,
    /// Site-wide template variables (the `[site.env]` table)
    pub env: Arc<HashMap<String, String>>,
    /// Dispatch method registry
    pub registry: MethodRegistry,
    /// Filesystem session store
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let env = Arc::new(config.site.env.clone());
        let sessions = SessionStore::new(&config.session);

        Self {
            config,
            env,
            registry: MethodRegistry::builtin(),
            sessions,
        }
    }
}
