// Session file store
// One JSON file per session under the configured directory

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use super::{build_cookie, parse_cookie, SessionHandle};
use crate::config::SessionConfig;
use crate::logger;

/// On-disk session record
///
/// The application reads no fields from it; created/last-seen drive expiry
/// and pruning, `data` is reserved for handler state.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Filesystem session store
pub struct SessionStore {
    dir: PathBuf,
    cookie_name: String,
    lifetime_days: u64,
    file_threshold: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            cookie_name: config.cookie_name.clone(),
            lifetime_days: config.lifetime_days,
            file_threshold: config.file_threshold,
        }
    }

    /// Create the session directory, called once at startup
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Resolve the session for a request
    ///
    /// A valid unexpired cookie keeps its session (touched on disk); anything
    /// else gets a fresh session and a Set-Cookie value to send back.
    pub async fn ensure(&self, cookie_header: Option<&str>) -> SessionHandle {
        if let Some(id) = parse_cookie(cookie_header, &self.cookie_name) {
            if is_valid_session_id(&id) && self.touch(&id).await {
                return SessionHandle {
                    id,
                    set_cookie: None,
                };
            }
        }

        self.create().await
    }

    /// Refresh an existing session's last-seen time
    ///
    /// Returns false when the session is unknown or expired; expired files
    /// are removed on the way out.
    async fn touch(&self, id: &str) -> bool {
        let path = self.session_path(id);
        let Ok(text) = fs::read_to_string(&path).await else {
            return false;
        };
        let Ok(mut record) = serde_json::from_str::<SessionRecord>(&text) else {
            // Unreadable session file, replace it with a fresh session
            let _ = fs::remove_file(&path).await;
            return false;
        };

        if self.is_expired(&record) {
            let _ = fs::remove_file(&path).await;
            return false;
        }

        record.last_seen = Utc::now();
        self.write_record(&path, &record).await
    }

    /// Mint a new session with an empty record
    async fn create(&self) -> SessionHandle {
        let id = Uuid::new_v4().to_string();
        let record = SessionRecord {
            created_at: Utc::now(),
            last_seen: Utc::now(),
            data: serde_json::Value::Object(serde_json::Map::new()),
        };

        let path = self.session_path(&id);
        if self.write_record(&path, &record).await {
            self.prune_over_threshold();
        }

        SessionHandle {
            set_cookie: Some(build_cookie(&self.cookie_name, &id, self.lifetime_days)),
            id,
        }
    }

    async fn write_record(&self, path: &Path, record: &SessionRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(j) => j,
            Err(e) => {
                logger::log_error(&format!("Failed to serialize session record: {e}"));
                return false;
            }
        };
        match fs::write(path, json).await {
            Ok(()) => true,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to write session file {}: {e}",
                    path.display()
                ));
                false
            }
        }
    }

    fn is_expired(&self, record: &SessionRecord) -> bool {
        let lifetime = Duration::days(i64::try_from(self.lifetime_days).unwrap_or(i64::MAX));
        Utc::now() - record.last_seen > lifetime
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Drop the oldest session files once the store exceeds the threshold
    fn prune_over_threshold(&self) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };

        let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((modified, e.path()))
            })
            .collect();

        if files.len() <= self.file_threshold {
            return;
        }

        files.sort_by_key(|(modified, _)| *modified);
        let excess = files.len() - self.file_threshold;
        for (_, path) in files.into_iter().take(excess) {
            if let Err(e) = std::fs::remove_file(&path) {
                logger::log_warning(&format!(
                    "Failed to prune session file {}: {e}",
                    path.display()
                ));
            }
        }
    }
}

/// Session ids are UUIDs; anything else is rejected before it can reach
/// the filesystem.
fn is_valid_session_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, threshold: usize) -> SessionStore {
        SessionStore::new(&SessionConfig {
            dir: dir.to_string_lossy().into_owned(),
            cookie_name: "session_id".to_string(),
            lifetime_days: 31,
            file_threshold: threshold,
        })
    }

    #[tokio::test]
    async fn test_new_session_sets_cookie() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), 500);

        let handle = store.ensure(None).await;
        assert!(handle.set_cookie.is_some());
        assert!(is_valid_session_id(&handle.id));
        assert!(dir.path().join(format!("{}.json", handle.id)).exists());
    }

    #[tokio::test]
    async fn test_existing_session_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), 500);

        let first = store.ensure(None).await;
        let header = format!("session_id={}", first.id);
        let second = store.ensure(Some(&header)).await;

        assert_eq!(second.id, first.id);
        assert!(second.set_cookie.is_none());
    }

    #[tokio::test]
    async fn test_invalid_cookie_gets_fresh_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), 500);

        let handle = store.ensure(Some("session_id=../../etc/passwd")).await;
        assert!(handle.set_cookie.is_some());
        assert!(is_valid_session_id(&handle.id));
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), 500);

        let first = store.ensure(None).await;
        let path = dir.path().join(format!("{}.json", first.id));
        let stale = SessionRecord {
            created_at: Utc::now() - Duration::days(60),
            last_seen: Utc::now() - Duration::days(40),
            data: serde_json::Value::Object(serde_json::Map::new()),
        };
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        let header = format!("session_id={}", first.id);
        let second = store.ensure(Some(&header)).await;
        assert_ne!(second.id, first.id);
        assert!(second.set_cookie.is_some());
    }

    #[tokio::test]
    async fn test_threshold_prunes_oldest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path(), 3);

        for _ in 0..6 {
            store.ensure(None).await;
        }

        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert!(count <= 4, "expected pruning, found {count} files");
    }
}
