use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Operator-assigned nicknames for known buyers, keyed by stable uid.
///
/// An injected service with an explicit lifecycle: construct per session,
/// feed it snapshots from the backing store, tear down with the session.
#[derive(Default)]
pub struct NicknameCache {
    nicknames: RwLock<HashMap<String, String>>,
}

impl NicknameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with a fresh snapshot from storage.
    pub async fn apply_snapshot(&self, snapshot: HashMap<String, String>) {
        info!(count = snapshot.len(), "nickname cache updated");
        let mut nicknames = self.nicknames.write().await;
        *nicknames = snapshot;
    }

    pub async fn set(&self, uid: impl Into<String>, nick: impl Into<String>) {
        let mut nicknames = self.nicknames.write().await;
        nicknames.insert(uid.into(), nick.into());
    }

    /// The display name for a speaker: their nickname if one is saved,
    /// otherwise the real name they arrived with.
    pub async fn resolve(&self, uid: &str, real_name: &str) -> String {
        let nicknames = self.nicknames.read().await;
        nicknames
            .get(uid)
            .cloned()
            .unwrap_or_else(|| real_name.to_string())
    }
}
