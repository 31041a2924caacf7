use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use trails_core::VisitorSession;

pub trait SessionRepository: Send + Sync {
    async fn load_session(&self, session_id: &str) -> Result<Option<VisitorSession>>;
    async fn upsert_session(&self, session: &VisitorSession) -> Result<()>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
    async fn session_count(&self) -> Result<usize>;
}

/// Process-local session store. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, VisitorSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON dump of every live session, for debugging from the CLI.
    pub fn export_json(&self) -> Result<String> {
        let sessions = self.sessions.read();
        let mut ordered = sessions.values().collect::<Vec<_>>();
        ordered.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        serde_json::to_string_pretty(&ordered).context("failed serializing sessions")
    }
}

impl SessionRepository for MemoryStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<VisitorSession>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn upsert_session(&self, session: &VisitorSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0_u64;
        self.sessions.write().retain(|_, value| {
            let keep = !value.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }

    async fn session_count(&self) -> Result<usize> {
        Ok(self.sessions.read().len())
    }
}
