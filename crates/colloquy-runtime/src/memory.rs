//! In-memory infrastructure implementations.
//!
//! Fixture-grade implementations of the core's seams, useful for embedding
//! hosts that keep everything client-side and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use colloquy_core::error::Result;
use colloquy_core::layout::LayoutPreferenceStore;
use colloquy_core::thread::{AgentDescriptor, AgentDirectory, SessionDirectory, SessionPage};
use colloquy_core::toolcall::Notifier;

/// Layout preference storage backed by a map.
#[derive(Default)]
pub struct MemoryLayoutStore {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LayoutPreferenceStore for MemoryLayoutStore {
    async fn load(&self, key: &str) -> Option<Vec<f64>> {
        self.values.read().await.get(key).cloned()
    }

    async fn save(&self, key: &str, sizes: &[f64]) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), sizes.to_vec());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// Agent directory serving a fixed list.
pub struct StaticAgentDirectory {
    agents: Vec<AgentDescriptor>,
}

impl StaticAgentDirectory {
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl AgentDirectory for StaticAgentDirectory {
    async fn fetch_agents(&self) -> anyhow::Result<Vec<AgentDescriptor>> {
        Ok(self.agents.clone())
    }
}

/// Session directory serving a mutable in-memory page, honoring the
/// workspace filter and page limit of the query contract.
#[derive(Default)]
pub struct StaticSessionDirectory {
    page: RwLock<SessionPage>,
}

impl StaticSessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the served page.
    pub async fn set_page(&self, page: SessionPage) {
        *self.page.write().await = page;
    }
}

#[async_trait]
impl SessionDirectory for StaticSessionDirectory {
    async fn fetch_sessions(
        &self,
        workspace_id: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<SessionPage> {
        let page = self.page.read().await;
        let sessions: Vec<_> = page
            .sessions
            .iter()
            .filter(|session| match workspace_id {
                Some(ws) => session.workspace_id.as_deref() == Some(ws),
                None => true,
            })
            .take(limit as usize)
            .cloned()
            .collect();
        let total = sessions.len() as u64;
        Ok(SessionPage { sessions, total })
    }
}

/// Notifier that reports through the tracing subscriber.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::warn!(notification = %message, "transient error notification");
    }
}
