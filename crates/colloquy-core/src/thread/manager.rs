//! Thread lifecycle management.
//!
//! `ThreadSessionManager` owns the set of active thread ids, the currently
//! visible thread, thread history, and the fallback agent selection. It is
//! the only mutator of [`ThreadRecord`]s. All state lives behind
//! `tokio::sync::RwLock`s so the manager can be shared across the pane set
//! and background refresh tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use super::directory::{AgentDirectory, SessionDirectory};
use super::id::new_thread_id;
use super::model::{AgentDescriptor, SessionAgent, SessionPage, ThreadRecord};
use crate::agent::{resolve_binding, AgentBinding, SelectedAgent, UNNAMED_AGENT_NAME};
use crate::error::{ColloquyError, Result};
use crate::layout::{LayoutPreferenceStore, LAYOUT_PREFERENCE_KEY};

/// Page size requested from the session directory.
pub const SESSION_PAGE_LIMIT: u32 = 20;

/// Fixed interval for background thread-list polling.
pub const REFRESH_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Delay before the post-create refresh, giving a backend that lazily
/// materializes the session record on first message time to catch up.
pub const NEW_THREAD_REFRESH_DELAY: Duration = Duration::from_millis(750);

/// Agent name that triggers auto-bootstrap when no thread is active.
pub const MAIN_AGENT_NAME: &str = "Main Agent";

/// Title given to a locally created thread until the directory reports one.
const NEW_THREAD_TITLE: &str = "New conversation";

/// Manages conversation threads and their lifecycle.
///
/// `ThreadSessionManager` is responsible for:
/// - Creating new threads (optionally workspace-scoped)
/// - Switching the visible thread without tearing down background ones
/// - Tracking thread history and per-session agent metadata
/// - Holding the fallback agent selection and resolving bindings
/// - Resetting everything on sign-out
pub struct ThreadSessionManager {
    /// Source of session/thread listings
    session_directory: Arc<dyn SessionDirectory>,
    /// Source of available agents
    agent_directory: Arc<dyn AgentDirectory>,
    /// Client-side layout preference storage, expired on reset
    layout_store: Arc<dyn LayoutPreferenceStore>,
    /// Workspace scope, passed in explicitly at construction
    workspace_id: RwLock<Option<String>>,
    /// Ordered set of mounted thread ids, append-only until reset
    active_thread_ids: RwLock<Vec<String>>,
    /// Currently visible thread; always a member of the active set
    current_thread_id: RwLock<Option<String>>,
    /// All known threads, for the history picker
    thread_history: RwLock<Vec<ThreadRecord>>,
    /// Agent metadata per known session id
    sessions_by_id: RwLock<HashMap<String, SessionAgent>>,
    /// Cached agent directory listing
    agents: RwLock<Vec<AgentDescriptor>>,
    /// Most recently selected agent (process-wide fallback)
    selected_agent: RwLock<Option<SelectedAgent>>,
}

impl ThreadSessionManager {
    /// Creates a manager scoped to an optional workspace.
    ///
    /// # Arguments
    ///
    /// * `session_directory` - Source of session listings
    /// * `agent_directory` - Source of enabled agents
    /// * `layout_store` - Layout preference storage, cleared on reset
    /// * `workspace_id` - Workspace scope, if any
    pub fn new(
        session_directory: Arc<dyn SessionDirectory>,
        agent_directory: Arc<dyn AgentDirectory>,
        layout_store: Arc<dyn LayoutPreferenceStore>,
        workspace_id: Option<String>,
    ) -> Self {
        Self {
            session_directory,
            agent_directory,
            layout_store,
            workspace_id: RwLock::new(workspace_id),
            active_thread_ids: RwLock::new(Vec::new()),
            current_thread_id: RwLock::new(None),
            thread_history: RwLock::new(Vec::new()),
            sessions_by_id: RwLock::new(HashMap::new()),
            agents: RwLock::new(Vec::new()),
            selected_agent: RwLock::new(None),
        }
    }

    /// Creates a new thread, makes it visible, and adds it to the active set.
    ///
    /// A short deferred refresh of the thread list is scheduled rather than
    /// an immediate one, since the backend may only materialize the session
    /// record once the first message arrives.
    pub async fn create_thread(self: &Arc<Self>) -> String {
        let workspace = self.workspace_id.read().await.clone();
        let thread_id = new_thread_id(workspace.as_deref());

        {
            let mut active = self.active_thread_ids.write().await;
            if !active.contains(&thread_id) {
                active.push(thread_id.clone());
            }
        }
        *self.current_thread_id.write().await = Some(thread_id.clone());

        let selected = self.selected_agent.read().await.clone();
        let record = ThreadRecord {
            id: thread_id.clone(),
            title: NEW_THREAD_TITLE.to_string(),
            agent_id: selected.as_ref().map(|a| a.id.clone()).unwrap_or_default(),
            agent_name: selected
                .and_then(|a| a.name)
                .unwrap_or_default(),
            last_activity: Utc::now().timestamp_millis(),
        };
        self.thread_history.write().await.insert(0, record);

        tracing::debug!(thread_id = %thread_id, "created thread");
        self.schedule_deferred_refresh();
        thread_id
    }

    /// Makes a thread visible, adding it to the active set if needed.
    ///
    /// When the thread's session metadata is known, its agent becomes the
    /// fallback selection (name defaulting when the metadata only carries an
    /// id). An immediate best-effort refresh keeps listing metadata fresh.
    pub async fn select_thread(&self, thread_id: &str) {
        {
            let mut active = self.active_thread_ids.write().await;
            if !active.iter().any(|id| id == thread_id) {
                active.push(thread_id.to_string());
            }
        }
        *self.current_thread_id.write().await = Some(thread_id.to_string());

        let meta = self.sessions_by_id.read().await.get(thread_id).cloned();
        if let Some(meta) = meta {
            if !meta.agent_id.is_empty() {
                let name = if meta.agent_name.is_empty() {
                    UNNAMED_AGENT_NAME.to_string()
                } else {
                    meta.agent_name.clone()
                };
                *self.selected_agent.write().await = Some(SelectedAgent {
                    id: meta.agent_id.clone(),
                    name: Some(name),
                });
            }
        }

        if let Err(err) = self.refresh_threads().await {
            tracing::warn!(%err, "thread refresh after selection failed");
        }
    }

    /// Installs an agent as the fallback selection and starts a fresh
    /// thread bound to it.
    ///
    /// Agent switches always start a new conversation; the agent identity of
    /// an existing thread is immutable.
    pub async fn select_agent(self: &Arc<Self>, agent_id: &str) -> String {
        let name = self
            .agents
            .read()
            .await
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.name.clone());
        *self.selected_agent.write().await = Some(SelectedAgent {
            id: agent_id.to_string(),
            name,
        });
        self.create_thread().await
    }

    /// Auto-bootstrap: with no active threads and a directory entry named
    /// exactly [`MAIN_AGENT_NAME`], selects it and starts a thread so the
    /// panel never shows nothing to interact with.
    ///
    /// Returns the new thread id when bootstrap ran.
    pub async fn ensure_bootstrap(self: &Arc<Self>) -> Option<String> {
        if !self.active_thread_ids.read().await.is_empty() {
            return None;
        }
        let main_agent = self
            .agents
            .read()
            .await
            .iter()
            .find(|agent| agent.name == MAIN_AGENT_NAME)
            .cloned()?;
        Some(self.select_agent(&main_agent.id).await)
    }

    /// Refreshes the cached agent listing.
    pub async fn refresh_agents(&self) -> Result<()> {
        let agents = self.agent_directory.fetch_agents().await?;
        *self.agents.write().await = agents;
        Ok(())
    }

    /// Fetches a session page and folds it into history and the session
    /// metadata map.
    pub async fn refresh_threads(&self) -> Result<()> {
        let workspace = self.workspace_id.read().await.clone();
        let page = self
            .session_directory
            .fetch_sessions(workspace.as_deref(), SESSION_PAGE_LIMIT)
            .await?;
        self.ingest_sessions(page).await;
        Ok(())
    }

    /// Folds a fetched session page into manager state.
    ///
    /// Directory records win over local provisional ones; local records the
    /// directory does not know yet survive (they are never destroyed during
    /// a session). History ends up ordered by recency.
    pub async fn ingest_sessions(&self, page: SessionPage) {
        let mut records: Vec<ThreadRecord> =
            page.sessions.iter().map(ThreadRecord::from).collect();

        {
            let mut sessions_by_id = self.sessions_by_id.write().await;
            for summary in &page.sessions {
                sessions_by_id.insert(summary.id.clone(), summary.agent());
            }
        }

        let mut history = self.thread_history.write().await;
        for existing in history.iter() {
            if !records.iter().any(|r| r.id == existing.id) {
                records.push(existing.clone());
            }
        }
        records.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        let count = records.len();
        *history = records;
        tracing::debug!(sessions = count, "ingested session page");
    }

    /// Changes the workspace scope and re-queries the agent directory.
    pub async fn set_workspace(&self, workspace_id: Option<String>) {
        *self.workspace_id.write().await = workspace_id;
        if let Err(err) = self.refresh_agents().await {
            tracing::warn!(%err, "agent refresh after workspace change failed");
        }
    }

    /// Renames a thread by updating its history record.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread is not in history.
    pub async fn rename_thread(&self, thread_id: &str, new_title: String) -> Result<()> {
        let mut history = self.thread_history.write().await;
        let record = history
            .iter_mut()
            .find(|record| record.id == thread_id)
            .ok_or_else(|| ColloquyError::not_found("thread", thread_id))?;
        record.title = new_title;
        record.last_activity = Utc::now().timestamp_millis();
        Ok(())
    }

    /// Bumps a thread's last-activity timestamp.
    pub async fn touch_thread(&self, thread_id: &str) {
        let mut history = self.thread_history.write().await;
        if let Some(record) = history.iter_mut().find(|record| record.id == thread_id) {
            record.last_activity = Utc::now().timestamp_millis();
        }
    }

    /// Resolves the agent identity for a thread (session metadata, then the
    /// fallback selection, then the placeholder).
    pub async fn binding_for(&self, thread_id: &str) -> AgentBinding {
        let meta = self.sessions_by_id.read().await.get(thread_id).cloned();
        let fallback = self.selected_agent.read().await.clone();
        resolve_binding(meta.as_ref(), fallback.as_ref())
    }

    /// Sign-out reset: clears the active set, history, visible pointer,
    /// session metadata, and the fallback selection, and expires the
    /// persisted layout preference.
    pub async fn reset(&self) {
        self.active_thread_ids.write().await.clear();
        *self.current_thread_id.write().await = None;
        self.thread_history.write().await.clear();
        self.sessions_by_id.write().await.clear();
        *self.selected_agent.write().await = None;
        if let Err(err) = self.layout_store.clear(LAYOUT_PREFERENCE_KEY).await {
            tracing::warn!(%err, "failed to expire layout preference on reset");
        }
    }

    /// Ordered ids of all mounted threads.
    pub async fn active_thread_ids(&self) -> Vec<String> {
        self.active_thread_ids.read().await.clone()
    }

    /// Id of the currently visible thread, if any.
    pub async fn current_thread_id(&self) -> Option<String> {
        self.current_thread_id.read().await.clone()
    }

    /// Snapshot of thread history, most recent first.
    pub async fn thread_history(&self) -> Vec<ThreadRecord> {
        self.thread_history.read().await.clone()
    }

    /// Snapshot of the cached agent listing.
    pub async fn agents(&self) -> Vec<AgentDescriptor> {
        self.agents.read().await.clone()
    }

    /// The current fallback agent selection, if any.
    pub async fn selected_agent(&self) -> Option<SelectedAgent> {
        self.selected_agent.read().await.clone()
    }

    /// Current workspace scope.
    pub async fn workspace_id(&self) -> Option<String> {
        self.workspace_id.read().await.clone()
    }

    fn schedule_deferred_refresh(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(NEW_THREAD_REFRESH_DELAY).await;
            if let Err(err) = manager.refresh_threads().await {
                tracing::warn!(%err, "deferred thread refresh failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DEFAULT_PANEL_LAYOUT;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockSessionDirectory {
        page: Mutex<SessionPage>,
    }

    impl MockSessionDirectory {
        fn new() -> Self {
            Self {
                page: Mutex::new(SessionPage::default()),
            }
        }

        fn with_page(page: SessionPage) -> Self {
            Self {
                page: Mutex::new(page),
            }
        }
    }

    #[async_trait]
    impl SessionDirectory for MockSessionDirectory {
        async fn fetch_sessions(
            &self,
            _workspace_id: Option<&str>,
            _limit: u32,
        ) -> anyhow::Result<SessionPage> {
            Ok(self.page.lock().unwrap().clone())
        }
    }

    struct MockAgentDirectory {
        agents: Vec<AgentDescriptor>,
    }

    #[async_trait]
    impl AgentDirectory for MockAgentDirectory {
        async fn fetch_agents(&self) -> anyhow::Result<Vec<AgentDescriptor>> {
            Ok(self.agents.clone())
        }
    }

    #[derive(Default)]
    struct MockLayoutStore {
        values: Mutex<HashMap<String, Vec<f64>>>,
    }

    #[async_trait]
    impl LayoutPreferenceStore for MockLayoutStore {
        async fn load(&self, key: &str) -> Option<Vec<f64>> {
            self.values.lock().unwrap().get(key).cloned()
        }

        async fn save(&self, key: &str, sizes: &[f64]) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), sizes.to_vec());
            Ok(())
        }

        async fn clear(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn agent(id: &str, name: &str) -> AgentDescriptor {
        AgentDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            base_url: None,
            port: None,
        }
    }

    fn manager_with(
        agents: Vec<AgentDescriptor>,
        workspace: Option<&str>,
    ) -> (Arc<ThreadSessionManager>, Arc<MockLayoutStore>) {
        let layout = Arc::new(MockLayoutStore::default());
        let manager = Arc::new(ThreadSessionManager::new(
            Arc::new(MockSessionDirectory::new()),
            Arc::new(MockAgentDirectory { agents }),
            layout.clone(),
            workspace.map(str::to_string),
        ));
        (manager, layout)
    }

    #[tokio::test]
    async fn test_create_thread_scoped_id_and_visibility() {
        let (manager, _) = manager_with(Vec::new(), Some("acme"));
        let id = manager.create_thread().await;

        assert!(id.starts_with("ws:acme:"));
        assert_eq!(manager.current_thread_id().await, Some(id.clone()));
        assert_eq!(manager.active_thread_ids().await, vec![id.clone()]);

        let history = manager.thread_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
    }

    #[tokio::test]
    async fn test_visible_thread_is_always_active() {
        let (manager, _) = manager_with(Vec::new(), None);
        manager.create_thread().await;
        manager.select_thread("some-older-thread").await;

        let current = manager.current_thread_id().await.unwrap();
        assert!(manager.active_thread_ids().await.contains(&current));
        // The first thread stays mounted
        assert_eq!(manager.active_thread_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn test_select_thread_adopts_known_agent_metadata() {
        let (manager, _) = manager_with(Vec::new(), None);
        let page: SessionPage = serde_json::from_value(json!({
            "sessions": [
                {"id": "s-1", "title": "Pipeline", "agentId": "a-9", "agentName": ""},
            ],
            "total": 1,
        }))
        .unwrap();
        manager.ingest_sessions(page).await;

        manager.select_thread("s-1").await;
        let selected = manager.selected_agent().await.unwrap();
        assert_eq!(selected.id, "a-9");
        assert_eq!(selected.name.as_deref(), Some(UNNAMED_AGENT_NAME));
    }

    #[tokio::test]
    async fn test_select_thread_unknown_id_keeps_fallback() {
        let (manager, _) = manager_with(vec![agent("a-1", "Main Agent")], None);
        manager.refresh_agents().await.unwrap();
        manager.select_agent("a-1").await;

        manager.select_thread("never-seen").await;
        assert_eq!(manager.selected_agent().await.unwrap().id, "a-1");
    }

    #[tokio::test]
    async fn test_select_agent_starts_fresh_thread() {
        let (manager, _) = manager_with(vec![agent("a-2", "Support Agent")], None);
        manager.refresh_agents().await.unwrap();

        let first = manager.create_thread().await;
        let second = manager.select_agent("a-2").await;
        assert_ne!(first, second);
        assert_eq!(manager.current_thread_id().await, Some(second));

        let binding = manager.binding_for("anything").await;
        assert_eq!(binding.agent_id.as_deref(), Some("a-2"));
        assert_eq!(binding.agent_name, "Support Agent");
    }

    #[tokio::test]
    async fn test_auto_bootstrap_selects_main_agent() {
        let (manager, _) = manager_with(
            vec![agent("a0", "Helper"), agent("a1", "Main Agent")],
            None,
        );
        manager.refresh_agents().await.unwrap();

        let thread_id = manager.ensure_bootstrap().await.expect("bootstrap ran");
        assert_eq!(manager.active_thread_ids().await, vec![thread_id.clone()]);
        let binding = manager.binding_for(&thread_id).await;
        assert_eq!(binding.agent_id.as_deref(), Some("a1"));

        // With an active thread, bootstrap is a no-op
        assert!(manager.ensure_bootstrap().await.is_none());
        assert_eq!(manager.active_thread_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_requires_main_agent() {
        let (manager, _) = manager_with(vec![agent("a0", "Helper")], None);
        manager.refresh_agents().await.unwrap();
        assert!(manager.ensure_bootstrap().await.is_none());
        assert!(manager.active_thread_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_normalizes_timestamps_and_keeps_local_threads() {
        let layout = Arc::new(MockLayoutStore::default());
        let page: SessionPage = serde_json::from_value(json!({
            "sessions": [
                {"id": "s-old", "title": "Old", "updatedAt": 1_700_000_000},
            ],
            "total": 1,
        }))
        .unwrap();
        let manager = Arc::new(ThreadSessionManager::new(
            Arc::new(MockSessionDirectory::with_page(page)),
            Arc::new(MockAgentDirectory { agents: Vec::new() }),
            layout,
            None,
        ));

        let local = manager.create_thread().await;
        manager.refresh_threads().await.unwrap();

        let history = manager.thread_history().await;
        assert_eq!(history.len(), 2);
        // Local provisional thread is newer, so it sorts first and survives
        assert_eq!(history[0].id, local);
        assert_eq!(history[1].last_activity, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_rename_and_touch() {
        let (manager, _) = manager_with(Vec::new(), None);
        let id = manager.create_thread().await;

        manager
            .rename_thread(&id, "Renamed".to_string())
            .await
            .unwrap();
        assert_eq!(manager.thread_history().await[0].title, "Renamed");

        let err = manager
            .rename_thread("missing", "X".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        manager.touch_thread(&id).await;
        assert!(manager.thread_history().await[0].last_activity > 0);
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_layout_preference() {
        let (manager, layout) = manager_with(vec![agent("a1", "Main Agent")], None);
        manager.refresh_agents().await.unwrap();
        manager.ensure_bootstrap().await;
        layout
            .save(LAYOUT_PREFERENCE_KEY, &[60.0, 40.0])
            .await
            .unwrap();

        manager.reset().await;

        assert!(manager.active_thread_ids().await.is_empty());
        assert_eq!(manager.current_thread_id().await, None);
        assert!(manager.thread_history().await.is_empty());
        assert!(manager.selected_agent().await.is_none());
        assert!(layout.load(LAYOUT_PREFERENCE_KEY).await.is_none());
        assert_eq!(
            crate::layout::saved_or_default(layout.load(LAYOUT_PREFERENCE_KEY).await),
            DEFAULT_PANEL_LAYOUT
        );
    }
}
