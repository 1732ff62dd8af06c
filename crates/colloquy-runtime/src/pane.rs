//! Conversation pane set.
//!
//! Keeps one conversation runtime mounted per active thread. Only one pane
//! is visible at a time, but background panes keep receiving events, so
//! partial streaming and in-flight tool calls survive thread switches.

use std::collections::HashMap;
use std::sync::Arc;

use colloquy_core::routing::AuthContext;
use colloquy_core::thread::ThreadSessionManager;
use colloquy_core::toolcall::Notifier;

use crate::stream::{ConversationRuntime, MessageTransport, StreamEvent};

/// One pane per active thread, all mounted, one visible.
pub struct ConversationPaneSet {
    manager: Arc<ThreadSessionManager>,
    transport: Arc<dyn MessageTransport>,
    notifier: Arc<dyn Notifier>,
    auth: AuthContext,
    panes: HashMap<String, ConversationRuntime>,
}

impl ConversationPaneSet {
    pub fn new(
        manager: Arc<ThreadSessionManager>,
        transport: Arc<dyn MessageTransport>,
        notifier: Arc<dyn Notifier>,
        auth: AuthContext,
    ) -> Self {
        Self {
            manager,
            transport,
            notifier,
            auth,
            panes: HashMap::new(),
        }
    }

    /// Brings the pane set in line with the manager's active thread set.
    ///
    /// New active threads get a runtime; existing runtimes adopt the latest
    /// agent binding (session metadata may have arrived since creation).
    /// Panes are never dropped here; the active set is append-only until
    /// reset.
    pub async fn sync(&mut self) {
        let workspace_id = self.manager.workspace_id().await;
        for thread_id in self.manager.active_thread_ids().await {
            let binding = self.manager.binding_for(&thread_id).await;
            match self.panes.get_mut(&thread_id) {
                Some(pane) => pane.set_binding(binding),
                None => {
                    let pane = ConversationRuntime::new(
                        thread_id.clone(),
                        binding,
                        self.auth.clone(),
                        workspace_id.clone(),
                        Arc::clone(&self.transport),
                        Arc::clone(&self.notifier),
                    );
                    self.panes.insert(thread_id, pane);
                }
            }
        }
    }

    /// Routes a stream event to its thread's pane, visible or not.
    pub fn apply(&mut self, thread_id: &str, event: StreamEvent) {
        match self.panes.get_mut(thread_id) {
            Some(pane) => pane.apply(event),
            None => {
                tracing::debug!(thread_id = %thread_id, "event for unmounted thread dropped");
            }
        }
    }

    /// The currently visible pane, if any.
    pub async fn visible(&self) -> Option<&ConversationRuntime> {
        let current = self.manager.current_thread_id().await?;
        self.panes.get(&current)
    }

    /// Mutable access to the currently visible pane.
    pub async fn visible_mut(&mut self) -> Option<&mut ConversationRuntime> {
        let current = self.manager.current_thread_id().await?;
        self.panes.get_mut(&current)
    }

    pub fn pane(&self, thread_id: &str) -> Option<&ConversationRuntime> {
        self.panes.get(thread_id)
    }

    pub fn pane_mut(&mut self, thread_id: &str) -> Option<&mut ConversationRuntime> {
        self.panes.get_mut(thread_id)
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Tears down every pane. Called alongside the manager's sign-out reset.
    pub fn reset(&mut self) {
        self.panes.clear();
    }
}
