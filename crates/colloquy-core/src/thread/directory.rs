//! Directory query traits.
//!
//! Defines the interfaces to the external session and agent listings,
//! decoupling the session manager from the query transport (GraphQL, REST,
//! in-process fixtures). Refreshes through these traits are best-effort:
//! a failure is reported and retried on the next poll, never surfaced as a
//! blocking error to the interactive flow.

use anyhow::Result;
use async_trait::async_trait;

use super::model::{AgentDescriptor, SessionPage};

/// An abstract source of session/thread listings.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Fetches one page of sessions, optionally scoped to a workspace.
    ///
    /// # Arguments
    ///
    /// * `workspace_id` - Workspace to scope the listing to, if any
    /// * `limit` - Maximum number of sessions to return
    ///
    /// # Returns
    ///
    /// - `Ok(SessionPage)`: the listing, possibly empty
    /// - `Err(_)`: transport or backend failure
    async fn fetch_sessions(&self, workspace_id: Option<&str>, limit: u32) -> Result<SessionPage>;
}

/// An abstract source of available agents.
///
/// Implementations return enabled agents only and are re-queried when the
/// workspace changes.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Fetches the list of enabled agents.
    async fn fetch_agents(&self) -> Result<Vec<AgentDescriptor>>;
}
