//! Agent identity resolution for conversation threads.
//!
//! A thread always needs a non-empty agent identity to attach to outbound
//! messages, even before its backing session has been fetched. Resolution
//! walks three tiers: explicit session metadata, the most recently selected
//! agent, then a generic placeholder.

use serde::{Deserialize, Serialize};

use crate::thread::SessionAgent;

/// Placeholder display name used when no agent identity is known.
pub const DEFAULT_AGENT_NAME: &str = "AI Assistant";

/// Display name used when session metadata carries an agent id but no name.
pub const UNNAMED_AGENT_NAME: &str = "Agent";

/// The process-wide fallback selection: the agent the user last picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAgent {
    pub id: String,
    /// Display name, when the directory knew one at selection time.
    pub name: Option<String>,
}

/// The agent identity a conversation pane attaches to its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBinding {
    /// Resolved agent id; `None` when every tier was blank.
    pub agent_id: Option<String>,
    /// Resolved display name; never empty.
    pub agent_name: String,
}

/// Resolves the binding for a thread.
///
/// Session metadata is authoritative once known; otherwise the fallback
/// selection applies; otherwise the placeholder identity. Ids are trimmed
/// and dropped entirely when blank so transports can omit the agent header.
pub fn resolve_binding(
    session_meta: Option<&SessionAgent>,
    fallback: Option<&SelectedAgent>,
) -> AgentBinding {
    let raw_id = session_meta
        .map(|meta| meta.agent_id.as_str())
        .filter(|id| !id.is_empty())
        .or_else(|| fallback.map(|agent| agent.id.as_str()))
        .unwrap_or_default()
        .trim()
        .to_string();

    let agent_name = session_meta
        .map(|meta| meta.agent_name.as_str())
        .filter(|name| !name.is_empty())
        .or_else(|| fallback.and_then(|agent| agent.name.as_deref()))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_AGENT_NAME)
        .to_string();

    AgentBinding {
        agent_id: if raw_id.is_empty() { None } else { Some(raw_id) },
        agent_name,
    }
}
