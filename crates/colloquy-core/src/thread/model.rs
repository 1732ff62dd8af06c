//! Thread domain models and session query DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::time::to_epoch_millis;

/// One conversation thread as listed in history.
///
/// Records are created when a thread is started or when a prior session is
/// learned from the session directory, and are mutated only by the session
/// manager (rename, activity touch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    /// Opaque unique identifier, optionally workspace-scoped.
    pub id: String,
    /// Human-readable thread title.
    pub title: String,
    /// Owning agent id ("" when unknown).
    pub agent_id: String,
    /// Owning agent display name ("" when unknown).
    pub agent_name: String,
    /// Last-activity timestamp (epoch milliseconds).
    pub last_activity: i64,
}

/// Agent metadata recorded for a known session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAgent {
    pub agent_id: String,
    pub agent_name: String,
}

/// One session as returned by the session directory query.
///
/// Wire field names are camelCase; timestamps arrive in whatever shape the
/// backend produces (ISO strings, second-epoch or millisecond-epoch numbers)
/// and are normalized by [`to_epoch_millis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub created_at: Value,
    #[serde(default)]
    pub updated_at: Value,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

impl SessionSummary {
    /// Last-activity timestamp in epoch milliseconds, preferring the update
    /// timestamp over the creation one.
    pub fn last_activity_ms(&self) -> i64 {
        let preferred = if timestamp_present(&self.updated_at) {
            &self.updated_at
        } else {
            &self.created_at
        };
        to_epoch_millis(preferred)
    }

    /// Agent metadata for the session map ("" for unknown fields).
    pub fn agent(&self) -> SessionAgent {
        SessionAgent {
            agent_id: self.agent_id.clone().unwrap_or_default(),
            agent_name: self.agent_name.clone().unwrap_or_default(),
        }
    }
}

fn timestamp_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

impl From<&SessionSummary> for ThreadRecord {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            agent_id: summary.agent_id.clone().unwrap_or_default(),
            agent_name: summary.agent_name.clone().unwrap_or_default(),
            last_activity: summary.last_activity_ms(),
        }
    }
}

/// One page of sessions from the session directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionPage {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub total: u64,
}

/// An agent as listed by the agent directory (enabled agents only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}
