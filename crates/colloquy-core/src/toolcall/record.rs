//! Tool-call record and lifecycle status.
//!
//! A tool call is a discrete, named action request surfaced by the
//! conversation stream. Its status only ever moves forward
//! (`Pending < Executing < Complete`) and its result is written exactly once
//! at the complete transition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a tool call.
///
/// The derived ordering is the lifecycle ordering; transitions never regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// The call has been announced but no UI is surfaced yet.
    Pending,
    /// The call is surfaced and, for interactive tools, awaiting user action.
    Executing,
    /// Terminal: a result is available.
    Complete,
}

impl ToolCallStatus {
    /// Short status line shown next to the tool name.
    pub fn status_text(&self) -> &'static str {
        match self {
            ToolCallStatus::Pending => "Preparing...",
            ToolCallStatus::Executing => "Running...",
            ToolCallStatus::Complete => "Complete",
        }
    }
}

/// A single tool invocation as tracked by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Identifier assigned by the stream, echoed back in the response.
    pub id: String,
    /// Tool name as announced by the agent.
    pub name: String,
    /// Loosely-structured arguments, possibly partial while streaming.
    pub arguments: Map<String, Value>,
    /// Current lifecycle status.
    pub status: ToolCallStatus,
    /// Result value, set exactly once at the complete transition.
    pub result: Option<Value>,
    /// Whether a response has already been accepted for this call.
    ///
    /// This flag is the source of truth for the at-most-once response
    /// guarantee; disabling controls in a renderer is a courtesy only.
    pub responded: bool,
}

impl ToolCallRecord {
    /// Creates a pending record for a newly announced tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            status: ToolCallStatus::Pending,
            result: None,
            responded: false,
        }
    }

    /// Replaces the argument map, e.g. when a fuller argument fragment
    /// arrives while the call is still pending.
    pub fn update_arguments(&mut self, arguments: Map<String, Value>) {
        if self.status < ToolCallStatus::Complete {
            self.arguments = arguments;
        }
    }

    /// Marks the call in progress. A no-op unless the call is pending.
    pub fn begin_executing(&mut self) {
        if self.status == ToolCallStatus::Pending {
            self.status = ToolCallStatus::Executing;
        }
    }

    /// Completes the call with a result.
    ///
    /// The first completion wins: a completed record keeps its status and
    /// result no matter what arrives afterwards.
    pub fn complete_with(&mut self, result: Value) {
        if self.status == ToolCallStatus::Complete {
            return;
        }
        self.status = ToolCallStatus::Complete;
        self.result = Some(result);
    }

    /// Whether the call has reached its terminal state.
    pub fn is_complete(&self) -> bool {
        self.status == ToolCallStatus::Complete
    }
}
