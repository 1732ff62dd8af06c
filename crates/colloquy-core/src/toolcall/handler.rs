//! Closed registry mapping tool names to handler behaviors.
//!
//! Every tool the overlay knows how to render has a named variant; anything
//! else routes through [`ToolHandler::Generic`]. Because resolution is a
//! closed match, a tool with a dedicated handler can never also fall through
//! to the generic renderer.

use serde::{Deserialize, Serialize};

/// Behavior category of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// No UI at all; the call maps to a host-side effect.
    Silent,
    /// Informational display, completed purely from upstream status.
    Display,
    /// Explicit confirm/cancel gate before the action proceeds.
    Confirmation,
    /// Pick-one-of-N choice prompt.
    Selection,
    /// Multi-field structured input form.
    Form,
    /// Minimal badge plus raw parameter/result dump.
    Generic,
}

/// The handler bound to a tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolHandler {
    /// `prompt_user_selection`: choose one option.
    PromptSelection,
    /// `prompt_user_input`: fill a structured form.
    PromptInput,
    /// `send_bulk_email`: review and approve an outgoing bulk email.
    SendBulkEmail,
    /// `delete_contact`: confirm an irreversible deletion.
    DeleteContact,
    /// `analyze_contact_insights`: informational analysis card.
    ContactInsights,
    /// `read_file_content`: file read echo.
    ReadFile,
    /// `run_command`: shell command echo with output disclosure.
    RunCommand,
    /// `run_python_code`: python execution echo with output disclosure.
    RunPython,
    /// `set_theme`: silent host-side theme switch.
    SetTheme,
    /// `navigate_to`: silent host-side navigation.
    NavigateTo,
    /// Catch-all for tools without a dedicated renderer.
    Generic,
}

impl ToolHandler {
    /// Resolves a tool name to its handler. Matching is case-insensitive.
    pub fn resolve(tool_name: &str) -> Self {
        match tool_name.to_lowercase().as_str() {
            "prompt_user_selection" => Self::PromptSelection,
            "prompt_user_input" => Self::PromptInput,
            "send_bulk_email" => Self::SendBulkEmail,
            "delete_contact" => Self::DeleteContact,
            "analyze_contact_insights" => Self::ContactInsights,
            "read_file_content" => Self::ReadFile,
            "run_command" => Self::RunCommand,
            "run_python_code" => Self::RunPython,
            "set_theme" => Self::SetTheme,
            "navigate_to" => Self::NavigateTo,
            _ => Self::Generic,
        }
    }

    /// Behavior category of this handler.
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::PromptSelection => HandlerKind::Selection,
            Self::PromptInput => HandlerKind::Form,
            Self::SendBulkEmail | Self::DeleteContact => HandlerKind::Confirmation,
            Self::ContactInsights | Self::ReadFile | Self::RunCommand | Self::RunPython => {
                HandlerKind::Display
            }
            Self::SetTheme | Self::NavigateTo => HandlerKind::Silent,
            Self::Generic => HandlerKind::Generic,
        }
    }

    /// Whether this handler collects a user response through `respond`.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.kind(),
            HandlerKind::Selection | HandlerKind::Form | HandlerKind::Confirmation
        )
    }

    /// Whether a tool name has a dedicated (non-generic) handler.
    pub fn has_dedicated_renderer(tool_name: &str) -> bool {
        Self::resolve(tool_name) != Self::Generic
    }
}
