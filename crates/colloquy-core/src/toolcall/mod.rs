//! Tool-call domain module.
//!
//! Everything needed to turn an agent-issued tool call (a name plus
//! loosely-structured arguments) into a typed, renderable, user-actionable
//! unit with an at-most-once response channel.
//!
//! # Module Structure
//!
//! - `args`: tolerant argument parsing (`parse_choice_list`, `parse_field_definitions`)
//! - `record`: tool-call record and lifecycle status (`ToolCallRecord`, `ToolCallStatus`)
//! - `handler`: closed tool-name registry (`ToolHandler`, `HandlerKind`)
//! - `view`: pure render projection (`ToolCallView`, `render`)
//! - `protocol`: response protocol (`ToolCallProtocol`, `ResponseChannel`)

pub mod args;
mod handler;
mod protocol;
mod record;
mod view;

// Re-export public API
pub use args::{
    arg_str, display_string, first_arg_str, parse_choice_list, parse_field_definitions,
    FieldDefinition,
};
pub use handler::{HandlerKind, ToolHandler};
pub use protocol::{
    approval_payload, deletion_payload, form_payload, response_message, selection_payload,
    Notifier, RespondOutcome, ResponseChannel, ToolCallProtocol, RESPONSE_SOURCE,
};
pub use record::{ToolCallRecord, ToolCallStatus};
pub use view::{
    render, selection_choices, selection_question, DetailBlock, ToolCallView,
    DEFAULT_FORM_QUESTION, DEFAULT_SELECTION_QUESTION, DEFAULT_SUBMIT_LABEL, FORM_CLOSED_MESSAGE,
};
