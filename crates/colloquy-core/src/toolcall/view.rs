//! Pure render projection for tool calls.
//!
//! [`render`] maps a handler and a tool-call record to a [`ToolCallView`],
//! a toolkit-agnostic description of what the host shell should draw. The
//! projection is a pure function of its inputs so the protocol stays
//! testable without a rendering harness.

use serde_json::{Map, Value};

use super::args::{
    arg_str, display_string, first_arg_str, parse_choice_list, parse_field_definitions,
    FieldDefinition,
};
use super::handler::{HandlerKind, ToolHandler};
use super::record::{ToolCallRecord, ToolCallStatus};

/// Default question shown when a selection prompt omits one.
pub const DEFAULT_SELECTION_QUESTION: &str = "Please choose one of the options below";
/// Default question shown when an input form omits one.
pub const DEFAULT_FORM_QUESTION: &str = "Please provide the requested details";
/// Default submit button label for input forms.
pub const DEFAULT_SUBMIT_LABEL: &str = "Submit";
/// Message shown when a form completed without a structured submission.
pub const FORM_CLOSED_MESSAGE: &str = "Form was closed before any information was provided.";

/// A labeled block of preformatted text inside a view.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DetailBlock {
    pub label: String,
    pub content: String,
}

impl DetailBlock {
    fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// What the host shell should draw for one tool call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ToolCallView {
    /// Nothing is drawn (silent handlers, or partial args still streaming).
    Hidden,
    /// Minimal badge for tools without a dedicated renderer.
    Generic {
        name: String,
        status_text: String,
        blocks: Vec<DetailBlock>,
    },
    /// Actionable pick-one prompt.
    Selection {
        question: String,
        choices: Vec<String>,
    },
    /// Terminal view after a selection was made.
    SelectionOutcome { selected: Option<String> },
    /// Actionable structured input form.
    Form {
        question: String,
        fields: Vec<FieldDefinition>,
        submit_label: String,
    },
    /// Terminal view listing the submitted values.
    FormSubmitted { entries: Vec<(String, String)> },
    /// Actionable confirm/cancel gate.
    Confirmation {
        title: String,
        blocks: Vec<DetailBlock>,
        warning: Option<String>,
        confirm_label: String,
        cancel_label: String,
        destructive: bool,
    },
    /// Terminal single-line outcome, styled by acceptance.
    Outcome { message: String, accepted: bool },
    /// Live/terminal activity line with optional disclosure blocks.
    Activity {
        status_line: String,
        subject: Option<String>,
        annotation: Option<String>,
        blocks: Vec<DetailBlock>,
    },
}

/// Projects a tool-call record through its handler into a view.
///
/// Dedicated handlers stay hidden while the call is pending so partially
/// streamed argument fragments never flicker into view; only the generic
/// badge renders its "Preparing..." state.
pub fn render(handler: ToolHandler, call: &ToolCallRecord) -> ToolCallView {
    match handler.kind() {
        HandlerKind::Silent => ToolCallView::Hidden,
        HandlerKind::Generic => render_generic(call),
        _ if call.status == ToolCallStatus::Pending => ToolCallView::Hidden,
        _ => match handler {
            ToolHandler::PromptSelection => render_selection(call),
            ToolHandler::PromptInput => render_form(call),
            ToolHandler::SendBulkEmail => render_bulk_email(call),
            ToolHandler::DeleteContact => render_delete_contact(call),
            ToolHandler::ContactInsights => render_contact_insights(call),
            ToolHandler::ReadFile => render_read_file(call),
            ToolHandler::RunCommand => render_run_command(call),
            ToolHandler::RunPython => render_run_python(call),
            // Silent and Generic are handled by kind above
            ToolHandler::SetTheme | ToolHandler::NavigateTo | ToolHandler::Generic => {
                ToolCallView::Hidden
            }
        },
    }
}

fn render_generic(call: &ToolCallRecord) -> ToolCallView {
    let mut blocks = Vec::new();
    if !call.arguments.is_empty() {
        let content = serde_json::to_string_pretty(&Value::Object(call.arguments.clone()))
            .unwrap_or_default();
        blocks.push(DetailBlock::new("Parameters", content));
    }
    if call.status == ToolCallStatus::Complete {
        if let Some(result) = &call.result {
            let content = match result {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_default(),
            };
            blocks.push(DetailBlock::new("Result", content));
        }
    }
    ToolCallView::Generic {
        name: if call.name.is_empty() {
            "tool".to_string()
        } else {
            call.name.clone()
        },
        status_text: call.status.status_text().to_string(),
        blocks,
    }
}

/// Extracts the selection question, falling back to the default.
pub fn selection_question(args: &Map<String, Value>) -> String {
    let question = arg_str(args, "question");
    if question.is_empty() {
        DEFAULT_SELECTION_QUESTION.to_string()
    } else {
        question
    }
}

/// Extracts and parses the selection choices (`choices`, then `options`).
pub fn selection_choices(args: &Map<String, Value>) -> Vec<String> {
    let raw = arg_str(args, "choices");
    let raw = if raw.is_empty() {
        arg_str(args, "options")
    } else {
        raw
    };
    parse_choice_list(&raw)
}

fn render_selection(call: &ToolCallRecord) -> ToolCallView {
    if call.status == ToolCallStatus::Complete {
        let selected = call
            .result
            .as_ref()
            .and_then(|r| r.get("selected"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return ToolCallView::SelectionOutcome { selected };
    }
    let choices = selection_choices(&call.arguments);
    if choices.is_empty() {
        return ToolCallView::Hidden;
    }
    ToolCallView::Selection {
        question: selection_question(&call.arguments),
        choices,
    }
}

fn form_question(args: &Map<String, Value>) -> String {
    let question = arg_str(args, "question");
    if question.is_empty() {
        DEFAULT_FORM_QUESTION.to_string()
    } else {
        question
    }
}

fn render_form(call: &ToolCallRecord) -> ToolCallView {
    if call.status == ToolCallStatus::Complete {
        return render_form_outcome(call.result.as_ref());
    }
    let fields = parse_field_definitions(&arg_str(&call.arguments, "fields"));
    if fields.is_empty() {
        return ToolCallView::Hidden;
    }
    let submit_label = arg_str(&call.arguments, "submit_label");
    ToolCallView::Form {
        question: form_question(&call.arguments),
        fields,
        submit_label: if submit_label.is_empty() {
            DEFAULT_SUBMIT_LABEL.to_string()
        } else {
            submit_label
        },
    }
}

fn render_form_outcome(result: Option<&Value>) -> ToolCallView {
    if let Some(Value::Object(map)) = result {
        let entries: Vec<(String, String)> = map
            .iter()
            .filter(|(key, _)| key.as_str() != "timestamp")
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();
        if !entries.is_empty() {
            return ToolCallView::FormSubmitted { entries };
        }
    }
    let message = match result {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => FORM_CLOSED_MESSAGE.to_string(),
    };
    ToolCallView::Outcome {
        message,
        accepted: false,
    }
}

fn render_bulk_email(call: &ToolCallRecord) -> ToolCallView {
    if call.status == ToolCallStatus::Complete {
        let approved = call
            .result
            .as_ref()
            .and_then(|r| r.get("approved"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        return ToolCallView::Outcome {
            message: if approved {
                "Email sent successfully".to_string()
            } else {
                "Email sending cancelled".to_string()
            },
            accepted: approved,
        };
    }

    let recipients = arg_str(&call.arguments, "recipients")
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    ToolCallView::Confirmation {
        title: "Bulk Email Review".to_string(),
        blocks: vec![
            DetailBlock::new("Recipients", recipients),
            DetailBlock::new("Subject", arg_str(&call.arguments, "subject")),
            DetailBlock::new("Message", arg_str(&call.arguments, "message")),
        ],
        warning: None,
        confirm_label: "Send Email".to_string(),
        cancel_label: "Cancel".to_string(),
        destructive: false,
    }
}

fn render_delete_contact(call: &ToolCallRecord) -> ToolCallView {
    if call.status == ToolCallStatus::Complete {
        let confirmed = call
            .result
            .as_ref()
            .and_then(|r| r.get("confirmed"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        return ToolCallView::Outcome {
            message: if confirmed {
                "Contact deleted".to_string()
            } else {
                "Deletion cancelled".to_string()
            },
            accepted: confirmed,
        };
    }

    ToolCallView::Confirmation {
        title: "Delete Contact?".to_string(),
        blocks: vec![
            DetailBlock::new("Contact ID", arg_str(&call.arguments, "contact_id")),
            DetailBlock::new("Reason", arg_str(&call.arguments, "reason")),
        ],
        warning: Some(
            "Warning: This action cannot be undone. The contact and all associated data \
             will be permanently deleted."
                .to_string(),
        ),
        confirm_label: "Delete Contact".to_string(),
        cancel_label: "Cancel".to_string(),
        destructive: true,
    }
}

fn render_contact_insights(call: &ToolCallRecord) -> ToolCallView {
    ToolCallView::Activity {
        status_line: "Analyzing Contact Insights".to_string(),
        subject: None,
        annotation: None,
        blocks: vec![
            DetailBlock::new("Contact ID", arg_str(&call.arguments, "contact_id")),
            DetailBlock::new("Analysis Type", arg_str(&call.arguments, "analysis_type")),
        ],
    }
}

fn render_read_file(call: &ToolCallRecord) -> ToolCallView {
    let subject = first_arg_str(
        &call.arguments,
        &["file_path", "path", "file", "filename", "filepath"],
    )
    .unwrap_or_else(|| "File".to_string());
    let status_line = if call.status == ToolCallStatus::Executing {
        "Reading file..."
    } else {
        "File read"
    };
    ToolCallView::Activity {
        status_line: status_line.to_string(),
        subject: Some(subject),
        annotation: None,
        blocks: Vec::new(),
    }
}

fn push_if_content(blocks: &mut Vec<DetailBlock>, label: &str, value: Option<&Value>) {
    if let Some(value) = value {
        let content = display_string(value);
        let content = content.trim();
        if !content.is_empty() {
            blocks.push(DetailBlock::new(label, content));
        }
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

fn leftover_object(map: &Map<String, Value>, consumed: &[&str]) -> Option<Value> {
    let remaining: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if remaining.is_empty() {
        None
    } else {
        Some(Value::Object(remaining))
    }
}

fn render_run_command(call: &ToolCallRecord) -> ToolCallView {
    let command = first_arg_str(&call.arguments, &["command"])
        .or_else(|| match call.arguments.get("commands") {
            Some(Value::Array(parts)) => {
                let joined = parts
                    .iter()
                    .map(|p| match p {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" && ");
                if joined.trim().is_empty() {
                    None
                } else {
                    Some(joined)
                }
            }
            _ => None,
        })
        .or_else(|| first_arg_str(&call.arguments, &["cmd", "line"]))
        .unwrap_or_else(|| "Command".to_string());

    let annotation = first_arg_str(&call.arguments, &["cwd"])
        .map(|cwd| format!("cwd: {}", cwd.trim()));

    let mut blocks = Vec::new();
    if call.status == ToolCallStatus::Complete {
        match call.result.as_ref() {
            Some(Value::Object(map)) => {
                push_if_content(&mut blocks, "stdout", lookup(map, &["stdout", "STDOUT"]));
                push_if_content(&mut blocks, "stderr", lookup(map, &["stderr", "STDERR"]));
                push_if_content(&mut blocks, "output", lookup(map, &["output", "OUTPUT"]));
                if let Some(code) = lookup(map, &["exitCode", "exit_code", "code"])
                    .and_then(Value::as_number)
                {
                    blocks.push(DetailBlock::new("exit code", code.to_string()));
                }
                let consumed = [
                    "stdout", "STDOUT", "stderr", "STDERR", "output", "OUTPUT", "exitCode",
                    "exit_code", "code",
                ];
                push_if_content(&mut blocks, "result", leftover_object(map, &consumed).as_ref());
            }
            Some(other) => push_if_content(&mut blocks, "result", Some(other)),
            None => {}
        }
    }

    let status_line = if call.status == ToolCallStatus::Executing {
        "Running command..."
    } else {
        "Command run"
    };
    ToolCallView::Activity {
        status_line: status_line.to_string(),
        subject: Some(command),
        annotation,
        blocks,
    }
}

fn render_run_python(call: &ToolCallRecord) -> ToolCallView {
    let raw_code = first_arg_str(&call.arguments, &["code", "script", "source", "python"])
        .unwrap_or_default();

    let subject = if raw_code.is_empty() {
        "Python code".to_string()
    } else {
        let mut preview: String = raw_code
            .trim()
            .lines()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(80)
            .collect();
        if raw_code.len() > 80 {
            preview.push_str("...");
        }
        preview
    };

    let mut blocks = Vec::new();
    if !raw_code.is_empty() {
        blocks.push(DetailBlock::new("Code", raw_code));
    }
    if call.status == ToolCallStatus::Complete {
        match call.result.as_ref() {
            Some(Value::Object(map)) => {
                push_if_content(&mut blocks, "stdout", lookup(map, &["stdout", "STDOUT"]));
                push_if_content(&mut blocks, "stderr", lookup(map, &["stderr", "STDERR"]));
                push_if_content(
                    &mut blocks,
                    "result",
                    lookup(map, &["result", "returnValue", "value"]),
                );
                let consumed = [
                    "stdout", "STDOUT", "stderr", "STDERR", "result", "returnValue", "value",
                ];
                push_if_content(&mut blocks, "details", leftover_object(map, &consumed).as_ref());
            }
            Some(other) => push_if_content(&mut blocks, "result", Some(other)),
            None => {}
        }
    }

    let status_line = if call.status == ToolCallStatus::Executing {
        "Executing Python..."
    } else {
        "Python executed"
    };
    ToolCallView::Activity {
        status_line: status_line.to_string(),
        subject: Some(subject),
        annotation: None,
        blocks,
    }
}
