//! Per-thread conversation runtime.
//!
//! One `ConversationRuntime` exists per active thread. It consumes stream
//! events, tracks tool-call protocols and streaming state, collects local
//! form edits, and drives the response protocol through the host's message
//! transport. Runtimes for background threads keep consuming events, so
//! in-flight tool-call state is never lost when the visible thread changes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use colloquy_core::agent::AgentBinding;
use colloquy_core::error::Result;
use colloquy_core::routing::{routing_headers, AuthContext};
use colloquy_core::toolcall::{
    approval_payload, deletion_payload, form_payload, parse_field_definitions, response_message,
    selection_payload, selection_question, arg_str, HandlerKind, Notifier, RespondOutcome,
    ResponseChannel, ToolCallProtocol, ToolCallRecord, ToolCallStatus, ToolCallView, ToolHandler,
};

use crate::host::{host_command, HostCommand};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user (including frontend tool responses).
    User,
    /// Message from the AI agent.
    Assistant,
    /// System-generated message.
    System,
}

/// A single message in a thread's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Creation timestamp (epoch milliseconds).
    pub timestamp: i64,
}

impl ConversationMessage {
    fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Events surfaced by the chat transport for one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The stream began producing output.
    StreamStarted,
    /// The stream finished producing output.
    StreamEnded,
    /// A complete assistant message arrived.
    AssistantMessage { content: String },
    /// A new tool invocation was announced.
    ToolCallAnnounced {
        id: String,
        name: String,
        #[serde(default)]
        arguments: Map<String, Value>,
    },
    /// The backend marked a tool call in progress, possibly with a fuller
    /// argument fragment than the announcement carried.
    ToolCallExecuting {
        id: String,
        #[serde(default)]
        arguments: Option<Map<String, Value>>,
    },
    /// The backend completed a tool call.
    ToolCallCompleted { id: String, result: Value },
}

/// The host's outbound chat transport for a thread.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Sends a message on a thread, with its routing headers attached.
    async fn send_message(
        &self,
        thread_id: &str,
        headers: &[(String, String)],
        message: &str,
    ) -> anyhow::Result<()>;
}

/// Adapts the host transport to the core response channel, carrying the
/// thread's routing headers and the runtime's streaming flag.
struct GatedChannel<'a> {
    transport: &'a dyn MessageTransport,
    thread_id: String,
    headers: Vec<(String, String)>,
    streaming: bool,
}

#[async_trait]
impl ResponseChannel for GatedChannel<'_> {
    fn is_streaming(&self) -> bool {
        self.streaming
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        self.transport
            .send_message(&self.thread_id, &self.headers, message)
            .await
    }
}

/// The conversation runtime for one thread.
pub struct ConversationRuntime {
    thread_id: String,
    binding: AgentBinding,
    auth: AuthContext,
    workspace_id: Option<String>,
    transport: Arc<dyn MessageTransport>,
    notifier: Arc<dyn Notifier>,
    streaming: bool,
    messages: Vec<ConversationMessage>,
    /// Tool calls in announcement order.
    tool_call_order: Vec<String>,
    tool_calls: HashMap<String, ToolCallProtocol>,
    /// Local, not-yet-submitted form edits per tool call.
    form_values: HashMap<String, HashMap<String, String>>,
    /// Host commands queued by silent tools, drained by the shell.
    host_commands: Vec<HostCommand>,
}

impl ConversationRuntime {
    pub fn new(
        thread_id: String,
        binding: AgentBinding,
        auth: AuthContext,
        workspace_id: Option<String>,
        transport: Arc<dyn MessageTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            thread_id,
            binding,
            auth,
            workspace_id,
            transport,
            notifier,
            streaming: false,
            messages: Vec::new(),
            tool_call_order: Vec::new(),
            tool_calls: HashMap::new(),
            form_values: HashMap::new(),
            host_commands: Vec::new(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn binding(&self) -> &AgentBinding {
        &self.binding
    }

    /// Adopts a newer binding resolution (session metadata may arrive after
    /// the runtime was created).
    pub fn set_binding(&mut self, binding: AgentBinding) {
        self.binding = binding;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Routing headers for outbound requests on this thread.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        routing_headers(
            &self.thread_id,
            &self.binding,
            &self.auth,
            self.workspace_id.as_deref(),
        )
    }

    /// Applies one stream event to runtime state.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::StreamStarted => self.streaming = true,
            StreamEvent::StreamEnded => self.streaming = false,
            StreamEvent::AssistantMessage { content } => {
                self.messages
                    .push(ConversationMessage::new(MessageRole::Assistant, content));
            }
            StreamEvent::ToolCallAnnounced {
                id,
                name,
                arguments,
            } => {
                if !self.tool_calls.contains_key(&id) {
                    self.tool_call_order.push(id.clone());
                    self.tool_calls.insert(
                        id.clone(),
                        ToolCallProtocol::new(ToolCallRecord::new(id, name, arguments)),
                    );
                }
            }
            StreamEvent::ToolCallExecuting { id, arguments } => {
                let Some(protocol) = self.tool_calls.get_mut(&id) else {
                    tracing::debug!(tool_call_id = %id, "executing signal for unknown tool call");
                    return;
                };
                if let Some(arguments) = arguments {
                    protocol.update_arguments(arguments);
                }
                let was_pending = protocol.call().status == ToolCallStatus::Pending;
                protocol.mark_executing();
                if was_pending && protocol.handler().kind() == HandlerKind::Silent {
                    if let Some(command) =
                        host_command(&protocol.call().name, &protocol.call().arguments)
                    {
                        self.host_commands.push(command);
                    }
                }
            }
            StreamEvent::ToolCallCompleted { id, result } => {
                let Some(protocol) = self.tool_calls.get_mut(&id) else {
                    tracing::debug!(tool_call_id = %id, "completion for unknown tool call");
                    return;
                };
                protocol.mark_executing();
                protocol.complete_from_stream(result);
            }
        }
    }

    /// Appends a user free-text message to the local history.
    pub fn push_user_message(&mut self, content: String) {
        self.messages
            .push(ConversationMessage::new(MessageRole::User, content));
    }

    /// Drains host commands queued by silent tools.
    pub fn drain_host_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.host_commands)
    }

    /// Views for every tracked tool call, in announcement order.
    pub fn tool_call_views(&self) -> Vec<(String, ToolCallView)> {
        self.tool_call_order
            .iter()
            .filter_map(|id| {
                self.tool_calls
                    .get(id)
                    .map(|protocol| (id.clone(), protocol.view()))
            })
            .collect()
    }

    /// Responds to a selection prompt with the chosen option.
    ///
    /// Returns `None` for an unknown tool call or a non-selection handler.
    pub async fn select_choice(
        &mut self,
        tool_call_id: &str,
        choice: &str,
    ) -> Result<Option<RespondOutcome>> {
        let Some(protocol) = self.tool_calls.get(tool_call_id) else {
            return Ok(None);
        };
        if protocol.handler() != ToolHandler::PromptSelection {
            return Ok(None);
        }
        let question = selection_question(&protocol.call().arguments);
        let payload = selection_payload(&question, choice, Utc::now().timestamp_millis());
        self.send_response(tool_call_id, payload).await
    }

    /// Records a local form edit.
    pub fn set_form_value(&mut self, tool_call_id: &str, field: &str, value: String) {
        self.form_values
            .entry(tool_call_id.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Whether every declared field of a form has a non-blank value.
    pub fn form_ready(&self, tool_call_id: &str) -> bool {
        let Some(protocol) = self.tool_calls.get(tool_call_id) else {
            return false;
        };
        let fields = parse_field_definitions(&arg_str(&protocol.call().arguments, "fields"));
        if fields.is_empty() {
            return false;
        }
        let values = self.form_values.get(tool_call_id);
        fields.iter().all(|field| {
            values
                .and_then(|v| v.get(&field.name))
                .is_some_and(|value| !value.trim().is_empty())
        })
    }

    /// Submits the accumulated form values.
    ///
    /// Refused (`None`) until every declared field is non-blank; the
    /// readiness check is the source of truth, not control disabling.
    pub async fn submit_form(&mut self, tool_call_id: &str) -> Result<Option<RespondOutcome>> {
        if !self.form_ready(tool_call_id) {
            return Ok(None);
        }
        let values = self.form_values.get(tool_call_id).cloned().unwrap_or_default();
        let payload = form_payload(values.iter(), Utc::now().timestamp_millis());
        let outcome = self.send_response(tool_call_id, payload).await?;
        if outcome == Some(RespondOutcome::Sent) {
            self.form_values.remove(tool_call_id);
        }
        Ok(outcome)
    }

    /// Resolves a confirmation gate with an accept/decline decision.
    ///
    /// Returns `None` for an unknown tool call or a non-confirmation handler.
    pub async fn confirm(
        &mut self,
        tool_call_id: &str,
        accepted: bool,
    ) -> Result<Option<RespondOutcome>> {
        let Some(protocol) = self.tool_calls.get(tool_call_id) else {
            return Ok(None);
        };
        let payload = match protocol.handler() {
            ToolHandler::SendBulkEmail => approval_payload(accepted),
            ToolHandler::DeleteContact => {
                deletion_payload(accepted, Utc::now().timestamp_millis())
            }
            _ => return Ok(None),
        };
        self.send_response(tool_call_id, payload).await
    }

    async fn send_response(
        &mut self,
        tool_call_id: &str,
        payload: Map<String, Value>,
    ) -> Result<Option<RespondOutcome>> {
        let transport = Arc::clone(&self.transport);
        let channel = GatedChannel {
            transport: transport.as_ref(),
            thread_id: self.thread_id.clone(),
            headers: self.request_headers(),
            streaming: self.streaming,
        };
        let notifier = Arc::clone(&self.notifier);

        let Some(protocol) = self.tool_calls.get_mut(tool_call_id) else {
            return Ok(None);
        };
        let envelope = response_message(&protocol.call().id, &protocol.call().name, &payload)?;
        let outcome = protocol
            .respond(payload, &channel, notifier.as_ref())
            .await?;
        if outcome == RespondOutcome::Sent {
            self.messages
                .push(ConversationMessage::new(MessageRole::User, envelope));
        }
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Theme;
    use colloquy_core::routing::HEADER_SELECTED_AGENT_ID;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<(String, Vec<(String, String)>, String)>>,
    }

    #[async_trait]
    impl MessageTransport for MockTransport {
        async fn send_message(
            &self,
            thread_id: &str,
            headers: &[(String, String)],
            message: &str,
        ) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((
                thread_id.to_string(),
                headers.to_vec(),
                message.to_string(),
            ));
            Ok(())
        }
    }

    struct SilentNotifier;

    impl Notifier for SilentNotifier {
        fn notify_error(&self, _message: &str) {}
    }

    fn runtime(transport: Arc<MockTransport>) -> ConversationRuntime {
        ConversationRuntime::new(
            "t-1".to_string(),
            AgentBinding {
                agent_id: Some("a-1".to_string()),
                agent_name: "Main Agent".to_string(),
            },
            AuthContext::anonymous(),
            Some("acme".to_string()),
            transport,
            Arc::new(SilentNotifier),
        )
    }

    fn announce(runtime: &mut ConversationRuntime, id: &str, name: &str, args: Value) {
        runtime.apply(StreamEvent::ToolCallAnnounced {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args.as_object().cloned().unwrap(),
        });
        runtime.apply(StreamEvent::ToolCallExecuting {
            id: id.to_string(),
            arguments: None,
        });
    }

    #[tokio::test]
    async fn test_selection_roundtrip_with_routing_headers() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport.clone());
        announce(
            &mut runtime,
            "tc-1",
            "prompt_user_selection",
            json!({"question": "Color?", "choices": "red|blue"}),
        );

        let outcome = runtime.select_choice("tc-1", "blue").await.unwrap();
        assert_eq!(outcome, Some(RespondOutcome::Sent));

        let sent = transport.sent.lock().unwrap();
        let (thread_id, headers, message) = &sent[0];
        assert_eq!(thread_id, "t-1");
        assert!(headers
            .iter()
            .any(|(k, v)| k == HEADER_SELECTED_AGENT_ID && v == "a-1"));
        assert!(message.starts_with("Tool response: prompt_user_selection\n"));

        // The envelope lands in local history as a user message
        let last = runtime.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(&last.content, message);

        // And the call's view is now the terminal outcome
        let views = runtime.tool_call_views();
        assert_eq!(
            views[0].1,
            ToolCallView::SelectionOutcome {
                selected: Some("blue".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_respond_ignored_while_stream_is_active() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport.clone());
        announce(
            &mut runtime,
            "tc-1",
            "prompt_user_selection",
            json!({"choices": "a|b"}),
        );
        runtime.apply(StreamEvent::StreamStarted);

        let outcome = runtime.select_choice("tc-1", "a").await.unwrap();
        assert_eq!(outcome, Some(RespondOutcome::StreamBusy));
        assert!(transport.sent.lock().unwrap().is_empty());

        runtime.apply(StreamEvent::StreamEnded);
        let outcome = runtime.select_choice("tc-1", "a").await.unwrap();
        assert_eq!(outcome, Some(RespondOutcome::Sent));
    }

    #[tokio::test]
    async fn test_form_submission_gated_on_completeness() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport.clone());
        announce(
            &mut runtime,
            "tc-2",
            "prompt_user_input",
            json!({"fields": "email:Email|msg:Message::textarea"}),
        );

        assert!(!runtime.form_ready("tc-2"));
        assert_eq!(runtime.submit_form("tc-2").await.unwrap(), None);

        runtime.set_form_value("tc-2", "email", "a@b.c".to_string());
        runtime.set_form_value("tc-2", "msg", "   ".to_string());
        assert!(!runtime.form_ready("tc-2"));

        runtime.set_form_value("tc-2", "msg", "hello".to_string());
        assert!(runtime.form_ready("tc-2"));
        let outcome = runtime.submit_form("tc-2").await.unwrap();
        assert_eq!(outcome, Some(RespondOutcome::Sent));

        let sent = transport.sent.lock().unwrap();
        let blob = sent[0].2.split_once('\n').unwrap().1;
        let parsed: Value = serde_json::from_str(blob).unwrap();
        assert_eq!(parsed["email"], "a@b.c");
        assert_eq!(parsed["msg"], "hello");
        assert!(parsed["timestamp"].is_number());
    }

    #[tokio::test]
    async fn test_confirmation_payload_shapes() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport.clone());
        announce(
            &mut runtime,
            "tc-3",
            "send_bulk_email",
            json!({"recipients": "a@x.com", "subject": "s", "message": "m"}),
        );
        announce(
            &mut runtime,
            "tc-4",
            "delete_contact",
            json!({"contact_id": "c-1", "reason": "dup"}),
        );

        runtime.confirm("tc-3", true).await.unwrap();
        runtime.confirm("tc-4", false).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        let approved: Value =
            serde_json::from_str(sent[0].2.split_once('\n').unwrap().1).unwrap();
        assert_eq!(approved["approved"], true);
        let declined: Value =
            serde_json::from_str(sent[1].2.split_once('\n').unwrap().1).unwrap();
        assert_eq!(declined["confirmed"], false);
        assert!(declined.get("deleted_at").is_none());
    }

    #[tokio::test]
    async fn test_double_respond_sends_one_envelope() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport.clone());
        announce(
            &mut runtime,
            "tc-5",
            "prompt_user_selection",
            json!({"choices": "x"}),
        );

        runtime.select_choice("tc-5", "x").await.unwrap();
        let second = runtime.select_choice("tc-5", "x").await.unwrap();
        assert_eq!(second, Some(RespondOutcome::AlreadyResponded));
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_silent_tool_queues_host_command_once() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport);
        announce(&mut runtime, "tc-6", "set_theme", json!({"theme": "dark"}));
        // A repeated executing signal must not duplicate the command
        runtime.apply(StreamEvent::ToolCallExecuting {
            id: "tc-6".to_string(),
            arguments: None,
        });

        assert_eq!(
            runtime.drain_host_commands(),
            vec![HostCommand::SetTheme { theme: Theme::Dark }]
        );
        assert!(runtime.drain_host_commands().is_empty());

        // Silent tools render nothing
        assert_eq!(runtime.tool_call_views()[0].1, ToolCallView::Hidden);
    }

    #[tokio::test]
    async fn test_passive_tool_completes_from_upstream() {
        let transport = Arc::new(MockTransport::default());
        let mut runtime = runtime(transport);
        announce(
            &mut runtime,
            "tc-7",
            "run_command",
            json!({"command": "ls"}),
        );
        runtime.apply(StreamEvent::ToolCallCompleted {
            id: "tc-7".to_string(),
            result: json!({"stdout": "README.md", "exit_code": 0}),
        });

        match &runtime.tool_call_views()[0].1 {
            ToolCallView::Activity {
                status_line,
                blocks,
                ..
            } => {
                assert_eq!(status_line, "Command run");
                assert_eq!(blocks[0].label, "stdout");
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
