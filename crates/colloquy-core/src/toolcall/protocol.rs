//! Per-invocation response protocol.
//!
//! A [`ToolCallProtocol`] wraps one tool-call record and exposes the
//! at-most-once `respond` operation that feeds a structured payload back
//! into the owning thread's stream. The `responded` flag on the record is
//! the source of truth for the guarantee; renderer-side control disabling
//! is a courtesy only.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::handler::ToolHandler;
use super::record::ToolCallRecord;
use super::view::{render, ToolCallView};
use crate::error::{ColloquyError, Result};

/// Source marker distinguishing frontend-originated tool responses from
/// user free-text messages.
pub const RESPONSE_SOURCE: &str = "frontend-tool";

/// Outbound channel into one thread's conversation stream.
///
/// Implemented by the host's chat transport. `is_streaming` reflects whether
/// the stream is actively producing output; while it is, new responses are
/// ignored rather than queued, since a stream in progress means the agent is
/// already reacting to prior state.
#[async_trait]
pub trait ResponseChannel: Send + Sync {
    /// Whether the owning stream is actively producing output.
    fn is_streaming(&self) -> bool;

    /// Sends a formatted message into the stream.
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// Sink for transient, user-visible notifications (transport failures).
pub trait Notifier: Send + Sync {
    /// Raises a transient error notification.
    fn notify_error(&self, message: &str);
}

/// Outcome of a `respond` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondOutcome {
    /// The response was dispatched and the call completed.
    Sent,
    /// A response was already accepted for this call; the attempt was a no-op.
    AlreadyResponded,
    /// A response send is already in flight; the attempt was ignored.
    SendInFlight,
    /// The owning stream is producing output; the attempt was ignored.
    StreamBusy,
}

/// Formats the plain-text response envelope sent back into the stream.
///
/// The JSON blob carries the originating call id and tool name, the payload
/// fields, and the [`RESPONSE_SOURCE`] marker.
pub fn response_message(
    tool_call_id: &str,
    tool_name: &str,
    payload: &Map<String, Value>,
) -> Result<String> {
    let mut envelope = Map::new();
    envelope.insert(
        "tool_call_id".to_string(),
        Value::String(tool_call_id.to_string()),
    );
    envelope.insert("tool_name".to_string(), Value::String(tool_name.to_string()));
    for (key, value) in payload {
        envelope.insert(key.clone(), value.clone());
    }
    envelope.insert(
        "source".to_string(),
        Value::String(RESPONSE_SOURCE.to_string()),
    );
    let blob = serde_json::to_string_pretty(&Value::Object(envelope))?;
    Ok(format!("Tool response: {tool_name}\n{blob}"))
}

/// Builds the payload for a selection response.
pub fn selection_payload(question: &str, choice: &str, timestamp_ms: i64) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("question".to_string(), Value::String(question.to_string()));
    payload.insert("selected".to_string(), Value::String(choice.to_string()));
    payload.insert("timestamp".to_string(), Value::from(timestamp_ms));
    payload
}

/// Builds the payload for a form submission: all values keyed by field name
/// plus a timestamp.
pub fn form_payload<'a, I>(values: I, timestamp_ms: i64) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut payload = Map::new();
    for (name, value) in values {
        payload.insert(name.clone(), Value::String(value.clone()));
    }
    payload.insert("timestamp".to_string(), Value::from(timestamp_ms));
    payload
}

/// Builds the payload for a send-style approval gate.
pub fn approval_payload(approved: bool) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("approved".to_string(), Value::Bool(approved));
    payload
}

/// Builds the payload for a destructive confirmation gate. The deletion
/// timestamp is only stamped on a confirmed outcome.
pub fn deletion_payload(confirmed: bool, timestamp_ms: i64) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("confirmed".to_string(), Value::Bool(confirmed));
    if confirmed {
        payload.insert("deleted_at".to_string(), Value::from(timestamp_ms));
    }
    payload
}

/// State machine driving one tool call from announcement to completion.
#[derive(Debug)]
pub struct ToolCallProtocol {
    call: ToolCallRecord,
    handler: ToolHandler,
    sending: bool,
}

impl ToolCallProtocol {
    /// Wraps a record, resolving its handler by tool name.
    pub fn new(call: ToolCallRecord) -> Self {
        let handler = ToolHandler::resolve(&call.name);
        Self {
            call,
            handler,
            sending: false,
        }
    }

    /// The underlying record.
    pub fn call(&self) -> &ToolCallRecord {
        &self.call
    }

    /// The resolved handler.
    pub fn handler(&self) -> ToolHandler {
        self.handler
    }

    /// Whether a response send is currently in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Applies an upstream "in progress" transition.
    pub fn mark_executing(&mut self) {
        self.call.begin_executing();
    }

    /// Applies fuller argument fragments from the stream.
    pub fn update_arguments(&mut self, arguments: Map<String, Value>) {
        self.call.update_arguments(arguments);
    }

    /// Applies an upstream completion (passive tools reach `Complete` this
    /// way without any `respond` call).
    pub fn complete_from_stream(&mut self, result: Value) {
        self.call.complete_with(result);
    }

    /// Projects the current state into a renderable view.
    pub fn view(&self) -> ToolCallView {
        render(self.handler, &self.call)
    }

    /// Sends a response payload back into the owning stream, at most once.
    ///
    /// Guards, in order: an already-responded call is a no-op; a send in
    /// flight and an actively streaming channel both cause the attempt to be
    /// ignored (never queued). On success the call completes with the
    /// payload as its result. On transport failure the call stays
    /// `Executing`, the in-flight flag is cleared, a transient notification
    /// is raised, and the caller may retry.
    pub async fn respond(
        &mut self,
        payload: Map<String, Value>,
        channel: &dyn ResponseChannel,
        notifier: &dyn Notifier,
    ) -> Result<RespondOutcome> {
        if self.call.responded {
            return Ok(RespondOutcome::AlreadyResponded);
        }
        if self.sending {
            return Ok(RespondOutcome::SendInFlight);
        }
        if channel.is_streaming() {
            return Ok(RespondOutcome::StreamBusy);
        }

        let message = response_message(&self.call.id, &self.call.name, &payload)?;
        self.sending = true;
        match channel.send(&message).await {
            Ok(()) => {
                self.sending = false;
                self.call.responded = true;
                self.call.complete_with(Value::Object(payload));
                tracing::debug!(tool_call_id = %self.call.id, tool = %self.call.name, "tool response sent");
                Ok(RespondOutcome::Sent)
            }
            Err(err) => {
                self.sending = false;
                let reason = err.to_string();
                notifier.notify_error(&format!("Failed to send tool response: {reason}"));
                Err(ColloquyError::transport(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolcall::record::ToolCallStatus;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockChannel {
        streaming: AtomicBool,
        fail_next: AtomicBool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResponseChannel for MockChannel {
        fn is_streaming(&self) -> bool {
            self.streaming.load(Ordering::SeqCst)
        }

        async fn send(&self, message: &str) -> anyhow::Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                anyhow::bail!("connection reset");
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for MockNotifier {
        fn notify_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn protocol() -> ToolCallProtocol {
        let mut call = ToolCallRecord::new(
            "tc-7",
            "prompt_user_selection",
            json!({"question": "Pick", "choices": "a|b"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        call.begin_executing();
        ToolCallProtocol::new(call)
    }

    #[tokio::test]
    async fn test_respond_is_at_most_once() {
        let channel = MockChannel::default();
        let notifier = MockNotifier::default();
        let mut protocol = protocol();
        let payload = selection_payload("Pick", "a", 1_700_000_000_000);

        let first = protocol
            .respond(payload.clone(), &channel, &notifier)
            .await
            .unwrap();
        assert_eq!(first, RespondOutcome::Sent);
        assert!(protocol.call().responded);
        assert_eq!(protocol.call().status, ToolCallStatus::Complete);

        let second = protocol.respond(payload, &channel, &notifier).await.unwrap();
        assert_eq!(second, RespondOutcome::AlreadyResponded);
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_respond_blocked_while_streaming() {
        let channel = MockChannel::default();
        channel.streaming.store(true, Ordering::SeqCst);
        let notifier = MockNotifier::default();
        let mut protocol = protocol();

        let outcome = protocol
            .respond(selection_payload("Pick", "a", 0), &channel, &notifier)
            .await
            .unwrap();
        assert_eq!(outcome, RespondOutcome::StreamBusy);
        assert!(!protocol.call().responded);
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_state_and_allows_retry() {
        let channel = MockChannel::default();
        channel.fail_next.store(true, Ordering::SeqCst);
        let notifier = MockNotifier::default();
        let mut protocol = protocol();
        let payload = selection_payload("Pick", "b", 42);

        let err = protocol
            .respond(payload.clone(), &channel, &notifier)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(protocol.call().status, ToolCallStatus::Executing);
        assert!(!protocol.call().responded);
        assert!(!protocol.is_sending());
        assert_eq!(notifier.errors.lock().unwrap().len(), 1);

        // Retry succeeds and dispatches exactly one envelope
        let outcome = protocol.respond(payload, &channel, &notifier).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Sent);
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_envelope_format() {
        let channel = MockChannel::default();
        let notifier = MockNotifier::default();
        let mut protocol = protocol();

        protocol
            .respond(
                selection_payload("Pick", "a", 1_700_000_000_000),
                &channel,
                &notifier,
            )
            .await
            .unwrap();

        let sent = channel.sent.lock().unwrap();
        let message = &sent[0];
        let (header, blob) = message.split_once('\n').unwrap();
        assert_eq!(header, "Tool response: prompt_user_selection");

        let parsed: Value = serde_json::from_str(blob).unwrap();
        assert_eq!(parsed["tool_call_id"], "tc-7");
        assert_eq!(parsed["tool_name"], "prompt_user_selection");
        assert_eq!(parsed["selected"], "a");
        assert_eq!(parsed["question"], "Pick");
        assert_eq!(parsed["source"], RESPONSE_SOURCE);
    }

    #[test]
    fn test_deletion_payload_stamps_only_confirmed() {
        let confirmed = deletion_payload(true, 99);
        assert_eq!(confirmed["deleted_at"], json!(99));
        let cancelled = deletion_payload(false, 99);
        assert!(!cancelled.contains_key("deleted_at"));
    }
}
