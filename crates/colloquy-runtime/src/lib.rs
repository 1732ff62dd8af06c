//! Colloquy runtime: the wiring layer of the conversational overlay.
//!
//! Builds on `colloquy-core` to run one conversation runtime per active
//! thread (all mounted, one visible), poll the directories in the
//! background, map silent tools to host commands, and provide in-memory
//! infrastructure for embedding hosts and tests.

pub mod host;
pub mod memory;
pub mod pane;
pub mod refresh;
pub mod stream;
pub mod suggestions;

pub use host::{host_command, HostCommand, Theme};
pub use memory::{MemoryLayoutStore, StaticAgentDirectory, StaticSessionDirectory, TracingNotifier};
pub use pane::ConversationPaneSet;
pub use refresh::spawn_refresh_loop;
pub use stream::{ConversationMessage, ConversationRuntime, MessageRole, MessageTransport, StreamEvent};
pub use suggestions::{chat_suggestions, ChatSuggestion};
