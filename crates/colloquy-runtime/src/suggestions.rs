//! Chat suggestion chips shown above the composer.

use serde::{Deserialize, Serialize};

/// One tappable suggestion: a short title and the message it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSuggestion {
    pub title: String,
    pub message: String,
}

impl ChatSuggestion {
    fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

/// Builds the suggestion list for a pane.
///
/// With a concrete agent name, an "Ask <agent>" chip leads and the base list
/// is trimmed to three entries.
pub fn chat_suggestions(agent_name: &str) -> Vec<ChatSuggestion> {
    let base = vec![
        ChatSuggestion::new("📊 Show Analytics", "Show me sales analytics for this month"),
        ChatSuggestion::new("📞 List Contacts", "Show me all my contacts"),
        ChatSuggestion::new("💰 View Deals", "Show me the current deal pipeline"),
        ChatSuggestion::new("🏢 Organizations", "List all organizations"),
    ];
    if !agent_name.is_empty() && agent_name != "Select agent..." {
        let mut suggestions = vec![ChatSuggestion::new(
            &format!("💬 Ask {agent_name}"),
            "What can you help me with?",
        )];
        suggestions.extend(base.into_iter().take(3));
        return suggestions;
    }
    base
}
