//! Host-command mapping for silent tools.
//!
//! Silent tools render no UI; they map to effects the host shell performs
//! (theme switches, navigation). Invalid requests are dropped rather than
//! surfaced as errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use colloquy_core::toolcall::{arg_str, ToolHandler};

/// Theme accepted by `set_theme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Dark,
    Light,
    System,
}

/// An effect the host shell should perform on behalf of a silent tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    /// Switch the application theme.
    SetTheme { theme: Theme },
    /// Navigate to an in-app route.
    Navigate { path: String },
}

/// Maps a silent tool invocation to a host command.
///
/// Themes must be one of dark/light/system and paths must start with `/`;
/// anything else yields `None`.
pub fn host_command(tool_name: &str, args: &Map<String, Value>) -> Option<HostCommand> {
    match ToolHandler::resolve(tool_name) {
        ToolHandler::SetTheme => {
            let theme = match arg_str(args, "theme").to_lowercase().as_str() {
                "dark" => Theme::Dark,
                "light" => Theme::Light,
                "system" => Theme::System,
                _ => return None,
            };
            Some(HostCommand::SetTheme { theme })
        }
        ToolHandler::NavigateTo => {
            let path = arg_str(args, "path");
            if path.starts_with('/') {
                Some(HostCommand::Navigate { path })
            } else {
                None
            }
        }
        _ => None,
    }
}
