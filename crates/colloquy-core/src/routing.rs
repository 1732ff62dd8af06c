//! Per-thread routing metadata for outbound requests.
//!
//! Every message sent on behalf of a thread carries headers identifying the
//! thread, the resolved agent, the authenticated user, and the workspace
//! scope, so the backend can route it without server-side session affinity.

use serde::{Deserialize, Serialize};

use crate::agent::AgentBinding;

pub const HEADER_USER_CONTEXT: &str = "X-User-Context";
pub const HEADER_SESSION_ID: &str = "X-Session-ID";
pub const HEADER_THREAD_ID: &str = "X-Thread-ID";
pub const HEADER_SELECTED_AGENT_ID: &str = "X-Selected-Agent-ID";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_USER_ID: &str = "X-User-ID";
pub const HEADER_WORKSPACE_ID: &str = "X-Workspace-ID";

/// Authentication state threaded into the core at construction, never read
/// from ambient globals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthContext {
    pub authenticated: bool,
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl AuthContext {
    /// An unauthenticated context.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated context with a bearer token and user id.
    pub fn authenticated(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            token: Some(token.into()),
            user_id: Some(user_id.into()),
        }
    }
}

/// Builds the routing headers for one outbound message on a thread.
///
/// The agent header is present only when a binding resolved to a concrete
/// id; the bearer/user headers only for authenticated contexts; the
/// workspace header only when scoped.
pub fn routing_headers(
    thread_id: &str,
    binding: &AgentBinding,
    auth: &AuthContext,
    workspace_id: Option<&str>,
) -> Vec<(String, String)> {
    let mut headers = vec![
        (
            HEADER_USER_CONTEXT.to_string(),
            if auth.authenticated {
                "authenticated".to_string()
            } else {
                "unauthenticated".to_string()
            },
        ),
        (HEADER_SESSION_ID.to_string(), thread_id.to_string()),
        (HEADER_THREAD_ID.to_string(), thread_id.to_string()),
    ];

    if let Some(agent_id) = &binding.agent_id {
        headers.push((HEADER_SELECTED_AGENT_ID.to_string(), agent_id.clone()));
    }

    if auth.authenticated {
        if let (Some(token), Some(user_id)) = (&auth.token, &auth.user_id) {
            headers.push((HEADER_AUTHORIZATION.to_string(), format!("Bearer {token}")));
            headers.push((HEADER_USER_ID.to_string(), user_id.clone()));
        }
    }

    if let Some(workspace_id) = workspace_id {
        headers.push((HEADER_WORKSPACE_ID.to_string(), workspace_id.to_string()));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_authenticated_headers() {
        let binding = AgentBinding {
            agent_id: Some("a-1".to_string()),
            agent_name: "Main Agent".to_string(),
        };
        let auth = AuthContext::authenticated("tok-123", "u-9");
        let headers = routing_headers("t-1", &binding, &auth, Some("acme"));

        assert_eq!(header(&headers, HEADER_USER_CONTEXT), Some("authenticated"));
        assert_eq!(header(&headers, HEADER_SESSION_ID), Some("t-1"));
        assert_eq!(header(&headers, HEADER_THREAD_ID), Some("t-1"));
        assert_eq!(header(&headers, HEADER_SELECTED_AGENT_ID), Some("a-1"));
        assert_eq!(header(&headers, HEADER_AUTHORIZATION), Some("Bearer tok-123"));
        assert_eq!(header(&headers, HEADER_USER_ID), Some("u-9"));
        assert_eq!(header(&headers, HEADER_WORKSPACE_ID), Some("acme"));
    }

    #[test]
    fn test_anonymous_headers_omit_auth_and_agent() {
        let binding = AgentBinding {
            agent_id: None,
            agent_name: "AI Assistant".to_string(),
        };
        let headers = routing_headers("t-2", &binding, &AuthContext::anonymous(), None);

        assert_eq!(
            header(&headers, HEADER_USER_CONTEXT),
            Some("unauthenticated")
        );
        assert!(header(&headers, HEADER_SELECTED_AGENT_ID).is_none());
        assert!(header(&headers, HEADER_AUTHORIZATION).is_none());
        assert!(header(&headers, HEADER_WORKSPACE_ID).is_none());
    }
}
