//! Persisted panel-layout preference.
//!
//! The overlay's split ratio is persisted client-side under a fixed key,
//! readable and writable regardless of authentication state, and expired on
//! sign-out so a stale open/expanded panel is not restored on the next
//! sign-in.

use async_trait::async_trait;

use crate::error::Result;

/// Fixed storage key for the chat panel split ratio.
pub const LAYOUT_PREFERENCE_KEY: &str = "global-chat";

/// Default split ratio (main content / chat panel), in percent.
pub const DEFAULT_PANEL_LAYOUT: [f64; 2] = [70.0, 30.0];

/// Client-side persistence for layout preferences.
#[async_trait]
pub trait LayoutPreferenceStore: Send + Sync {
    /// Loads the raw persisted sizes for a key, if present.
    async fn load(&self, key: &str) -> Option<Vec<f64>>;

    /// Persists sizes for a key.
    async fn save(&self, key: &str, sizes: &[f64]) -> Result<()>;

    /// Removes the persisted value for a key.
    async fn clear(&self, key: &str) -> Result<()>;
}

/// Validates a persisted value, falling back to the default ratio.
///
/// Only a two-element ratio is accepted; anything else (absent, short,
/// over-long) yields [`DEFAULT_PANEL_LAYOUT`].
pub fn saved_or_default(saved: Option<Vec<f64>>) -> [f64; 2] {
    match saved.as_deref() {
        Some([left, right]) => [*left, *right],
        _ => DEFAULT_PANEL_LAYOUT,
    }
}
