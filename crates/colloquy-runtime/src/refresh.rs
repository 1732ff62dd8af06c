//! Background refresh loop.
//!
//! Polls the session and agent directories at a fixed interval and runs the
//! auto-bootstrap rule after each pass. Every step is best-effort: a failed
//! refresh is logged and retried on the next tick, never surfaced to the
//! interactive flow.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use colloquy_core::thread::{ThreadSessionManager, REFRESH_POLL_INTERVAL};

/// Spawns the background refresh task for a manager.
///
/// Abort the returned handle to stop polling (e.g. when the overlay is torn
/// down).
pub fn spawn_refresh_loop(manager: Arc<ThreadSessionManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REFRESH_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = manager.refresh_agents().await {
                tracing::warn!(%err, "agent directory refresh failed");
            }
            if let Err(err) = manager.refresh_threads().await {
                tracing::warn!(%err, "thread list refresh failed");
            }
            if let Some(thread_id) = manager.ensure_bootstrap().await {
                tracing::debug!(%thread_id, "auto-bootstrapped main agent thread");
            }
        }
    })
}
