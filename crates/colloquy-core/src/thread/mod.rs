//! Thread session domain module.
//!
//! Contains the thread/session models, directory query traits, id
//! generation, timestamp normalization, and the session manager.
//!
//! # Module Structure
//!
//! - `model`: thread records and session query DTOs
//! - `directory`: query traits for session and agent listings
//! - `id`: thread id generation
//! - `time`: backend timestamp normalization
//! - `manager`: thread lifecycle management (`ThreadSessionManager`)

mod directory;
mod id;
mod manager;
mod model;
mod time;

// Re-export public API
pub use directory::{AgentDirectory, SessionDirectory};
pub use id::new_thread_id;
pub use manager::{
    ThreadSessionManager, MAIN_AGENT_NAME, NEW_THREAD_REFRESH_DELAY, REFRESH_POLL_INTERVAL,
    SESSION_PAGE_LIMIT,
};
pub use model::{AgentDescriptor, SessionAgent, SessionPage, SessionSummary, ThreadRecord};
pub use time::to_epoch_millis;
