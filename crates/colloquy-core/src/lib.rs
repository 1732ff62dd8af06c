//! Colloquy core: the domain layer of a conversational overlay.
//!
//! This crate contains the hard logic of the overlay and nothing else: the
//! interactive tool-call protocol (argument codec, handler registry, view
//! projection, at-most-once response channel), the multi-thread session
//! model, agent identity resolution, routing metadata, and the persisted
//! layout preference contract. Rendering toolkits and transports live in
//! the host; they are reached through the traits defined here.

pub mod agent;
pub mod error;
pub mod layout;
pub mod routing;
pub mod thread;
pub mod toolcall;

// Re-export common error type
pub use error::ColloquyError;
