//! ember-core - Core library for the ember chat backend
//!
//! This crate provides the domain logic shared by the ember server:
//!
//! - **session**: in-memory session store and lifecycle manager, including
//!   the one-shot premium-trigger state machine
//! - **completion**: client for the external text-completion service with
//!   sequential API-key fallback, plus prompt construction
//! - **types**: conversation and persona types
//! - **error**: error taxonomy shared across the workspace

pub mod completion;
pub mod error;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use session::{Session, SessionManager, SessionStore, TriggerState};
pub use types::{Message, Profile, Role, SessionStats};
