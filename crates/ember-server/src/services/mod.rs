//! Server-side services.

pub mod chat;
pub mod cleanup;

pub use chat::ChatService;
pub use cleanup::CleanupService;
