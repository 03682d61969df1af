//! Session management for chat threads
//!
//! Sessions live only in memory. The store keeps the collection of
//! sessions plus a working copy of the active session's messages, and
//! flushes that working copy back before any switch.

pub mod store;
pub mod types;

pub use store::{PendingTurn, SessionStore};
pub use types::{derive_title, ChatSession, Message, Role, DEFAULT_TITLE};
