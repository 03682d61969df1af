//! Core types and traits for parley
//!
//! This crate provides the configuration, logging setup, conversation model
//! and the in-memory session store shared by the other parley components.

pub mod config;
pub mod error;
pub mod logging;
pub mod relay;
pub mod session;

pub use error::{Error, Result};
pub use relay::{RelayClient, RelayOutcome, WireMessage};
pub use session::{ChatSession, Message, PendingTurn, Role, SessionStore};
