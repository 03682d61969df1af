//! Client-side contract for talking to the relay endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::Role;

/// A message as it travels over the wire: role and content only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    /// Build a wire message from a role and its text
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Result of a single relay call.
///
/// `Ok` carries the assistant reply text, `Err` the error text to show the user.
pub type RelayOutcome = std::result::Result<String, String>;

/// Something that can forward a conversation to the relay and return the reply
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Send the full history and wait for the assistant reply
    async fn relay(&self, messages: Vec<WireMessage>) -> crate::Result<String>;
}
