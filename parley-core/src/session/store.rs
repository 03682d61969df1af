//! In-memory store for multiple chat sessions

use chrono::Utc;
use tracing::{debug, warn};

use super::types::{derive_title, ChatSession, Message, Role};
use crate::relay::{RelayClient, RelayOutcome, WireMessage};

/// A user turn that has been recorded and is waiting for the relay reply
#[derive(Debug, Clone)]
pub struct PendingTurn {
    /// Session that issued the request
    pub session_id: String,
    /// Full history to relay, including the new user message.
    /// Only `session_id` is needed once the relay call has been made.
    pub history: Vec<WireMessage>,
}

/// Holds every chat session and the working copy of the active one
#[derive(Debug)]
pub struct SessionStore {
    /// Sessions, newest-created first
    sessions: Vec<ChatSession>,
    /// Id of the active session
    active_id: String,
    /// Working copy of the active session's messages
    messages: Vec<Message>,
    /// Set while a relay call is outstanding
    loading: bool,
    /// Session whose title is being edited
    editing: Option<String>,
}

impl SessionStore {
    /// Create a store holding a single empty "New Chat" session
    pub fn new() -> Self {
        let session = ChatSession::new();
        let active_id = session.id.clone();
        Self {
            sessions: vec![session],
            active_id,
            messages: Vec::new(),
            loading: false,
            editing: None,
        }
    }

    /// All sessions, newest-created first
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session's entry in the collection
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.find(&self.active_id)
    }

    /// Messages of the active session, including turns not yet flushed
    pub fn active_messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a relay call is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Id of the session whose title is being edited, if any
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Save the active session, then create, activate and prepend a new empty one.
    ///
    /// Returns the new session's id.
    pub fn create_session(&mut self) -> String {
        self.save_current();

        let session = ChatSession::new();
        let id = session.id.clone();
        self.active_id = id.clone();
        self.messages.clear();
        self.sessions.insert(0, session);

        debug!("Created session {}", id);
        id
    }

    /// Save the active session, then make `id` active.
    ///
    /// Returns false when no session has that id.
    pub fn select_session(&mut self, id: &str) -> bool {
        self.save_current();

        let Some(session) = self.find(id) else {
            debug!("Ignoring selection of unknown session {}", id);
            return false;
        };
        let messages = session.messages.clone();
        self.active_id = id.to_string();
        self.messages = messages;
        true
    }

    /// Remove a session.
    ///
    /// Deleting the active session activates the first remaining one, or a
    /// fresh session when the collection becomes empty.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        self.sessions.remove(index);

        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }

        if self.active_id == id {
            let next = self
                .sessions
                .first()
                .map(|s| (s.id.clone(), s.messages.clone()));
            match next {
                Some((next_id, messages)) => {
                    self.active_id = next_id;
                    self.messages = messages;
                }
                None => {
                    self.create_session();
                }
            }
        }

        debug!("Deleted session {}", id);
        true
    }

    /// Rename a session. Blank titles are discarded.
    pub fn rename_session(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            debug!("Discarding blank title for session {}", id);
            return false;
        }
        match self.find_mut(id) {
            Some(session) => {
                session.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Begin editing a session title, returning the current title
    pub fn start_rename(&mut self, id: &str) -> Option<String> {
        let title = self.find(id)?.title.clone();
        self.editing = Some(id.to_string());
        Some(title)
    }

    /// Apply the edited title to the session being edited and stop editing
    pub fn commit_rename(&mut self, title: &str) -> bool {
        match self.editing.take() {
            Some(id) => self.rename_session(&id, title),
            None => false,
        }
    }

    /// Stop editing without changing anything
    pub fn cancel_rename(&mut self) {
        self.editing = None;
    }

    /// Record a user message and raise the in-flight flag.
    ///
    /// Returns `None` without touching any state when `text` is blank or a
    /// relay call is already in flight.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingTurn> {
        let content = text.trim();
        if content.is_empty() || self.loading {
            return None;
        }

        let first_message = self.messages.is_empty();
        self.messages.push(Message::new(Role::User, content));

        if first_message {
            let title = derive_title(content);
            let active_id = self.active_id.clone();
            if let Some(session) = self.find_mut(&active_id) {
                session.title = title;
            }
        }
        self.save_current();
        self.loading = true;

        Some(PendingTurn {
            session_id: self.active_id.clone(),
            history: self.messages.iter().map(Message::to_wire).collect(),
        })
    }

    /// Apply the relay result for `turn` and clear the in-flight flag.
    ///
    /// The reply lands in the session that issued the request, even if
    /// another session has become active since.
    pub fn complete_send(&mut self, turn: PendingTurn, outcome: RelayOutcome) {
        self.loading = false;

        let content = match outcome {
            Ok(reply) => reply,
            Err(error) => format!("Sorry, something went wrong. {}. Please try again.", error),
        };
        let reply = Message::new(Role::Assistant, content);

        if turn.session_id == self.active_id {
            self.messages.push(reply);
            self.save_current();
        } else if let Some(session) = self.find_mut(&turn.session_id) {
            session.messages.push(reply);
            session.last_updated = Utc::now();
        } else {
            warn!("Dropping reply for deleted session {}", turn.session_id);
        }
    }

    /// Send a message through `relay` and record the reply.
    ///
    /// Returns false when the message was ignored.
    pub async fn send_message(&mut self, text: &str, relay: &dyn RelayClient) -> bool {
        let Some(mut turn) = self.begin_send(text) else {
            return false;
        };

        let outcome = relay
            .relay(std::mem::take(&mut turn.history))
            .await
            .map_err(|e| e.to_string());
        if let Err(error) = &outcome {
            // The failure already reaches the user as an assistant message.
            debug!("Relay call failed: {}", error);
        }

        self.complete_send(turn, outcome);
        true
    }

    /// Flush the working copy into the collection
    fn save_current(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let messages = self.messages.clone();
        let active_id = self.active_id.clone();
        if let Some(session) = self.find_mut(&active_id) {
            session.messages = messages;
            session.last_updated = Utc::now();
        }
    }

    fn find(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
