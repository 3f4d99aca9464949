//! Ordered chat history shared between the input path and the stream drain.

use chrono::{DateTime, Utc};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// A single entry in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Fixed text shown in place of a reply when anything goes wrong.
pub const APOLOGY: &str = "Sorry, I am not working right now. Please try again later.";

/// Insertion-ordered message history. Messages are never removed; the only
/// in-place mutation is growing the trailing agent entry while a response
/// streams in.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the user's submitted text exactly as typed.
    pub fn push_user(&mut self, content: String) {
        self.messages.push(Message::new(Role::User, content));
    }

    /// Append the empty agent placeholder that the streamed reply grows into.
    pub fn begin_agent_reply(&mut self) {
        self.messages.push(Message::new(Role::Agent, String::new()));
    }

    /// Overwrite the trailing agent entry with the accumulated reply so far.
    /// Ignored if no reply is in progress.
    pub fn set_agent_reply(&mut self, content: String) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Agent {
                last.content = content;
            }
        }
    }

    /// Replace the in-progress reply (or append, when the request failed
    /// before a placeholder existed) with the fixed apology text.
    pub fn fail_agent_reply(&mut self) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Agent => last.content = APOLOGY.to_string(),
            _ => self.messages.push(Message::new(Role::Agent, APOLOGY.to_string())),
        }
    }
}
