//! Conversation types and state management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged turn as handed to the model gateway and the memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A cited source attached to an assistant answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
}

/// A message in a chat session transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// Sources the gateway cited for this answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,

    /// Set on the placeholder shown while a send is in flight
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_searching: bool,
}

impl ChatMessage {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            sources: Vec::new(),
            is_searching: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            sources,
            ..Self::new(Role::Assistant, content.into())
        }
    }

    /// The "thinking" entry that stands in for a pending answer
    pub fn thinking() -> Self {
        Self {
            is_searching: true,
            ..Self::new(Role::Assistant, String::new())
        }
    }

    pub fn to_turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// One conversation thread with its own transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: "New Chat".to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transcript without in-flight placeholders
    pub fn transcript(&self) -> Vec<Turn> {
        self.messages
            .iter()
            .filter(|m| !m.is_searching)
            .map(ChatMessage::to_turn)
            .collect()
    }

    /// Label derived from the opening message, used when the session is summarized
    pub fn summary_title(&self) -> String {
        match self.messages.first() {
            Some(first) if !first.content.is_empty() => first.content.chars().take(50).collect(),
            _ => "Chat".to_string(),
        }
    }

    pub fn remove_placeholders(&mut self) {
        self.messages.retain(|m| !m.is_searching);
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
