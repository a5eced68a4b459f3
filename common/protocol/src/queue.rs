//! Queued commands submitted while a turn is in flight.
//!
//! A `user_message` received while the session is `busy` is rejected on
//! the wire (§8 boundary behavior: "two consecutive user_messages while
//! busy → second rejected with busy"); this module exists for the client
//! conductor, which queues such messages locally and resubmits them once
//! `session_busy {busy:false}` arrives, rather than dropping user input.

use serde::Deserialize;
use serde::Serialize;

/// A user message the client conductor is holding until the session goes idle.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQueuedCommand {
    /// Matches the eventual `clientMessageId` used for optimistic-echo dedup.
    pub id: String,
    pub prompt: String,
    pub queued_at_millis: i64,
}

impl UserQueuedCommand {
    pub fn new(prompt: impl Into<String>, now_millis: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            queued_at_millis: now_millis,
        }
    }

    /// First `max_len` chars, for a queued-list UI preview.
    pub fn preview(&self, max_len: usize) -> String {
        if self.prompt.chars().count() <= max_len {
            self.prompt.clone()
        } else {
            let truncated: String = self.prompt.chars().take(max_len).collect();
            format!("{truncated}...")
        }
    }
}

/// Where a steering/system breadcrumb originated.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringSource {
    User,
    Hook,
    System,
}

impl SteeringSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Hook => "hook",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for SteeringSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A hidden guidance attachment, injected as a breadcrumb rather than a
/// visible feed item.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringAttachment {
    pub id: String,
    pub text: String,
    pub source: SteeringSource,
}

impl SteeringAttachment {
    pub fn new(text: impl Into<String>, source: SteeringSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            source,
        }
    }
}
