//! Core types for the conversation engine.
//!
//! Defines participant identifiers, transcript messages, and the transcript
//! itself. The transcript is the single shared resource of a session: the
//! controller is its only writer, participants receive read-only borrows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Unique identifier for a conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// MESSAGE
// ============================================================================

/// A single message in a session transcript.
///
/// Messages are immutable once created; ordering is defined by `seq`, which
/// the transcript assigns monotonically with no gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub sender: ParticipantId,
    /// The message text.
    pub content: String,
    /// Monotonic, unique sequence number within the session.
    pub seq: u64,
    /// When the message was appended.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.seq, self.sender, self.content)
    }
}

// ============================================================================
// TRANSCRIPT
// ============================================================================

/// The ordered, append-only record of all messages in a session.
///
/// Exclusively owned and mutated by the conversation controller; everyone
/// else reads it through shared borrows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    next_seq: u64,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning the next sequence number.
    pub fn push(&mut self, sender: ParticipantId, content: impl Into<String>) -> &Message {
        let message = Message {
            sender,
            content: content.into(),
            seq: self.next_seq,
            created_at: Utc::now(),
        };
        self.next_seq += 1;
        let idx = self.messages.len();
        self.messages.push(message);
        &self.messages[idx]
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent message from a given sender.
    pub fn last_from(&self, sender: &ParticipantId) -> Option<&Message> {
        self.messages.iter().rev().find(|m| &m.sender == sender)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the transcript, yielding the message list.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

// ============================================================================
// TERMINATION REASON
// ============================================================================

/// Why a session stopped.
///
/// All of these are defined terminal outcomes, not failures; an aborted
/// session surfaces as an error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The configured termination keyword was emitted.
    Keyword,
    /// The round budget was exhausted without a termination signal.
    OutOfBudget,
    /// No participant was eligible to speak.
    NoEligibleSpeakers,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Keyword => write!(f, "termination keyword"),
            TerminationReason::OutOfBudget => write!(f, "round budget exhausted"),
            TerminationReason::NoEligibleSpeakers => write!(f, "no eligible speakers"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
