//! Engine error types.
//!
//! Each concern gets its own `thiserror` enum. Per-round failures
//! ([`GenerationError`], [`SchedulerError`], [`MemoryError`]) are handled
//! locally by the controller (retry, fallback, drop-and-log); only
//! [`SessionError`] reaches the caller.

use thiserror::Error;

use crate::types::{Message, ParticipantId};

/// Errors producing a single participant response.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The underlying language-model capability failed.
    #[error("LLM error: {0}")]
    Llm(#[from] fabula_llm::LLMError),

    /// The per-call timeout expired before a response arrived.
    #[error("Generation timed out")]
    Timeout,

    /// The external input channel for a human participant closed.
    #[error("Input channel closed")]
    InputClosed,
}

impl GenerationError {
    /// Whether retrying the same round could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Llm(e) => e.is_retryable(),
            GenerationError::Timeout => true,
            GenerationError::InputClosed => false,
        }
    }
}

/// Errors appending to a participant's memory.
///
/// Memory failures are never fatal: the controller drops the note and logs.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The store refused the note because the participant's log is full.
    #[error("Memory capacity reached ({limit} notes) for {participant}")]
    Capacity {
        participant: ParticipantId,
        limit: usize,
    },

    /// Backend storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors resolving the next speaker from a director directive.
///
/// Recovered internally by falling back to round-robin on the same round.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The latest director message carried no parseable directive.
    #[error("No directive found in the director's last message")]
    DirectiveMissing,

    /// The directive named a participant that does not exist or is inactive.
    #[error("Directive names unknown or ineligible participant: {name}")]
    InvalidDirective { name: String },
}

/// Session-level failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Retries were exhausted on a round; the session cannot continue.
    ///
    /// Carries everything produced before the failing round.
    #[error("Session aborted after {rounds} rounds: {source}")]
    Aborted {
        /// Rounds completed before the abort.
        rounds: usize,
        /// The partial transcript up to (not including) the failed round.
        transcript: Vec<Message>,
        /// The final generation failure.
        #[source]
        source: GenerationError,
    },
}

impl SessionError {
    /// The partial transcript attached to the failure.
    pub fn partial_transcript(&self) -> &[Message] {
        match self {
            SessionError::Aborted { transcript, .. } => transcript,
        }
    }
}
