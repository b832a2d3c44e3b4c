//! Prelude - Import everything you need with one line.
//!
//! # Usage
//!
//! ```rust
//! use fabula_core::prelude::*;
//! ```
//!
//! This imports the types most sessions touch:
//!
//! ## Core
//! - [`Session`] - Configured roster + memory, runnable any number of times
//! - [`SessionConfig`] - Budget, policies, and role designations
//! - [`SessionOutcome`] - Transcript, rounds, termination reason, moral
//!
//! ## Participants
//! - [`LlmParticipant`] - Backed by a language model
//! - [`HumanParticipant`] - Fed by an input channel
//! - [`ScriptedParticipant`] - Replays fixed lines

pub use crate::config::{FailurePolicy, SessionConfig};
pub use crate::controller::SessionOutcome;
pub use crate::error::SessionError;
pub use crate::memory::{InMemoryStore, MemoryStore, SharedMemoryStore};
pub use crate::participant::{
    HumanParticipant, LlmParticipant, Participant, ScriptedParticipant, SharedParticipant,
};
pub use crate::scheduler::SelectionPolicy;
pub use crate::session::Session;
pub use crate::types::{Message, ParticipantId, TerminationReason};
