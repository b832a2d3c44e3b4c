//! # fabula-core
//!
//! Turn-based multi-role conversation engine for collaborative story
//! generation.
//!
//! This crate provides:
//! - [`Participant`] - A named role that can produce one response per turn
//! - [`MemoryStore`] - Per-participant append-only notes consulted each turn
//! - [`TurnScheduler`] - Round-robin or director-selected speaker choice
//! - [`ConversationController`] - The phase machine driving rounds to
//!   termination
//! - [`Session`] - The entry point tying roster, memory, and config together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fabula_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new()
//!         .with_max_rounds(30)
//!         .with_terminator("planning_agent")
//!         .with_extractor("moral_extractor");
//!
//!     let session = Session::new(config)
//!         .with_participant(Arc::new(ScriptedParticipant::new(
//!             "planning_agent",
//!             ["Let's begin. The process is complete."],
//!         )));
//!
//!     let outcome = session.run_session("friendship").await?;
//!     println!("finished after {} rounds", outcome.rounds);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod participant;
pub mod prelude;
pub mod scheduler;
pub mod session;
pub mod types;

pub use config::{FailurePolicy, SessionConfig};
pub use controller::{ConversationController, Phase, SessionOutcome};
pub use error::{GenerationError, MemoryError, SchedulerError, SessionError};
pub use memory::{InMemoryStore, MemoryStore, SharedMemoryStore};
pub use participant::{
    HumanParticipant, LlmParticipant, Participant, ScriptedParticipant, SharedParticipant,
    NO_RESPONSE,
};
pub use scheduler::{SelectionPolicy, TurnScheduler};
pub use session::Session;
pub use types::{Message, ParticipantId, TerminationReason, Transcript};
