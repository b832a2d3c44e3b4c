//! Conversation controller - owns the transcript and drives rounds.
//!
//! The controller runs an explicit phase machine:
//!
//! ```text
//! Idle → AwaitingSpeaker → Generating → Appending → CheckingTermination
//!              ▲                                          │
//!              └──────────── round budget left ───────────┤
//!                                                         ▼
//!                                                     Terminated
//! ```
//!
//! One round = one scheduler decision, one participant response, one
//! transcript append. Per-round generation failures are retried up to the
//! configured bound; exhaustion either substitutes an error-marker message or
//! aborts the session with the partial transcript attached, per
//! [`FailurePolicy`](crate::config::FailurePolicy).

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{FailurePolicy, SessionConfig};
use crate::error::{GenerationError, SessionError};
use crate::memory::SharedMemoryStore;
use crate::participant::SharedParticipant;
use crate::scheduler::TurnScheduler;
use crate::types::{Message, TerminationReason, Transcript};

// ============================================================================
// PHASE
// ============================================================================

/// Controller phase within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Session not yet seeded.
    Idle,
    /// Waiting for the scheduler to pick a speaker.
    AwaitingSpeaker,
    /// A participant is producing a response.
    Generating,
    /// Appending the response to the transcript.
    Appending,
    /// Evaluating termination conditions.
    CheckingTermination,
    /// Session over; the phase never leaves this state.
    Terminated,
}

// ============================================================================
// SESSION OUTCOME
// ============================================================================

/// Result of a completed (non-aborted) session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    /// Unique identifier for this run.
    pub session_id: String,
    /// The full ordered transcript.
    pub transcript: Vec<Message>,
    /// Rounds completed (seed message excluded).
    pub rounds: usize,
    /// Why the session stopped.
    pub reason: TerminationReason,
    /// Content of the extractor's final message, when one is designated.
    pub moral: Option<String>,
}

// ============================================================================
// CONVERSATION CONTROLLER
// ============================================================================

/// Drives one session from seeded topic to termination or abort.
///
/// Exclusively owns the transcript; participants only ever see shared
/// borrows of it.
pub struct ConversationController {
    config: SessionConfig,
    participants: Vec<SharedParticipant>,
    memory: SharedMemoryStore,
    scheduler: TurnScheduler,
    session_id: String,
    transcript: Transcript,
    round: usize,
    phase: Phase,
}

impl ConversationController {
    /// Create a controller for one session.
    pub fn new(
        config: SessionConfig,
        participants: Vec<SharedParticipant>,
        memory: SharedMemoryStore,
    ) -> Self {
        let mut scheduler = TurnScheduler::new(config.selection_policy)
            .with_allow_repeat_speaker(config.allow_repeat_speaker);
        if let Some(director) = &config.director {
            scheduler = scheduler.with_director(director.clone());
        }

        Self {
            config,
            participants,
            memory,
            scheduler,
            session_id: format!("session-{}", Uuid::new_v4()),
            transcript: Transcript::new(),
            round: 0,
            phase: Phase::Idle,
        }
    }

    /// This run's identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Append the seed topic message as round 0 and arm the phase machine.
    pub fn seed(&mut self, content: impl Into<String>) {
        let sender = self.config.seed_sender.clone();
        self.transcript.push(sender, content);
        self.phase = Phase::AwaitingSpeaker;
    }

    /// Run the session to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] when a round's retries are exhausted
    /// under [`FailurePolicy::Abort`]; the partial transcript rides along.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        if self.phase == Phase::Idle {
            // Defensive: an unseeded session has nothing to talk about.
            self.phase = Phase::Terminated;
            return Ok(self.finish(TerminationReason::NoEligibleSpeakers));
        }

        let mut pending_speaker: Option<SharedParticipant> = None;
        let mut pending_content: Option<String> = None;

        let reason = loop {
            match self.phase {
                Phase::AwaitingSpeaker => {
                    let selected = self
                        .scheduler
                        .next_speaker(&self.transcript, &self.participants)
                        .and_then(|id| {
                            self.participants.iter().find(|p| p.id() == &id).cloned()
                        });
                    match selected {
                        Some(speaker) => {
                            pending_speaker = Some(speaker);
                            self.phase = Phase::Generating;
                        }
                        None => break TerminationReason::NoEligibleSpeakers,
                    }
                }
                Phase::Generating => {
                    let Some(speaker) = pending_speaker.clone() else {
                        // AwaitingSpeaker always sets the speaker first.
                        break TerminationReason::NoEligibleSpeakers;
                    };
                    match self.generate_with_retries(&speaker).await {
                        Ok(content) => {
                            pending_content = Some(content);
                            self.phase = Phase::Appending;
                        }
                        Err(e) => match self.config.failure_policy {
                            FailurePolicy::SubstituteMarker => {
                                warn!(
                                    session = %self.session_id,
                                    speaker = %speaker.id(),
                                    error = %e,
                                    "substituting error marker for failed round"
                                );
                                pending_content = Some(format!("[generation error: {e}]"));
                                self.phase = Phase::Appending;
                            }
                            FailurePolicy::Abort => {
                                self.phase = Phase::Terminated;
                                return Err(SessionError::Aborted {
                                    rounds: self.round,
                                    transcript: self.transcript.into_messages(),
                                    source: e,
                                });
                            }
                        },
                    }
                }
                Phase::Appending => {
                    let sender = match pending_speaker.take() {
                        Some(speaker) => speaker.id().clone(),
                        None => self.config.seed_sender.clone(),
                    };
                    let content = pending_content.take().unwrap_or_default();
                    let message = self.transcript.push(sender, content);
                    debug!(session = %self.session_id, message = %message, "appended");
                    self.round += 1;
                    self.phase = Phase::CheckingTermination;
                }
                Phase::CheckingTermination => {
                    if self.termination_signaled() {
                        break TerminationReason::Keyword;
                    }
                    if self.round >= self.config.max_rounds {
                        break TerminationReason::OutOfBudget;
                    }
                    self.phase = Phase::AwaitingSpeaker;
                }
                Phase::Idle | Phase::Terminated => break TerminationReason::NoEligibleSpeakers,
            }
        };

        self.phase = Phase::Terminated;
        Ok(self.finish(reason))
    }

    /// Invoke the speaker, retrying up to the configured bound.
    async fn generate_with_retries(
        &self,
        speaker: &SharedParticipant,
    ) -> Result<String, GenerationError> {
        let notes = self.memory.notes(speaker.id()).await;

        let mut attempt = 0usize;
        loop {
            let result = match self.config.call_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, speaker.respond(&self.transcript, &notes))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(GenerationError::Timeout),
                    }
                }
                None => speaker.respond(&self.transcript, &notes).await,
            };

            match result {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(
                        session = %self.session_id,
                        speaker = %speaker.id(),
                        attempt,
                        error = %e,
                        "generation failed"
                    );
                    if !e.is_retryable() || attempt >= self.config.retry_bound {
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Whether the latest message carries the termination signal.
    fn termination_signaled(&self) -> bool {
        let Some(last) = self.transcript.last() else {
            return false;
        };
        if let Some(terminator) = &self.config.terminator {
            if &last.sender != terminator {
                return false;
            }
        }
        last.content
            .to_lowercase()
            .contains(&self.config.termination_keyword.to_lowercase())
    }

    /// Assemble the outcome, extracting the moral when a role is designated.
    fn finish(self, reason: TerminationReason) -> SessionOutcome {
        let moral = self.config.extractor.as_ref().and_then(|extractor| {
            self.transcript
                .last_from(extractor)
                .map(|m| m.content.clone())
        });

        info!(
            session = %self.session_id,
            rounds = self.round,
            %reason,
            "session terminated"
        );

        SessionOutcome {
            session_id: self.session_id,
            transcript: self.transcript.into_messages(),
            rounds: self.round,
            reason,
            moral,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
