//! Session entry point.
//!
//! A [`Session`] holds the fixed roster, the memory store, and the
//! configuration, and can be run any number of times. Each `run_session`
//! call builds a fresh controller and scheduler, so nothing mutable leaks
//! between runs; memory is the one deliberately shared piece of state (the
//! reference behavior preserves it across sessions).

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::controller::{ConversationController, SessionOutcome};
use crate::error::SessionError;
use crate::memory::{InMemoryStore, SharedMemoryStore};
use crate::participant::SharedParticipant;
use crate::types::ParticipantId;

/// A reusable, configured conversation session.
pub struct Session {
    config: SessionConfig,
    participants: Vec<SharedParticipant>,
    memory: SharedMemoryStore,
}

impl Session {
    /// Create a session with the given configuration and an in-memory store.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            participants: Vec::new(),
            memory: InMemoryStore::shared(),
        }
    }

    /// Add a participant to the roster (order defines round-robin order).
    #[must_use]
    pub fn with_participant(mut self, participant: SharedParticipant) -> Self {
        self.participants.push(participant);
        self
    }

    /// Add several participants at once.
    #[must_use]
    pub fn with_participants(
        mut self,
        participants: impl IntoIterator<Item = SharedParticipant>,
    ) -> Self {
        self.participants.extend(participants);
        self
    }

    /// Use a custom memory store.
    #[must_use]
    pub fn with_memory(mut self, memory: SharedMemoryStore) -> Self {
        self.memory = memory;
        self
    }

    /// The session's memory store.
    pub fn memory(&self) -> &SharedMemoryStore {
        &self.memory
    }

    /// Pre-seed participant memories.
    ///
    /// The notes are independent, so they are stored as unordered concurrent
    /// tasks joined before returning. Capacity overflow drops the note with a
    /// warning; it never fails the setup.
    pub async fn preseed_memory(
        &self,
        seeds: impl IntoIterator<Item = (ParticipantId, String)>,
    ) {
        let tasks = seeds.into_iter().map(|(participant, note)| {
            let memory = self.memory.clone();
            async move {
                if let Err(e) = memory.remember(&participant, note).await {
                    warn!(%participant, error = %e, "dropping pre-seeded note");
                }
            }
        });
        join_all(tasks).await;
    }

    /// Run one session from seeded topic to termination or abort.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Aborted`] with the partial transcript when a
    /// round exhausts its retries under the abort policy.
    pub async fn run_session(&self, topic: &str) -> Result<SessionOutcome, SessionError> {
        if !self.config.preserve_memory {
            self.memory.clear_all().await;
        }

        let mut controller = ConversationController::new(
            self.config.clone(),
            self.participants.clone(),
            self.memory.clone(),
        );

        info!(
            session = controller.session_id(),
            topic,
            participants = self.participants.len(),
            "starting session"
        );

        controller.seed(self.seed_message(topic));
        controller.run().await
    }

    /// The round-0 message: the topic, plus an instruction for the
    /// coordinating director when one is configured.
    fn seed_message(&self, topic: &str) -> String {
        match &self.config.director {
            Some(director) => format!(
                "Let's create a story about: {topic}\n\n{director}, please manage the workflow."
            ),
            None => format!("Let's create a story about: {topic}"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ScriptedParticipant;
    use crate::scheduler::SelectionPolicy;
    use crate::types::TerminationReason;
    use std::sync::Arc;

    fn scripted(id: &str, lines: &[&str]) -> SharedParticipant {
        Arc::new(ScriptedParticipant::new(id, lines.iter().copied()))
    }

    fn workshop() -> Session {
        let config = SessionConfig::new()
            .with_selection_policy(SelectionPolicy::DirectorSelected)
            .with_director("planning_agent")
            .with_terminator("planning_agent")
            .with_extractor("moral_extractor")
            .with_seed_sender("user_proxy");

        Session::new(config)
            .with_participant(scripted(
                "planning_agent",
                &[
                    "Topic confirmed, over to the writer.\nNEXT: story_writer",
                    "Time for feedback.\nNEXT: story_reviewer",
                    "Extract the moral now.\nNEXT: moral_extractor",
                    "Great work everyone. The process is complete.",
                ],
            ))
            .with_participant(scripted("story_writer", &["Once there were two friends."]))
            .with_participant(scripted(
                "story_reviewer",
                &["Strong draft; tighten the middle."],
            ))
            .with_participant(scripted(
                "moral_extractor",
                &["Moral: true friends share burdens."],
            ))
    }

    #[tokio::test]
    async fn test_directed_workshop_runs_to_completion() {
        let session = workshop();
        let outcome = session.run_session("friendship").await.unwrap();

        assert_eq!(outcome.reason, TerminationReason::Keyword);
        // Seed + planner/writer/planner/reviewer/planner/extractor/planner.
        assert_eq!(outcome.rounds, 7);
        assert_eq!(outcome.transcript.len(), 8);
        assert_eq!(
            outcome.moral.as_deref(),
            Some("Moral: true friends share burdens.")
        );

        let senders: Vec<&str> = outcome
            .transcript
            .iter()
            .map(|m| m.sender.as_str())
            .collect();
        assert_eq!(
            senders,
            vec![
                "user_proxy",
                "planning_agent",
                "story_writer",
                "planning_agent",
                "story_reviewer",
                "planning_agent",
                "moral_extractor",
                "planning_agent",
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_message_names_the_director() {
        let session = workshop();
        let outcome = session.run_session("perseverance").await.unwrap();

        let seed = &outcome.transcript[0];
        assert_eq!(seed.sender.as_str(), "user_proxy");
        assert!(seed.content.contains("perseverance"));
        assert!(seed.content.contains("planning_agent, please manage the workflow."));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let session = workshop();

        let first = session.run_session("friendship").await.unwrap();
        let second = session.run_session("friendship").await.unwrap();

        // Fresh scheduler and transcript per run: same policy behavior,
        // distinct session identities.
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.rounds, second.rounds);
        assert_eq!(first.transcript.len(), second.transcript.len());
        for (a, b) in first.transcript.iter().zip(second.transcript.iter()) {
            assert_eq!(a.sender, b.sender);
            assert_eq!(a.seq, b.seq);
        }
    }

    #[tokio::test]
    async fn test_preseed_memory_joins_independent_tasks() {
        let session = workshop();
        session
            .preseed_memory([
                (
                    ParticipantId::new("story_writer"),
                    "Always write vivid and imaginative stories.".to_string(),
                ),
                (
                    ParticipantId::new("story_reviewer"),
                    "Focus on constructive critique with examples.".to_string(),
                ),
                (
                    ParticipantId::new("moral_extractor"),
                    "Try to link morals to real-world values.".to_string(),
                ),
            ])
            .await;

        let writer_notes = session
            .memory()
            .notes(&ParticipantId::new("story_writer"))
            .await;
        assert_eq!(writer_notes, vec!["Always write vivid and imaginative stories."]);
    }

    #[tokio::test]
    async fn test_memory_preserved_across_sessions_by_default() {
        let session = workshop();
        let writer = ParticipantId::new("story_writer");
        session
            .preseed_memory([(writer.clone(), "vivid imagery".to_string())])
            .await;

        session.run_session("friendship").await.unwrap();
        session.run_session("courage").await.unwrap();

        assert_eq!(session.memory().notes(&writer).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_memory_config_clears_between_sessions() {
        let config = SessionConfig::new()
            .with_max_rounds(2)
            .with_fresh_memory();
        let session = Session::new(config)
            .with_participant(scripted("planner", &["Working on it."]));

        let planner = ParticipantId::new("planner");
        session
            .preseed_memory([(planner.clone(), "stale note".to_string())])
            .await;

        session.run_session("anything").await.unwrap();
        assert!(session.memory().notes(&planner).await.is_empty());
    }
}
