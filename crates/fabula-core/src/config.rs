//! Session configuration.

use std::time::Duration;

use crate::scheduler::SelectionPolicy;
use crate::types::ParticipantId;

/// What to do when a round's generation retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the session, surfacing the partial transcript.
    #[default]
    Abort,
    /// Append an error-marker message and keep going.
    SubstituteMarker,
}

/// Recognized session options.
///
/// Defaults mirror the production story workshop: round-robin selection with
/// repeats allowed, a 30-round budget, and the planner both directing and
/// declaring completion.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard budget on rounds per session.
    pub max_rounds: usize,
    /// Whether round-robin may pick the same speaker twice in a row.
    pub allow_repeat_speaker: bool,
    /// Speaker selection policy.
    pub selection_policy: SelectionPolicy,
    /// Additional attempts per round after the first failure.
    pub retry_bound: usize,
    /// Keyword that terminates the session (matched case-insensitively).
    pub termination_keyword: String,
    /// What to do once retries are exhausted.
    pub failure_policy: FailurePolicy,
    /// Optional per-generation timeout.
    pub call_timeout: Option<Duration>,
    /// Keep participant memory across sessions (the reference behavior).
    pub preserve_memory: bool,
    /// Sender of the seeded topic message.
    pub seed_sender: ParticipantId,
    /// Distinguished coordinating participant (directive source).
    pub director: Option<ParticipantId>,
    /// Participant whose messages can carry the termination keyword.
    /// `None` accepts the keyword from anyone.
    pub terminator: Option<ParticipantId>,
    /// Role whose final message is reported as the extracted moral.
    pub extractor: Option<ParticipantId>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 30,
            allow_repeat_speaker: true,
            selection_policy: SelectionPolicy::RoundRobin,
            retry_bound: 2,
            termination_keyword: "the process is complete".to_string(),
            failure_policy: FailurePolicy::Abort,
            call_timeout: None,
            preserve_memory: true,
            seed_sender: ParticipantId::new("user_proxy"),
            director: None,
            terminator: None,
            extractor: None,
        }
    }
}

impl SessionConfig {
    /// Create a config with reference defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round budget.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Allow or forbid immediate repeats under round-robin.
    #[must_use]
    pub fn with_allow_repeat_speaker(mut self, allow: bool) -> Self {
        self.allow_repeat_speaker = allow;
        self
    }

    /// Set the selection policy.
    #[must_use]
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Set the per-round retry bound.
    #[must_use]
    pub fn with_retry_bound(mut self, bound: usize) -> Self {
        self.retry_bound = bound;
        self
    }

    /// Set the termination keyword.
    #[must_use]
    pub fn with_termination_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.termination_keyword = keyword.into();
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the per-generation timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Clear participant memory at the start of each session.
    #[must_use]
    pub fn with_fresh_memory(mut self) -> Self {
        self.preserve_memory = false;
        self
    }

    /// Set the seed message sender.
    #[must_use]
    pub fn with_seed_sender(mut self, sender: impl Into<ParticipantId>) -> Self {
        self.seed_sender = sender.into();
        self
    }

    /// Designate the coordinating director.
    #[must_use]
    pub fn with_director(mut self, director: impl Into<ParticipantId>) -> Self {
        self.director = Some(director.into());
        self
    }

    /// Restrict the termination keyword to one participant.
    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<ParticipantId>) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    /// Designate the moral extractor role.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl Into<ParticipantId>) -> Self {
        self.extractor = Some(extractor.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mirror_reference_workflow() {
        let config = SessionConfig::default();
        assert_eq!(config.max_rounds, 30);
        assert!(config.allow_repeat_speaker);
        assert_eq!(config.selection_policy, SelectionPolicy::RoundRobin);
        assert_eq!(config.termination_keyword, "the process is complete");
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.preserve_memory);
    }

    #[test]
    fn test_builder_chain() {
        let config = SessionConfig::new()
            .with_max_rounds(6)
            .with_allow_repeat_speaker(false)
            .with_selection_policy(SelectionPolicy::DirectorSelected)
            .with_director("planning_agent")
            .with_terminator("planning_agent")
            .with_extractor("moral_extractor")
            .with_retry_bound(1)
            .with_call_timeout(Duration::from_secs(120));

        assert_eq!(config.max_rounds, 6);
        assert!(!config.allow_repeat_speaker);
        assert_eq!(config.director, Some(ParticipantId::new("planning_agent")));
        assert_eq!(config.call_timeout, Some(Duration::from_secs(120)));
    }
}
