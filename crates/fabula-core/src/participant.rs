//! Participants - the conversational roles.
//!
//! A participant is a named role with an immutable role prompt and the
//! capability to produce one response given the shared transcript and its own
//! memory notes. Participants are stateless between rounds; all conversation
//! state lives in the transcript, all private state in the memory store.
//!
//! Three implementations:
//! - [`LlmParticipant`] - backed by an [`LLMAdapter`] (the normal case)
//! - [`HumanParticipant`] - suspends on an external input channel
//! - [`ScriptedParticipant`] - replays fixed lines (tests and demos)

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use fabula_llm::{LLMAdapter, LLMMessage};

use crate::error::GenerationError;
use crate::types::{ParticipantId, Transcript};

/// Sentinel content returned when a human participant's input times out.
///
/// A defined "no response" beats blocking the session forever.
pub const NO_RESPONSE: &str = "[no response]";

// ============================================================================
// PARTICIPANT TRAIT
// ============================================================================

/// A role in the conversation.
///
/// `respond` has no side effects beyond producing text; memory is mutated
/// only through the store's explicit `remember` operation.
#[async_trait]
pub trait Participant: Send + Sync {
    /// The participant's unique identifier.
    fn id(&self) -> &ParticipantId;

    /// Whether this participant is currently eligible to speak.
    fn is_active(&self) -> bool {
        true
    }

    /// Produce a response given the transcript so far and this participant's
    /// own memory notes.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the underlying capability fails; the
    /// controller decides whether to retry the round or abort the session.
    async fn respond(
        &self,
        transcript: &Transcript,
        memory: &[String],
    ) -> Result<String, GenerationError>;
}

/// Arc-wrapped participant for roster sharing.
pub type SharedParticipant = Arc<dyn Participant>;

// ============================================================================
// LLM PARTICIPANT
// ============================================================================

/// A participant backed by a language model.
pub struct LlmParticipant<L: LLMAdapter> {
    id: ParticipantId,
    role_prompt: String,
    llm: Arc<L>,
    active: bool,
}

impl<L: LLMAdapter> LlmParticipant<L> {
    /// Create a new LLM-backed participant.
    pub fn new(id: impl Into<ParticipantId>, llm: Arc<L>) -> Self {
        Self {
            id: id.into(),
            role_prompt: String::new(),
            llm,
            active: true,
        }
    }

    /// Set the role prompt (the participant's standing instructions).
    #[must_use]
    pub fn with_role_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.role_prompt = prompt.into();
        self
    }

    /// Mark the participant as inactive (ineligible to speak).
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// The role prompt.
    pub fn role_prompt(&self) -> &str {
        &self.role_prompt
    }

    /// Build the provider messages for one response.
    ///
    /// The role prompt plus rendered memory notes become the system message.
    /// Transcript entries map to assistant (own) or name-prefixed user
    /// (everyone else) messages, so the model sees who said what.
    fn build_llm_messages(&self, transcript: &Transcript, memory: &[String]) -> Vec<LLMMessage> {
        let mut system = self.role_prompt.clone();
        if !memory.is_empty() {
            let notes = memory
                .iter()
                .map(|n| format!("- {n}"))
                .collect::<Vec<_>>()
                .join("\n");
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str(&format!("Relevant notes:\n{notes}"));
        }

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if !system.is_empty() {
            messages.push(LLMMessage::system(system));
        }

        for msg in transcript.messages() {
            if msg.sender == self.id {
                messages.push(LLMMessage::assistant(&msg.content));
            } else {
                messages.push(LLMMessage::user(format!("{}: {}", msg.sender, msg.content)));
            }
        }

        messages
    }
}

#[async_trait]
impl<L: LLMAdapter + 'static> Participant for LlmParticipant<L> {
    fn id(&self) -> &ParticipantId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    async fn respond(
        &self,
        transcript: &Transcript,
        memory: &[String],
    ) -> Result<String, GenerationError> {
        let messages = self.build_llm_messages(transcript, memory);
        debug!(
            participant = %self.id,
            context_messages = messages.len(),
            "invoking LLM"
        );

        let response = self.llm.generate(&messages).await?;
        Ok(response.content)
    }
}

// ============================================================================
// HUMAN PARTICIPANT
// ============================================================================

/// A participant whose responses come from an external input channel.
///
/// `respond` suspends on the channel; with a timeout configured, expiry
/// yields the [`NO_RESPONSE`] sentinel instead of blocking the session.
pub struct HumanParticipant {
    id: ParticipantId,
    input: Mutex<mpsc::Receiver<String>>,
    timeout: Option<Duration>,
}

impl HumanParticipant {
    /// Create a human participant fed by `input`.
    pub fn new(id: impl Into<ParticipantId>, input: mpsc::Receiver<String>) -> Self {
        Self {
            id: id.into(),
            input: Mutex::new(input),
            timeout: None,
        }
    }

    /// Give up waiting for input after `timeout`, yielding [`NO_RESPONSE`].
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Participant for HumanParticipant {
    fn id(&self) -> &ParticipantId {
        &self.id
    }

    async fn respond(
        &self,
        _transcript: &Transcript,
        _memory: &[String],
    ) -> Result<String, GenerationError> {
        let mut input = self.input.lock().await;

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, input.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(NO_RESPONSE.to_string()),
            },
            None => input.recv().await,
        };

        received.ok_or(GenerationError::InputClosed)
    }
}

// ============================================================================
// SCRIPTED PARTICIPANT
// ============================================================================

/// A participant that replays a fixed script, line by line.
///
/// Cycles back to the first line when the script runs out. Used by demos and
/// tests; never calls out.
pub struct ScriptedParticipant {
    id: ParticipantId,
    lines: Mutex<VecDeque<String>>,
    active: bool,
}

impl ScriptedParticipant {
    /// Create a scripted participant from its lines.
    pub fn new(
        id: impl Into<ParticipantId>,
        lines: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
            active: true,
        }
    }

    /// Mark the participant as inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[async_trait]
impl Participant for ScriptedParticipant {
    fn id(&self) -> &ParticipantId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    async fn respond(
        &self,
        _transcript: &Transcript,
        _memory: &[String],
    ) -> Result<String, GenerationError> {
        let mut lines = self.lines.lock().await;
        match lines.pop_front() {
            Some(line) => {
                // Cycle so the script never runs dry mid-session.
                lines.push_back(line.clone());
                Ok(line)
            }
            None => Ok(NO_RESPONSE.to_string()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fabula_llm::{FinishReason, LLMError, LLMResponse, TokenUsage};

    // Mock LLM that echoes a canned reply and records nothing.
    struct MockLLM {
        reply: String,
    }

    #[async_trait]
    impl LLMAdapter for MockLLM {
        fn provider(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn generate(&self, _messages: &[LLMMessage]) -> Result<LLMResponse, LLMError> {
            Ok(LLMResponse {
                content: self.reply.clone(),
                tokens_used: TokenUsage::default(),
                finish_reason: FinishReason::Stop,
                model: "mock-model".into(),
            })
        }

        async fn health_check(&self) -> Result<bool, LLMError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_llm_participant_respond() {
        let llm = Arc::new(MockLLM {
            reply: "A story begins.".into(),
        });
        let writer = LlmParticipant::new("story_writer", llm)
            .with_role_prompt("You are a creative story writer.");

        let mut transcript = Transcript::new();
        transcript.push("user_proxy".into(), "Write about friendship");

        let content = writer.respond(&transcript, &[]).await.unwrap();
        assert_eq!(content, "A story begins.");
    }

    #[test]
    fn test_llm_message_mapping() {
        let llm = Arc::new(MockLLM { reply: "".into() });
        let writer = LlmParticipant::new("writer", llm)
            .with_role_prompt("Write stories.");

        let mut transcript = Transcript::new();
        transcript.push("planner".into(), "Writer, draft please");
        transcript.push("writer".into(), "Here is a draft");
        transcript.push("reviewer".into(), "Tighten the pacing");

        let memory = vec!["Always write vivid stories.".to_string()];
        let messages = writer.build_llm_messages(&transcript, &memory);

        // system + 3 transcript entries
        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.contains("Write stories."));
        assert!(messages[0].content.contains("- Always write vivid stories."));
        // Others arrive name-prefixed as user turns; own messages as assistant.
        assert_eq!(messages[1].content, "planner: Writer, draft please");
        assert_eq!(messages[2].content, "Here is a draft");
        assert_eq!(messages[3].content, "reviewer: Tighten the pacing");
    }

    #[tokio::test]
    async fn test_human_participant_receives_input() {
        let (tx, rx) = mpsc::channel(1);
        let human = HumanParticipant::new("user_proxy", rx);

        tx.send("Looks good to me".to_string()).await.unwrap();

        let transcript = Transcript::new();
        let content = human.respond(&transcript, &[]).await.unwrap();
        assert_eq!(content, "Looks good to me");
    }

    #[tokio::test]
    async fn test_human_participant_timeout_sentinel() {
        let (_tx, rx) = mpsc::channel::<String>(1);
        let human =
            HumanParticipant::new("user_proxy", rx).with_timeout(Duration::from_millis(10));

        let transcript = Transcript::new();
        let content = human.respond(&transcript, &[]).await.unwrap();
        assert_eq!(content, NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_human_participant_closed_channel() {
        let (tx, rx) = mpsc::channel::<String>(1);
        drop(tx);
        let human = HumanParticipant::new("user_proxy", rx);

        let transcript = Transcript::new();
        let err = human.respond(&transcript, &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::InputClosed));
    }

    #[tokio::test]
    async fn test_scripted_participant_cycles() {
        let scripted = ScriptedParticipant::new("reviewer", ["first", "second"]);
        let transcript = Transcript::new();

        assert_eq!(scripted.respond(&transcript, &[]).await.unwrap(), "first");
        assert_eq!(scripted.respond(&transcript, &[]).await.unwrap(), "second");
        assert_eq!(scripted.respond(&transcript, &[]).await.unwrap(), "first");
    }
}
