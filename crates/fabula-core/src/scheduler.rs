//! Turn scheduler - decides who speaks next.
//!
//! Two selection policies:
//! - [`SelectionPolicy::RoundRobin`] cycles participants in configured order,
//!   optionally skipping immediate repeats.
//! - [`SelectionPolicy::DirectorSelected`] lets a distinguished participant
//!   name the next speaker with a structured `NEXT: <id>` directive line;
//!   after anyone else speaks the floor returns to the director, and
//!   unresolvable directives fall back to round-robin on the same round.
//!
//! Edge cases: a single eligible participant is always returned; zero
//! eligible participants is reported as `None` and the controller treats it
//! as termination.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SchedulerError;
use crate::participant::SharedParticipant;
use crate::types::{ParticipantId, Transcript};

/// Directive line the director emits to name the next speaker.
///
/// Strict by design: a full line of the form `NEXT: <participant_id>`,
/// case-insensitive, last occurrence wins.
const DIRECTIVE_PATTERN: &str = r"(?mi)^\s*next\s*:\s*([A-Za-z0-9_\-]+)\s*$";

// ============================================================================
// SELECTION POLICY
// ============================================================================

/// The rule determining which participant speaks next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Cycle participants in fixed configured order.
    #[default]
    RoundRobin,
    /// The director names the next speaker via directive.
    DirectorSelected,
}

// ============================================================================
// TURN SCHEDULER
// ============================================================================

/// Per-session speaker selection state.
///
/// Constructed fresh for every session; nothing leaks between runs.
pub struct TurnScheduler {
    policy: SelectionPolicy,
    allow_repeat_speaker: bool,
    director: Option<ParticipantId>,
    directive_re: Regex,
    cursor: usize,
    last_speaker: Option<ParticipantId>,
}

impl TurnScheduler {
    /// Create a scheduler for the given policy.
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            allow_repeat_speaker: true,
            director: None,
            // Static pattern, cannot fail to compile.
            directive_re: Regex::new(DIRECTIVE_PATTERN).expect("directive pattern is valid"),
            cursor: 0,
            last_speaker: None,
        }
    }

    /// Allow or forbid the same participant speaking twice in a row under
    /// round-robin.
    #[must_use]
    pub fn with_allow_repeat_speaker(mut self, allow: bool) -> Self {
        self.allow_repeat_speaker = allow;
        self
    }

    /// Set the director whose directives drive `DirectorSelected`.
    #[must_use]
    pub fn with_director(mut self, director: impl Into<ParticipantId>) -> Self {
        self.director = Some(director.into());
        self
    }

    /// Select the next speaker, or `None` when nobody is eligible.
    pub fn next_speaker(
        &mut self,
        transcript: &Transcript,
        participants: &[SharedParticipant],
    ) -> Option<ParticipantId> {
        let eligible: Vec<ParticipantId> = participants
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id().clone())
            .collect();

        if eligible.is_empty() {
            return None;
        }
        if eligible.len() == 1 {
            let only = eligible[0].clone();
            self.last_speaker = Some(only.clone());
            return Some(only);
        }

        let pick = match self.policy {
            SelectionPolicy::RoundRobin => self.round_robin_pick(&eligible),
            SelectionPolicy::DirectorSelected => {
                match self.directed_pick(transcript, &eligible) {
                    Ok(pick) => pick,
                    Err(e) => {
                        warn!(error = %e, "directive unusable, falling back to round-robin");
                        self.round_robin_pick(&eligible)
                    }
                }
            }
        };

        debug!(speaker = %pick, "selected next speaker");
        self.last_speaker = Some(pick.clone());
        Some(pick)
    }

    /// Forget cursor and last-speaker state (new session).
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.last_speaker = None;
    }

    /// Cycle through eligible participants in configured order.
    fn round_robin_pick(&mut self, eligible: &[ParticipantId]) -> ParticipantId {
        let mut pick = eligible[self.cursor % eligible.len()].clone();
        self.cursor += 1;

        if !self.allow_repeat_speaker && Some(&pick) == self.last_speaker.as_ref() {
            // Skip to the next distinct participant; bounded because the set
            // has at least two members here.
            pick = eligible[self.cursor % eligible.len()].clone();
            self.cursor += 1;
        }

        pick
    }

    /// Resolve the next speaker under director selection.
    ///
    /// When the latest message is the director's, parse its directive; when
    /// it is anyone else's, the floor returns to the director so a new
    /// directive can be issued.
    fn directed_pick(
        &self,
        transcript: &Transcript,
        eligible: &[ParticipantId],
    ) -> Result<ParticipantId, SchedulerError> {
        let director = self
            .director
            .as_ref()
            .ok_or(SchedulerError::DirectiveMissing)?;
        let last = transcript.last().ok_or(SchedulerError::DirectiveMissing)?;

        if &last.sender != director {
            return eligible
                .iter()
                .find(|id| *id == director)
                .cloned()
                .ok_or_else(|| SchedulerError::InvalidDirective {
                    name: director.to_string(),
                });
        }

        let name = self
            .directive_re
            .captures_iter(&last.content)
            .last()
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(SchedulerError::DirectiveMissing)?;

        eligible
            .iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(&name))
            .cloned()
            .ok_or(SchedulerError::InvalidDirective { name })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ScriptedParticipant;
    use std::sync::Arc;

    fn roster(names: &[&str]) -> Vec<SharedParticipant> {
        names
            .iter()
            .map(|n| {
                Arc::new(ScriptedParticipant::new(*n, ["line"])) as SharedParticipant
            })
            .collect()
    }

    #[test]
    fn test_round_robin_cycles_in_order() {
        let participants = roster(&["planner", "writer", "reviewer"]);
        let transcript = Transcript::new();
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin);

        let picks: Vec<String> = (0..5)
            .map(|_| {
                scheduler
                    .next_speaker(&transcript, &participants)
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(picks, vec!["planner", "writer", "reviewer", "planner", "writer"]);
    }

    #[test]
    fn test_round_robin_skips_repeat_when_forbidden() {
        let participants = roster(&["a", "b"]);
        let transcript = Transcript::new();
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin)
            .with_allow_repeat_speaker(false);

        let mut previous: Option<ParticipantId> = None;
        for _ in 0..10 {
            let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
            assert_ne!(Some(&pick), previous.as_ref());
            previous = Some(pick);
        }
    }

    #[test]
    fn test_single_participant_always_selected() {
        let participants = roster(&["solo"]);
        let transcript = Transcript::new();
        // Repeat-forbidding flag is irrelevant with one participant.
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin)
            .with_allow_repeat_speaker(false);

        for _ in 0..3 {
            let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
            assert_eq!(pick.as_str(), "solo");
        }
    }

    #[test]
    fn test_zero_eligible_returns_none() {
        let participants: Vec<SharedParticipant> = vec![
            Arc::new(ScriptedParticipant::new("ghost", ["line"]).inactive()),
        ];
        let transcript = Transcript::new();
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin);

        assert!(scheduler.next_speaker(&transcript, &participants).is_none());
    }

    #[test]
    fn test_inactive_participants_are_skipped() {
        let participants: Vec<SharedParticipant> = vec![
            Arc::new(ScriptedParticipant::new("active_one", ["line"])),
            Arc::new(ScriptedParticipant::new("benched", ["line"]).inactive()),
            Arc::new(ScriptedParticipant::new("active_two", ["line"])),
        ];
        let transcript = Transcript::new();
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin);

        let picks: Vec<String> = (0..4)
            .map(|_| {
                scheduler
                    .next_speaker(&transcript, &participants)
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(picks, vec!["active_one", "active_two", "active_one", "active_two"]);
    }

    #[test]
    fn test_director_directive_selects_speaker() {
        let participants = roster(&["planner", "writer", "reviewer"]);
        let mut transcript = Transcript::new();
        transcript.push(
            "planner".into(),
            "Draft looks ready for feedback.\nNEXT: reviewer",
        );

        let mut scheduler =
            TurnScheduler::new(SelectionPolicy::DirectorSelected).with_director("planner");

        let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
        assert_eq!(pick.as_str(), "reviewer");
    }

    #[test]
    fn test_last_directive_wins() {
        let participants = roster(&["planner", "writer", "reviewer"]);
        let mut transcript = Transcript::new();
        transcript.push("planner".into(), "NEXT: writer\nActually, hold on.\nNEXT: reviewer");

        let mut scheduler =
            TurnScheduler::new(SelectionPolicy::DirectorSelected).with_director("planner");

        let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
        assert_eq!(pick.as_str(), "reviewer");
    }

    #[test]
    fn test_invalid_directive_falls_back_to_round_robin() {
        let participants = roster(&["planner", "writer"]);
        let mut transcript = Transcript::new();
        transcript.push("planner".into(), "NEXT: nobody_by_that_name");

        let mut scheduler =
            TurnScheduler::new(SelectionPolicy::DirectorSelected).with_director("planner");

        // Fallback happens on the same round: a speaker is still produced.
        let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
        assert_eq!(pick.as_str(), "planner");
    }

    #[test]
    fn test_floor_returns_to_director() {
        let participants = roster(&["planner", "writer"]);
        let mut transcript = Transcript::new();
        transcript.push("writer".into(), "Here is my draft.\nNEXT: writer");

        let mut scheduler =
            TurnScheduler::new(SelectionPolicy::DirectorSelected).with_director("planner");

        // Directives only count from the director; anyone else hands the
        // floor back so the director can issue the next one.
        let pick = scheduler.next_speaker(&transcript, &participants).unwrap();
        assert_eq!(pick.as_str(), "planner");
    }

    #[test]
    fn test_directed_pick_error_kinds() {
        let scheduler =
            TurnScheduler::new(SelectionPolicy::DirectorSelected).with_director("planner");
        let eligible = vec![ParticipantId::new("planner"), ParticipantId::new("writer")];

        let mut transcript = Transcript::new();
        transcript.push("planner".into(), "no directive here");
        assert!(matches!(
            scheduler.directed_pick(&transcript, &eligible),
            Err(SchedulerError::DirectiveMissing)
        ));

        transcript.push("planner".into(), "NEXT: ghost");
        assert!(matches!(
            scheduler.directed_pick(&transcript, &eligible),
            Err(SchedulerError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn test_reset_clears_session_state() {
        let participants = roster(&["a", "b", "c"]);
        let transcript = Transcript::new();
        let mut scheduler = TurnScheduler::new(SelectionPolicy::RoundRobin);

        let first_run: Vec<String> = (0..2)
            .map(|_| {
                scheduler
                    .next_speaker(&transcript, &participants)
                    .unwrap()
                    .to_string()
            })
            .collect();

        scheduler.reset();

        let second_run: Vec<String> = (0..2)
            .map(|_| {
                scheduler
                    .next_speaker(&transcript, &participants)
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(first_run, second_run);
    }
}
