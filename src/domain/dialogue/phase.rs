//! Tutor phases within a viva session.
//!
//! Phases guide the tutor's behavior during an active session. Unlike
//! SessionStatus (which tracks lifecycle), phases determine what kind of
//! dialogue move the tutor should make next.

use serde::{Deserialize, Serialize};

/// The current phase of tutor behavior within a session.
///
/// Transitions between phases are driven exclusively by the rule table in
/// [`PhaseController`](super::PhaseController); an event matching no rule
/// leaves the phase unchanged.
///
/// `Analyzing` is part of the phase vocabulary but is never produced by the
/// rule table: input classification completes while the session is still
/// `Listening`. It remains valid for sessions reconstituted from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorPhase {
    /// No active exchange. Waiting for the student to start.
    Idle,

    /// Student is narrating their reasoning aloud.
    /// Tutor stays quiet and lets them think.
    Listening,

    /// Student input is being classified before the tutor responds.
    Analyzing,

    /// A reasoning step was skipped. Tutor asks a clarifying question.
    Probing,

    /// Student is stalled. Tutor offers a graduated hint.
    Hinting,

    /// A reasoning step was wrong. Tutor corrects it with source material.
    Repair,

    /// Enough ground has been covered. Tutor wraps up the topic.
    Consolidating,
}

impl TutorPhase {
    /// Returns the tutor's primary directive in this phase.
    ///
    /// This directive guides the tone and purpose of generated replies.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Idle => "Wait for the student to begin. Do not volunteer content.",
            Self::Listening => "Let the student narrate their reasoning. Do not interrupt.",
            Self::Analyzing => "Classify the student's last utterance before responding.",
            Self::Probing => "Ask one short clarifying question about the unstated step.",
            Self::Hinting => {
                "Give a hint at the requested level only. Never reveal the full answer."
            }
            Self::Repair => "Correct the flawed step, grounded in the provided source material.",
            Self::Consolidating => "Summarize what was covered and suggest one next topic.",
        }
    }

    /// Returns a shorter label for the phase, suitable for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Listening => "Listening",
            Self::Analyzing => "Analyzing",
            Self::Probing => "Probing",
            Self::Hinting => "Hinting",
            Self::Repair => "Repair",
            Self::Consolidating => "Consolidating",
        }
    }

    /// Returns true if this phase produces a generated tutor reply.
    pub fn is_generation_phase(&self) -> bool {
        matches!(
            self,
            Self::Probing | Self::Hinting | Self::Repair | Self::Consolidating
        )
    }

    /// Returns true if replies in this phase must be grounded in retrieved
    /// source material before generation.
    ///
    /// Probing is exempt: a clarifying question about the student's own
    /// words needs no retrieval.
    pub fn requires_grounded_context(&self) -> bool {
        matches!(self, Self::Hinting | Self::Repair | Self::Consolidating)
    }

    /// Returns true if this phase concludes a successful conversation.
    pub fn is_success_terminal(&self) -> bool {
        matches!(self, Self::Consolidating)
    }

    /// Returns all phases reachable from this phase via the rule table.
    ///
    /// Note: This is distinct from StateMachine - a forced reset to `Idle`
    /// bypasses this adjacency and is recorded separately.
    pub fn valid_next_phases(&self) -> Vec<Self> {
        match self {
            Self::Idle => vec![Self::Listening],
            Self::Listening => vec![
                Self::Probing,
                Self::Repair,
                Self::Hinting,
                Self::Consolidating,
            ],
            Self::Analyzing => vec![Self::Hinting, Self::Consolidating],
            Self::Probing => vec![Self::Hinting, Self::Consolidating],
            Self::Hinting => vec![Self::Hinting, Self::Consolidating],
            Self::Repair => vec![Self::Hinting, Self::Consolidating],
            Self::Consolidating => vec![Self::Hinting, Self::Consolidating],
        }
    }

    /// Returns true if transition to target phase is valid.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_next_phases().contains(target)
    }

    /// All phases, in declaration order.
    pub fn all() -> [Self; 7] {
        [
            Self::Idle,
            Self::Listening,
            Self::Analyzing,
            Self::Probing,
            Self::Hinting,
            Self::Repair,
            Self::Consolidating,
        ]
    }
}

impl Default for TutorPhase {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod phase_basics {
        use super::*;

        #[test]
        fn default_phase_is_idle() {
            assert_eq!(TutorPhase::default(), TutorPhase::Idle);
        }

        #[test]
        fn serializes_to_snake_case() {
            let phase = TutorPhase::Consolidating;
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, "\"consolidating\"");
        }

        #[test]
        fn deserializes_from_snake_case() {
            let phase: TutorPhase = serde_json::from_str("\"hinting\"").unwrap();
            assert_eq!(phase, TutorPhase::Hinting);
        }

        #[test]
        fn all_lists_seven_phases() {
            assert_eq!(TutorPhase::all().len(), 7);
        }

        #[test]
        fn all_phases_have_directives() {
            for phase in TutorPhase::all() {
                assert!(!phase.directive().is_empty());
            }
        }

        #[test]
        fn all_phases_have_labels() {
            for phase in TutorPhase::all() {
                assert!(!phase.label().is_empty());
            }
        }
    }

    mod is_generation_phase {
        use super::*;

        #[test]
        fn response_phases_generate() {
            assert!(TutorPhase::Probing.is_generation_phase());
            assert!(TutorPhase::Hinting.is_generation_phase());
            assert!(TutorPhase::Repair.is_generation_phase());
            assert!(TutorPhase::Consolidating.is_generation_phase());
        }

        #[test]
        fn passive_phases_do_not_generate() {
            assert!(!TutorPhase::Idle.is_generation_phase());
            assert!(!TutorPhase::Listening.is_generation_phase());
            assert!(!TutorPhase::Analyzing.is_generation_phase());
        }
    }

    mod requires_grounded_context {
        use super::*;

        #[test]
        fn hinting_requires_context() {
            assert!(TutorPhase::Hinting.requires_grounded_context());
        }

        #[test]
        fn repair_requires_context() {
            assert!(TutorPhase::Repair.requires_grounded_context());
        }

        #[test]
        fn consolidating_requires_context() {
            assert!(TutorPhase::Consolidating.requires_grounded_context());
        }

        #[test]
        fn probing_is_exempt() {
            // A clarifying question needs no retrieval
            assert!(!TutorPhase::Probing.requires_grounded_context());
        }

        #[test]
        fn passive_phases_are_exempt() {
            assert!(!TutorPhase::Idle.requires_grounded_context());
            assert!(!TutorPhase::Listening.requires_grounded_context());
            assert!(!TutorPhase::Analyzing.requires_grounded_context());
        }
    }

    mod phase_transitions {
        use super::*;

        #[test]
        fn idle_transitions_only_to_listening() {
            let phase = TutorPhase::Idle;
            assert!(phase.can_transition_to(&TutorPhase::Listening));
            assert_eq!(phase.valid_next_phases(), vec![TutorPhase::Listening]);
        }

        #[test]
        fn listening_can_branch_to_any_response_phase() {
            let phase = TutorPhase::Listening;
            assert!(phase.can_transition_to(&TutorPhase::Probing));
            assert!(phase.can_transition_to(&TutorPhase::Repair));
            assert!(phase.can_transition_to(&TutorPhase::Hinting));
            assert!(phase.can_transition_to(&TutorPhase::Consolidating));
            // Cannot go back to idle without a forced reset
            assert!(!phase.can_transition_to(&TutorPhase::Idle));
        }

        #[test]
        fn hinting_can_loop_for_repeated_requests() {
            let phase = TutorPhase::Hinting;
            assert!(phase.can_transition_to(&TutorPhase::Hinting));
            assert!(phase.can_transition_to(&TutorPhase::Consolidating));
        }

        #[test]
        fn probing_cannot_return_to_listening() {
            // Rules only route probing onward to hinting or consolidation
            let phase = TutorPhase::Probing;
            assert!(!phase.can_transition_to(&TutorPhase::Listening));
            assert!(phase.can_transition_to(&TutorPhase::Hinting));
            assert!(phase.can_transition_to(&TutorPhase::Consolidating));
        }

        #[test]
        fn consolidating_allows_late_hints_and_further_coverage() {
            let phase = TutorPhase::Consolidating;
            assert!(phase.can_transition_to(&TutorPhase::Hinting));
            assert!(phase.can_transition_to(&TutorPhase::Consolidating));
            assert!(!phase.can_transition_to(&TutorPhase::Listening));
        }

        #[test]
        fn consolidating_is_the_success_terminal() {
            assert!(TutorPhase::Consolidating.is_success_terminal());
            for phase in TutorPhase::all() {
                if phase != TutorPhase::Consolidating {
                    assert!(!phase.is_success_terminal());
                }
            }
        }
    }

    mod directive_content {
        use super::*;

        #[test]
        fn listening_directive_avoids_interruption() {
            let directive = TutorPhase::Listening.directive();
            assert!(directive.contains("narrate") || directive.contains("interrupt"));
        }

        #[test]
        fn probing_directive_mentions_question() {
            let directive = TutorPhase::Probing.directive();
            assert!(directive.contains("question"));
        }

        #[test]
        fn hinting_directive_withholds_answer() {
            let directive = TutorPhase::Hinting.directive();
            assert!(directive.contains("answer") || directive.contains("level"));
        }

        #[test]
        fn repair_directive_mentions_grounding() {
            let directive = TutorPhase::Repair.directive();
            assert!(directive.contains("grounded") || directive.contains("source"));
        }

        #[test]
        fn consolidating_directive_mentions_summary() {
            let directive = TutorPhase::Consolidating.directive();
            assert!(directive.contains("Summarize") || directive.contains("next"));
        }
    }
}
