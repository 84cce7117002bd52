//! Prompt assembly for the generation phases.
//!
//! Each builder turns the session state and a prepared context into a
//! `TutorPrompt`. Taking `&PreparedContext` is deliberate: a prompt for
//! a grounded phase cannot exist before the context gate has concluded.
//!
//! The builders only assemble text. What the tutor is allowed to do in
//! each phase comes from the phase directives; fixed wording for
//! degraded moments lives in the dialogue templates.

use std::collections::BTreeSet;

use crate::application::context_gate::PreparedContext;
use crate::domain::dialogue::TutorPhase;
use crate::domain::foundation::{ConceptId, HintLevel};
use crate::domain::session::{ConversationTurn, Speaker};
use crate::ports::{PromptMessage, QuestionRecord, TutorPrompt};

/// How many transcript turns the prompt carries. Older turns are
/// summarized by coverage state, not replayed.
const RECENT_TURNS: usize = 8;

const TUTOR_PERSONA: &str = "You are an oral tutor listening to a student reason \
through a problem aloud. Keep every reply short and spoken in register, one or \
two sentences. Never reveal the full solution.";

const DEGRADED_INSTRUCTION: &str = "No source material is available for this \
reply. Say explicitly that you cannot verify details, and do not introduce any \
new facts.";

/// Builds the prompt for a clarifying probe about an unstated step.
pub fn probe_prompt(
    question: &QuestionRecord,
    transcript: &[ConversationTurn],
    context: &PreparedContext,
) -> TutorPrompt {
    let system = assemble_system(question, TutorPhase::Probing.directive(), None, context);
    with_excerpt(TutorPrompt::new(system), transcript)
}

/// Builds the prompt for a hint at the given escalation level.
pub fn hint_prompt(
    question: &QuestionRecord,
    concept: &ConceptId,
    level: HintLevel,
    transcript: &[ConversationTurn],
    context: &PreparedContext,
) -> TutorPrompt {
    let extra = format!(
        "Concept the student is stuck on: {}.\nHint level: {}",
        concept_label(question, concept),
        hint_framing(level)
    );
    let system = assemble_system(
        question,
        TutorPhase::Hinting.directive(),
        Some(extra),
        context,
    );
    with_excerpt(TutorPrompt::new(system), transcript)
}

/// Builds the prompt for correcting a flawed step.
pub fn repair_prompt(
    question: &QuestionRecord,
    transcript: &[ConversationTurn],
    context: &PreparedContext,
) -> TutorPrompt {
    let system = assemble_system(question, TutorPhase::Repair.directive(), None, context);
    with_excerpt(TutorPrompt::new(system), transcript)
}

/// Builds the prompt for the end-of-coverage summary.
pub fn consolidate_prompt(
    question: &QuestionRecord,
    covered: &BTreeSet<ConceptId>,
    transcript: &[ConversationTurn],
    context: &PreparedContext,
) -> TutorPrompt {
    let labels: Vec<&str> = covered
        .iter()
        .map(|concept| concept_label(question, concept))
        .collect();
    let extra = if labels.is_empty() {
        None
    } else {
        Some(format!(
            "Concepts the student addressed: {}.",
            labels.join(", ")
        ))
    };
    let system = assemble_system(
        question,
        TutorPhase::Consolidating.directive(),
        extra,
        context,
    );
    with_excerpt(TutorPrompt::new(system), transcript)
}

/// Returns the display name for a concept, falling back to its id when
/// the question does not carry a node for it.
pub fn concept_label<'a>(question: &'a QuestionRecord, concept: &'a ConceptId) -> &'a str {
    question
        .node_for(concept)
        .map(|node| node.label.as_str())
        .unwrap_or_else(|| concept.as_str())
}

fn hint_framing(level: HintLevel) -> &'static str {
    match level {
        HintLevel::Nudge => {
            "1 (Nudge): point attention at the area without naming the method."
        }
        HintLevel::Strategy => {
            "2 (Strategy): name the technique to try, not how to apply it."
        }
        HintLevel::WorkedStep => {
            "3 (Worked Step): walk through exactly one concrete step, then stop."
        }
    }
}

fn assemble_system(
    question: &QuestionRecord,
    directive: &str,
    extra: Option<String>,
    context: &PreparedContext,
) -> String {
    let mut system = format!(
        "{TUTOR_PERSONA}\n\nQuestion under discussion:\n{}\n\nYour current job: {directive}",
        question.prompt
    );
    if let Some(extra) = extra {
        system.push('\n');
        system.push_str(&extra);
    }
    if !context.documents.is_empty() {
        system.push_str("\n\nGround your reply in this material and nothing else:\n");
        system.push_str(&render_material(context));
    }
    if context.degraded {
        system.push_str("\n\n");
        system.push_str(DEGRADED_INSTRUCTION);
    }
    system
}

fn render_material(context: &PreparedContext) -> String {
    context
        .documents
        .iter()
        .map(|doc| format!("- [{}] {}", doc.kind, doc.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_excerpt(mut prompt: TutorPrompt, transcript: &[ConversationTurn]) -> TutorPrompt {
    let start = transcript.len().saturating_sub(RECENT_TURNS);
    for turn in &transcript[start..] {
        let message = match turn.speaker {
            Speaker::Student => PromptMessage::student(turn.content.clone()),
            Speaker::Tutor => PromptMessage::tutor(turn.content.clone()),
        };
        prompt.messages.push(message);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{QuestionId, Timestamp};
    use crate::ports::{KnowledgeNode, PromptRole, RetrievedDocument};

    fn question() -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(),
            "Explain why binary search runs in O(log n).",
            vec![
                KnowledgeNode::new(
                    ConceptId::new("halving").unwrap(),
                    "Halving the interval",
                    vec!["halve".into(), "half".into()],
                ),
                KnowledgeNode::new(
                    ConceptId::new("sorted-input").unwrap(),
                    "Sorted input requirement",
                    vec!["sorted".into()],
                ),
            ],
        )
    }

    fn grounded_context() -> PreparedContext {
        PreparedContext {
            documents: vec![RetrievedDocument::new(
                "doc-1",
                "Each comparison discards half of the remaining interval.",
                "solution_sketch",
                0.9,
            )],
            degraded: false,
            retrieved_at: Timestamp::now(),
        }
    }

    fn turns(count: usize) -> Vec<ConversationTurn> {
        (0..count)
            .map(|i| ConversationTurn::student(format!("step {i}"), TutorPhase::Listening))
            .collect()
    }

    #[test]
    fn probe_prompt_embeds_question_and_directive() {
        let prompt = probe_prompt(&question(), &[], &PreparedContext::empty());
        assert!(prompt.system.contains("binary search"));
        assert!(prompt.system.contains("one short clarifying question"));
        assert!(prompt.messages.is_empty());
    }

    #[test]
    fn excerpt_keeps_only_the_most_recent_turns() {
        let transcript = turns(RECENT_TURNS + 4);
        let prompt = probe_prompt(&question(), &transcript, &PreparedContext::empty());

        assert_eq!(prompt.messages.len(), RECENT_TURNS);
        assert_eq!(prompt.messages[0].content, "step 4");
        assert_eq!(
            prompt.messages.last().map(|m| m.content.as_str()),
            Some("step 11")
        );
    }

    #[test]
    fn excerpt_maps_speakers_to_roles() {
        let transcript = vec![
            ConversationTurn::student("so we halve it", TutorPhase::Listening),
            ConversationTurn::tutor("go on", TutorPhase::Listening),
        ];
        let prompt = repair_prompt(&question(), &transcript, &grounded_context());

        assert_eq!(prompt.messages[0].role, PromptRole::Student);
        assert_eq!(prompt.messages[1].role, PromptRole::Tutor);
    }

    #[test]
    fn hint_prompt_names_concept_and_level() {
        let concept = ConceptId::new("halving").unwrap();
        let prompt = hint_prompt(
            &question(),
            &concept,
            HintLevel::Strategy,
            &[],
            &grounded_context(),
        );

        assert!(prompt.system.contains("Halving the interval"));
        assert!(prompt.system.contains("2 (Strategy)"));
        assert!(prompt.system.contains("discards half"));
    }

    #[test]
    fn hint_prompt_falls_back_to_concept_id_for_unknown_nodes() {
        let concept = ConceptId::new("off-syllabus").unwrap();
        let prompt = hint_prompt(
            &question(),
            &concept,
            HintLevel::Nudge,
            &[],
            &PreparedContext::empty(),
        );
        assert!(prompt.system.contains("off-syllabus"));
    }

    #[test]
    fn degraded_context_adds_the_admission_instruction() {
        let mut context = grounded_context();
        context.documents.clear();
        context.degraded = true;

        let prompt = repair_prompt(&question(), &[], &context);
        assert!(prompt.system.contains("cannot verify"));
        assert!(!prompt.system.contains("Ground your reply"));
    }

    #[test]
    fn grounded_material_is_rendered_with_kind_tags() {
        let prompt = repair_prompt(&question(), &[], &grounded_context());
        assert!(prompt.system.contains("- [solution_sketch]"));
    }

    #[test]
    fn consolidate_prompt_lists_covered_concepts() {
        let covered: BTreeSet<ConceptId> = [
            ConceptId::new("halving").unwrap(),
            ConceptId::new("sorted-input").unwrap(),
        ]
        .into_iter()
        .collect();

        let prompt = consolidate_prompt(&question(), &covered, &[], &grounded_context());
        assert!(prompt.system.contains("Halving the interval"));
        assert!(prompt.system.contains("Sorted input requirement"));
        assert!(prompt.system.contains("Summarize"));
    }

    #[test]
    fn consolidate_prompt_with_nothing_covered_omits_the_list() {
        let prompt = consolidate_prompt(
            &question(),
            &BTreeSet::new(),
            &[],
            &PreparedContext::empty(),
        );
        assert!(!prompt.system.contains("addressed"));
    }
}
