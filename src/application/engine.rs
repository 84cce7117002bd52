//! Dialog Engine - Orchestration of one tutoring conversation.
//!
//! The engine owns no session state. Callers pass the session in, the
//! engine routes the stimulus through the phase rules and reacts to the
//! outcome: probing, hinting, repairing or consolidating through the
//! generation port, grounded by the context gate where the phase
//! demands it.
//!
//! # Flow
//!
//! 1. Stuck sessions are reset before anything else
//! 2. The stimulus becomes a `TutorEvent` and goes through the FSM
//! 3. The new phase picks the response branch
//! 4. Generation runs under a deadline with an alignment check; any
//!    failure substitutes the canned safe default
//! 5. The tutor turn is appended to the transcript
//!
//! Collaborator failures never cross the session boundary: a dead
//! analyzer, an empty retrieval or a slow generator degrade the reply,
//! they do not abort the conversation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::context_gate::{
    context_alignment, ContextGate, PreparedContext, RetrievalScope,
};
use crate::application::prompt::{self, concept_label};
use crate::domain::dialogue::{
    templates, HintUsage, TransitionOutcome, TransitionThresholds, TutorEvent, TutorPhase,
    UserRequestKind,
};
use crate::domain::foundation::{
    ConceptId, Coverage, DomainError, HintLevel, QuestionId, SessionId, SessionStatus, StudentId,
    Timestamp,
};
use crate::domain::metrics::{
    derive_pauses, MetricsCalculator, MetricsError, MetricsReport, MetricsThresholds,
};
use crate::domain::session::TutoringSession;
use crate::ports::{
    GenerationService, QuestionBank, QuestionBankError, QuestionRecord, SessionStoreError,
    StudentInput, TutorPrompt, UtteranceAnalysis, UtteranceAnalyzer,
};

/// Knobs for the engine's conversational policy.
#[derive(Debug, Clone)]
pub struct EngineTuning {
    /// Silence and coverage thresholds handed to new sessions.
    pub thresholds: TransitionThresholds,
    /// Recognition confidence below this asks for a repeat.
    pub min_confidence: f64,
    /// No transition for longer than this resets the session.
    pub stuck_timeout_secs: f64,
    /// Deadline for one generation call.
    pub generation_timeout: Duration,
    /// Context alignment below this substitutes the safe default.
    pub min_alignment: f64,
    /// Word gaps at least this long count as pauses.
    pub min_pause_gap_secs: f64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            thresholds: TransitionThresholds::default(),
            min_confidence: 0.60,
            stuck_timeout_secs: 120.0,
            generation_timeout: Duration::from_secs(10),
            min_alignment: 0.12,
            min_pause_gap_secs: 0.8,
        }
    }
}

/// What a tutor reply is doing, conversationally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// A clarifying question about an unstated step.
    Probe,
    /// A leveled hint.
    Hint,
    /// A correction of a flawed step.
    Repair,
    /// A coverage summary with a suggested next step.
    Consolidate,
    /// Anything that just keeps the floor with the student: openings,
    /// confirmation requests, restart notices, plain acknowledgements.
    Acknowledge,
}

/// One tutor reply with its conversational metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorResponse {
    /// What the tutor says. Empty means say nothing.
    pub text: String,
    pub kind: ResponseKind,
    /// Set on hint replies.
    pub hint_level: Option<HintLevel>,
    /// Concepts this reply concerns.
    pub related_concepts: Vec<ConceptId>,
    /// Set on consolidation when a required concept is still open.
    pub suggested_next_step: Option<String>,
    /// True when the reply was produced without trusted grounding.
    pub degraded: bool,
}

impl TutorResponse {
    fn spoken(text: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            text: text.into(),
            kind,
            hint_level: None,
            related_concepts: Vec::new(),
            suggested_next_step: None,
            degraded: false,
        }
    }

    /// A reply the voice loop must not speak.
    fn silent() -> Self {
        Self::spoken("", ResponseKind::Acknowledge)
    }

    /// Returns true when there is nothing to say aloud.
    pub fn is_silent(&self) -> bool {
        self.text.is_empty()
    }
}

/// Final accounting for one ended session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub duration_secs: f64,
    pub concepts_covered: Vec<ConceptId>,
    pub concept_coverage: Coverage,
    pub hints_used: Vec<HintUsage>,
    pub metrics: MetricsReport,
}

/// Read-only view of a running session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub status: SessionStatus,
    pub phase: TutorPhase,
    pub concept_coverage: Coverage,
    pub covered_concepts: Vec<ConceptId>,
    pub outstanding_concepts: Vec<ConceptId>,
    pub hint_count: usize,
    pub turn_count: usize,
    pub started_at: Timestamp,
    pub duration_secs: f64,
}

/// Errors surfaced by engine operations.
///
/// Conversational degradation is not an error; these are the cases
/// where there is no session to keep talking in.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("question bank error: {0}")]
    QuestionBank(#[from] QuestionBankError),

    #[error("session error: {0}")]
    Session(#[from] DomainError),

    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("session {0} not found")]
    SessionNotFound(SessionId),
}

/// Conversation orchestrator over the collaborator ports.
pub struct DialogEngine {
    question_bank: Arc<dyn QuestionBank>,
    analyzer: Arc<dyn UtteranceAnalyzer>,
    generator: Arc<dyn GenerationService>,
    gate: ContextGate,
    tuning: EngineTuning,
}

impl DialogEngine {
    pub fn new(
        question_bank: Arc<dyn QuestionBank>,
        analyzer: Arc<dyn UtteranceAnalyzer>,
        generator: Arc<dyn GenerationService>,
        gate: ContextGate,
        tuning: EngineTuning,
    ) -> Self {
        Self {
            question_bank,
            analyzer,
            generator,
            gate,
            tuning,
        }
    }

    /// Opens a session on the given question.
    ///
    /// The session starts in Listening; the response carries the canned
    /// opening with the question text, already on the transcript.
    ///
    /// # Errors
    ///
    /// - `QuestionBank` if the question cannot be loaded
    pub async fn start_session(
        &self,
        question_id: QuestionId,
        student_id: StudentId,
    ) -> Result<(TutoringSession, TutorResponse), EngineError> {
        let question = self.question_bank.load_question(&question_id).await?;

        let mut session = TutoringSession::new(
            SessionId::new(),
            question_id,
            student_id,
            question.required_concepts(),
            self.tuning.thresholds.clone(),
        );

        let opening = templates::opening_message(&question.prompt);
        session.record_tutor_turn(opening.clone())?;

        info!(
            session_id = %session.id(),
            question_id = %question_id,
            student_id = %session.student_id(),
            required_concepts = question.knowledge_nodes.len(),
            "Tutoring session started"
        );

        Ok((session, TutorResponse::spoken(opening, ResponseKind::Acknowledge)))
    }

    /// Processes one committed student utterance.
    ///
    /// # Errors
    ///
    /// - `Session` if the session is already ended
    /// - `QuestionBank` if the question cannot be reloaded
    pub async fn process_student_input(
        &self,
        session: &mut TutoringSession,
        input: StudentInput,
    ) -> Result<TutorResponse, EngineError> {
        // 1. A wedged session resets before anything else happens.
        if let Some(reset) = self.reset_if_stuck(session)? {
            return Ok(reset);
        }

        // 2. Speech after a reset re-opens the session.
        if session.current_phase() == TutorPhase::Idle {
            session.apply_event(&TutorEvent::start_request())?;
            debug!(session_id = %session.id(), "Idle session re-opened on student input");
        }

        // 3. Poorly heard input is confirmed, not interpreted.
        if input.is_low_confidence(self.tuning.min_confidence) {
            debug!(
                session_id = %session.id(),
                confidence = input.confidence,
                "Recognition confidence too low, asking for a repeat"
            );
            session.record_tutor_turn(templates::confirmation_request())?;
            return Ok(TutorResponse::spoken(
                templates::confirmation_request(),
                ResponseKind::Acknowledge,
            ));
        }

        // 4. Commit the utterance with its speech timing.
        let pauses = derive_pauses(&input.words, self.tuning.min_pause_gap_secs);
        session.record_student_turn(
            input.text.clone(),
            input.word_count(),
            input.duration_secs,
            &pauses,
        )?;

        // 5. Classify. A dead analyzer degrades to an acknowledgement;
        //    the student's turn is already on the transcript.
        let question = self.question_bank.load_question(session.question_id()).await?;
        let analysis = match self
            .analyzer
            .analyze(&input.text, &question, session.covered_concepts())
            .await
        {
            Ok(analysis) => analysis,
            Err(error) => {
                warn!(
                    session_id = %session.id(),
                    error = %error,
                    "Utterance analysis failed, acknowledging without classification"
                );
                session.record_tutor_turn(templates::acknowledgement())?;
                return Ok(TutorResponse {
                    degraded: true,
                    ..TutorResponse::spoken(templates::acknowledgement(), ResponseKind::Acknowledge)
                });
            }
        };

        // 6. Coverage advances before the event so the rule table sees
        //    the post-utterance value.
        let newly_covered = session.mark_concepts_covered(&analysis.concepts_mentioned)?;
        if newly_covered > 0 {
            debug!(
                session_id = %session.id(),
                newly_covered,
                coverage = session.concept_coverage().value(),
                "Concept coverage advanced"
            );
        }

        // 7. One event, one ruling, one reply.
        let event = TutorEvent::analysis_complete(
            analysis.logic_gap,
            analysis.logic_error,
            session.concept_coverage(),
        );
        let outcome = session.apply_event(&event)?;
        self.respond_to_outcome(session, &question, &input.text, &analysis, outcome)
            .await
    }

    /// Routes an explicit start or hint request through the phase rules.
    ///
    /// # Errors
    ///
    /// - `Session` if the session is already ended
    /// - `QuestionBank` if the question cannot be reloaded
    pub async fn process_user_request(
        &self,
        session: &mut TutoringSession,
        kind: UserRequestKind,
    ) -> Result<TutorResponse, EngineError> {
        if let Some(reset) = self.reset_if_stuck(session)? {
            return Ok(reset);
        }

        let outcome = session.apply_event(&TutorEvent::user_request(kind))?;
        match outcome {
            TransitionOutcome::Applied { from, to } => {
                debug!(
                    session_id = %session.id(),
                    from = from.label(),
                    to = to.label(),
                    request = ?kind,
                    "User request applied"
                );
                match to {
                    TutorPhase::Hinting => {
                        let question =
                            self.question_bank.load_question(session.question_id()).await?;
                        self.respond_hint(session, &question).await
                    }
                    TutorPhase::Listening => self.reopen(session).await,
                    _ => self.acknowledge(session),
                }
            }
            TransitionOutcome::Rejected { phase } => {
                warn!(
                    session_id = %session.id(),
                    phase = phase.label(),
                    request = ?kind,
                    "User request produced no phase transition"
                );
                self.acknowledge(session)
            }
        }
    }

    /// Reacts to a reported stretch of silence.
    ///
    /// Long silence in Listening escalates to a hint. Anything below
    /// the threshold stays silent so the student is not interrupted.
    ///
    /// # Errors
    ///
    /// - `Session` if the session is already ended
    /// - `QuestionBank` if the question cannot be reloaded
    pub async fn process_silence(
        &self,
        session: &mut TutoringSession,
        duration_secs: f64,
    ) -> Result<TutorResponse, EngineError> {
        if let Some(reset) = self.reset_if_stuck(session)? {
            return Ok(reset);
        }

        let outcome = session.apply_event(&TutorEvent::silence_timeout(duration_secs))?;
        match outcome {
            TransitionOutcome::Applied { from, to } => {
                debug!(
                    session_id = %session.id(),
                    from = from.label(),
                    to = to.label(),
                    silence_secs = duration_secs,
                    "Silence crossed the hint threshold"
                );
                if to == TutorPhase::Hinting {
                    let question =
                        self.question_bank.load_question(session.question_id()).await?;
                    self.respond_hint(session, &question).await
                } else {
                    self.acknowledge(session)
                }
            }
            TransitionOutcome::Rejected { .. } => {
                debug!(
                    session_id = %session.id(),
                    silence_secs = duration_secs,
                    "Silence below the hint threshold"
                );
                Ok(TutorResponse::silent())
            }
        }
    }

    /// Finalizes the session and computes its report.
    ///
    /// # Errors
    ///
    /// - `Session` if the session is already ended
    /// - `Metrics` if no speech was recorded; the session stays ended
    pub fn end_session(
        &self,
        session: &mut TutoringSession,
        timing: &MetricsThresholds,
    ) -> Result<SessionSummary, EngineError> {
        let ended_at = session.end()?;
        let metrics = MetricsCalculator::generate_report(session, timing)?;

        let summary = SessionSummary {
            duration_secs: session.duration_secs(ended_at),
            concepts_covered: session.covered_concepts().iter().cloned().collect(),
            concept_coverage: session.concept_coverage(),
            hints_used: session.hints_used().to_vec(),
            metrics,
        };

        info!(
            session_id = %session.id(),
            duration_secs = summary.duration_secs,
            coverage = summary.concept_coverage.value(),
            hints = summary.hints_used.len(),
            "Tutoring session ended"
        );

        Ok(summary)
    }

    /// Read-only snapshot of the session for display.
    pub fn session_state(&self, session: &TutoringSession) -> SessionSnapshot {
        let outstanding: Vec<ConceptId> = session
            .required_concepts()
            .iter()
            .filter(|concept| !session.covered_concepts().contains(*concept))
            .cloned()
            .collect();

        SessionSnapshot {
            session_id: *session.id(),
            question_id: *session.question_id(),
            status: session.status(),
            phase: session.current_phase(),
            concept_coverage: session.concept_coverage(),
            covered_concepts: session.covered_concepts().iter().cloned().collect(),
            outstanding_concepts: outstanding,
            hint_count: session.hints_used().len(),
            turn_count: session.transcript().len(),
            started_at: *session.started_at(),
            duration_secs: session.duration_secs(Timestamp::now()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Response branches
    // ─────────────────────────────────────────────────────────────────────────

    async fn respond_to_outcome(
        &self,
        session: &mut TutoringSession,
        question: &QuestionRecord,
        utterance: &str,
        analysis: &UtteranceAnalysis,
        outcome: TransitionOutcome,
    ) -> Result<TutorResponse, EngineError> {
        match outcome {
            TransitionOutcome::Applied { from, to } => {
                debug!(
                    session_id = %session.id(),
                    from = from.label(),
                    to = to.label(),
                    "Phase transition applied"
                );
                match to {
                    TutorPhase::Probing => self.respond_probe(session, question, analysis).await,
                    TutorPhase::Hinting => self.respond_hint(session, question).await,
                    TutorPhase::Repair => {
                        self.respond_repair(session, question, utterance, analysis).await
                    }
                    TutorPhase::Consolidating => self.respond_consolidate(session, question).await,
                    _ => self.acknowledge(session),
                }
            }
            TransitionOutcome::Rejected { phase } => {
                warn!(
                    session_id = %session.id(),
                    phase = phase.label(),
                    "Analysis event produced no phase transition"
                );
                self.acknowledge(session)
            }
        }
    }

    /// Probing asks about the student's own words; no retrieval round-trip.
    async fn respond_probe(
        &self,
        session: &mut TutoringSession,
        question: &QuestionRecord,
        analysis: &UtteranceAnalysis,
    ) -> Result<TutorResponse, EngineError> {
        let session_id = *session.id();
        let context = PreparedContext::empty();
        let prompt = prompt::probe_prompt(question, session.transcript(), &context);
        let (text, degraded) = self.generate_with_budget(session_id, &prompt, &context).await;
        session.record_tutor_turn(text.clone())?;

        Ok(TutorResponse {
            related_concepts: analysis.concepts_mentioned.iter().cloned().collect(),
            degraded,
            ..TutorResponse::spoken(text, ResponseKind::Probe)
        })
    }

    async fn respond_hint(
        &self,
        session: &mut TutoringSession,
        question: &QuestionRecord,
    ) -> Result<TutorResponse, EngineError> {
        let session_id = *session.id();
        let concept = session
            .next_target_concept()
            .cloned()
            .unwrap_or_else(ConceptId::general);
        let usage = session.request_hint(concept.clone())?;

        let scope = RetrievalScope::new(*session.question_id())
            .with_knowledge_nodes(vec![concept.clone()]);
        let context = self
            .gate
            .retrieve_then_prepare(concept_label(question, &concept), &scope)
            .await;

        let prompt = prompt::hint_prompt(
            question,
            &concept,
            usage.level,
            session.transcript(),
            &context,
        );
        let (text, degraded) = self.generate_with_budget(session_id, &prompt, &context).await;
        session.record_tutor_turn(text.clone())?;

        debug!(
            session_id = %session_id,
            concept = %concept,
            level = usage.level.value(),
            "Hint granted"
        );

        Ok(TutorResponse {
            hint_level: Some(usage.level),
            related_concepts: vec![concept],
            degraded,
            ..TutorResponse::spoken(text, ResponseKind::Hint)
        })
    }

    /// Repair retrieves against the flawed claim itself.
    async fn respond_repair(
        &self,
        session: &mut TutoringSession,
        question: &QuestionRecord,
        utterance: &str,
        analysis: &UtteranceAnalysis,
    ) -> Result<TutorResponse, EngineError> {
        let session_id = *session.id();
        let scope = RetrievalScope::new(*session.question_id());
        let context = self.gate.retrieve_then_prepare(utterance, &scope).await;

        let prompt = prompt::repair_prompt(question, session.transcript(), &context);
        let (text, degraded) = self.generate_with_budget(session_id, &prompt, &context).await;
        session.record_tutor_turn(text.clone())?;

        Ok(TutorResponse {
            related_concepts: analysis.concepts_mentioned.iter().cloned().collect(),
            degraded,
            ..TutorResponse::spoken(text, ResponseKind::Repair)
        })
    }

    async fn respond_consolidate(
        &self,
        session: &mut TutoringSession,
        question: &QuestionRecord,
    ) -> Result<TutorResponse, EngineError> {
        let session_id = *session.id();
        let scope = RetrievalScope::new(*session.question_id());
        let context = self.gate.retrieve_then_prepare(&question.prompt, &scope).await;

        let prompt = prompt::consolidate_prompt(
            question,
            session.covered_concepts(),
            session.transcript(),
            &context,
        );
        let (text, degraded) = self.generate_with_budget(session_id, &prompt, &context).await;
        session.record_tutor_turn(text.clone())?;

        let suggested_next_step = session
            .required_concepts()
            .iter()
            .find(|concept| !session.covered_concepts().contains(*concept))
            .map(|concept| concept_label(question, concept).to_string());

        info!(
            session_id = %session_id,
            coverage = session.concept_coverage().value(),
            "Coverage goal reached, consolidating"
        );

        Ok(TutorResponse {
            related_concepts: session.covered_concepts().iter().cloned().collect(),
            suggested_next_step,
            degraded,
            ..TutorResponse::spoken(text, ResponseKind::Consolidate)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared plumbing
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs generation under the deadline and the alignment check.
    ///
    /// Returns the reply and whether it is degraded. Every failure path
    /// substitutes the canned safe default instead of surfacing an error.
    async fn generate_with_budget(
        &self,
        session_id: SessionId,
        prompt: &TutorPrompt,
        context: &PreparedContext,
    ) -> (String, bool) {
        let reply = match tokio::time::timeout(
            self.tuning.generation_timeout,
            self.generator.generate(prompt),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => {
                warn!(
                    session_id = %session_id,
                    error = %error,
                    "Generation failed, substituting the safe default"
                );
                return (templates::safe_default().to_string(), true);
            }
            Err(_) => {
                warn!(
                    session_id = %session_id,
                    timeout_secs = self.tuning.generation_timeout.as_secs(),
                    "Generation missed its deadline, substituting the safe default"
                );
                return (templates::safe_default().to_string(), true);
            }
        };

        if !context.degraded && !context.documents.is_empty() {
            let alignment = context_alignment(&reply, context);
            if alignment < self.tuning.min_alignment {
                warn!(
                    session_id = %session_id,
                    alignment,
                    "Generated reply drifted from the retrieved material, substituting the safe default"
                );
                return (templates::safe_default().to_string(), true);
            }
        }

        (reply, context.degraded)
    }

    /// Resets a session whose phase has not moved for too long.
    fn reset_if_stuck(
        &self,
        session: &mut TutoringSession,
    ) -> Result<Option<TutorResponse>, EngineError> {
        if !session.is_stuck(Timestamp::now(), self.tuning.stuck_timeout_secs) {
            return Ok(None);
        }

        warn!(
            session_id = %session.id(),
            phase = session.current_phase().label(),
            stuck_timeout_secs = self.tuning.stuck_timeout_secs,
            "Session stuck, forcing a reset to idle"
        );
        session.force_idle("no phase transition within the stuck threshold")?;
        session.record_tutor_turn(templates::restart_notice())?;

        Ok(Some(TutorResponse::spoken(
            templates::restart_notice(),
            ResponseKind::Acknowledge,
        )))
    }

    /// Re-opens a stuck-reset session with the canned opening.
    async fn reopen(&self, session: &mut TutoringSession) -> Result<TutorResponse, EngineError> {
        let question = self.question_bank.load_question(session.question_id()).await?;
        let opening = templates::opening_message(&question.prompt);
        session.record_tutor_turn(opening.clone())?;

        info!(session_id = %session.id(), "Tutoring session re-opened");
        Ok(TutorResponse::spoken(opening, ResponseKind::Acknowledge))
    }

    fn acknowledge(&self, session: &mut TutoringSession) -> Result<TutorResponse, EngineError> {
        session.record_tutor_turn(templates::acknowledgement())?;
        Ok(TutorResponse::spoken(
            templates::acknowledgement(),
            ResponseKind::Acknowledge,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::adapters::ai::MockGenerator;
    use crate::adapters::analysis::MockAnalyzer;
    use crate::adapters::questions::InMemoryQuestionBank;
    use crate::adapters::retrieval::MockRetrieval;
    use crate::application::context_gate::RetrievalPolicy;
    use crate::domain::metrics::WordTiming;
    use crate::ports::{KnowledgeNode, RetrievedDocument};

    const ALIGNED_REPLY: &str = "Each comparison halves the remaining interval.";

    fn binary_search_question() -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(),
            "Explain why binary search runs in O(log n) on sorted input.",
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
                KnowledgeNode::new(
                    ConceptId::new("termination").unwrap(),
                    "Termination condition",
                    vec!["terminate".into(), "empty interval".into()],
                ),
            ],
        )
    }

    fn source_documents() -> Vec<RetrievedDocument> {
        vec![
            RetrievedDocument::new(
                "doc-1",
                "Binary search halves the remaining interval with each comparison.",
                "solution_sketch",
                0.9,
            ),
            RetrievedDocument::new(
                "doc-2",
                "The input must be sorted before binary search applies.",
                "rubric",
                0.84,
            ),
        ]
    }

    fn spoken(text: &str, confidence: f64) -> StudentInput {
        let words: Vec<WordTiming> = text
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| {
                WordTiming::new(word, i as f64 * 0.3, i as f64 * 0.3 + 0.25)
            })
            .collect();
        let duration_secs = words.last().map(|w| w.end_secs).unwrap_or(0.0);
        StudentInput {
            text: text.to_string(),
            confidence,
            words,
            duration_secs,
        }
    }

    struct Bench {
        engine: DialogEngine,
        generator: MockGenerator,
        retrieval: MockRetrieval,
        analyzer: MockAnalyzer,
        question: QuestionRecord,
    }

    fn bench_with(
        generator: MockGenerator,
        retrieval: MockRetrieval,
        analyzer: MockAnalyzer,
        tuning: EngineTuning,
    ) -> Bench {
        let question = binary_search_question();
        let bank = InMemoryQuestionBank::with_questions(vec![question.clone()]);
        let gate = ContextGate::new(Arc::new(retrieval.clone()), RetrievalPolicy::default());
        let engine = DialogEngine::new(
            Arc::new(bank),
            Arc::new(analyzer.clone()),
            Arc::new(generator.clone()),
            gate,
            tuning,
        );
        Bench {
            engine,
            generator,
            retrieval,
            analyzer,
            question,
        }
    }

    fn bench(generator: MockGenerator, retrieval: MockRetrieval, analyzer: MockAnalyzer) -> Bench {
        bench_with(generator, retrieval, analyzer, EngineTuning::default())
    }

    async fn started(bench: &Bench) -> TutoringSession {
        let (session, _) = bench
            .engine
            .start_session(bench.question.id, StudentId::new("student-7").unwrap())
            .await
            .unwrap();
        session
    }

    fn concepts(ids: &[&str]) -> BTreeSet<ConceptId> {
        ids.iter().map(|id| ConceptId::new(*id).unwrap()).collect()
    }

    #[tokio::test]
    async fn start_session_opens_listening_with_the_question() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());

        let (session, response) = bench
            .engine
            .start_session(bench.question.id, StudentId::new("student-7").unwrap())
            .await
            .unwrap();

        assert_eq!(session.current_phase(), TutorPhase::Listening);
        assert_eq!(response.kind, ResponseKind::Acknowledge);
        assert!(response.text.contains("binary search"));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.required_concepts().len(), 3);
    }

    #[tokio::test]
    async fn start_session_fails_for_an_unknown_question() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());

        let result = bench
            .engine
            .start_session(QuestionId::new(), StudentId::new("student-7").unwrap())
            .await;

        assert!(matches!(result, Err(EngineError::QuestionBank(_))));
    }

    #[tokio::test]
    async fn unremarkable_input_is_acknowledged_in_listening() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("so we start in the middle", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Acknowledge);
        assert_eq!(response.text, templates::acknowledgement());
        assert_eq!(session.current_phase(), TutorPhase::Listening);
        // opening + student turn + acknowledgement
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(bench.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn logic_gap_probes_without_retrieval() {
        let analyzer = MockAnalyzer::new().with_gap();
        let generator = MockGenerator::new().with_response("What happens to the interval there?");
        let bench = bench(generator, MockRetrieval::new(), analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("and then it just works", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Probe);
        assert_eq!(session.current_phase(), TutorPhase::Probing);
        assert!(!response.degraded);
        assert_eq!(bench.generator.call_count(), 1);
        assert_eq!(bench.retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn logic_error_repairs_with_grounding() {
        let analyzer = MockAnalyzer::new().with_logic_error();
        let generator = MockGenerator::new().with_response(ALIGNED_REPLY);
        let retrieval = MockRetrieval::new().with_documents(source_documents());
        let bench = bench(generator, retrieval, analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("sorting is not needed here", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Repair);
        assert_eq!(session.current_phase(), TutorPhase::Repair);
        assert_eq!(response.text, ALIGNED_REPLY);
        assert!(!response.degraded);
        assert_eq!(bench.retrieval.call_count(), 1);

        // The generation prompt carried the retrieved material.
        let calls = bench.generator.get_calls();
        assert!(calls[0].prompt.system.contains("- [solution_sketch]"));
    }

    #[tokio::test]
    async fn low_confidence_asks_for_a_repeat() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("mumble mumble", 0.3))
            .await
            .unwrap();

        assert_eq!(response.text, templates::confirmation_request());
        assert_eq!(bench.analyzer.call_count(), 0);
        // opening + confirmation; the mumble itself is not committed
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn mentions_advance_coverage() {
        let analyzer = MockAnalyzer::new().with_mentions(concepts(&["halving"]));
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("each step halves the interval", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Acknowledge);
        assert!(session.covered_concepts().contains(&ConceptId::new("halving").unwrap()));
        assert!((session.concept_coverage().value() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn full_coverage_consolidates() {
        let analyzer = MockAnalyzer::new()
            .with_mentions(concepts(&["halving", "sorted-input", "termination"]));
        let generator = MockGenerator::new().with_response(ALIGNED_REPLY);
        let retrieval = MockRetrieval::new().with_documents(source_documents());
        let bench = bench(generator, retrieval, analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(
                &mut session,
                spoken("sorted input, halve each time, stop on an empty interval", 0.9),
            )
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Consolidate);
        assert_eq!(session.current_phase(), TutorPhase::Consolidating);
        assert_eq!(response.related_concepts.len(), 3);
        assert_eq!(response.suggested_next_step, None);
    }

    #[tokio::test]
    async fn partial_consolidation_suggests_the_open_concept() {
        // Coverage 2/3 is below the 0.90 goal, so force consolidation
        // through an explicit coverage threshold of 0.5.
        let analyzer = MockAnalyzer::new().with_mentions(concepts(&["halving", "sorted-input"]));
        let generator = MockGenerator::new().with_response(ALIGNED_REPLY);
        let retrieval = MockRetrieval::new().with_documents(source_documents());
        let tuning = EngineTuning {
            thresholds: TransitionThresholds {
                silence_timeout_secs: 10.0,
                consolidation_coverage: 0.5,
            },
            ..EngineTuning::default()
        };
        let bench = bench_with(generator, retrieval, analyzer, tuning);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("it needs sorted input and halving", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Consolidate);
        assert_eq!(
            response.suggested_next_step.as_deref(),
            Some("Termination condition")
        );
    }

    #[tokio::test]
    async fn long_silence_grants_the_first_hint() {
        let generator = MockGenerator::new().with_response(ALIGNED_REPLY);
        let retrieval = MockRetrieval::new().with_documents(source_documents());
        let bench = bench(generator, retrieval, MockAnalyzer::new());
        let mut session = started(&bench).await;

        let response = bench.engine.process_silence(&mut session, 12.0).await.unwrap();

        assert_eq!(response.kind, ResponseKind::Hint);
        assert_eq!(response.hint_level, Some(HintLevel::Nudge));
        assert_eq!(session.current_phase(), TutorPhase::Hinting);
        assert_eq!(session.hints_used().len(), 1);
    }

    #[tokio::test]
    async fn short_silence_stays_silent() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());
        let mut session = started(&bench).await;
        let turns_before = session.transcript().len();

        let response = bench.engine.process_silence(&mut session, 3.0).await.unwrap();

        assert!(response.is_silent());
        assert_eq!(session.current_phase(), TutorPhase::Listening);
        assert_eq!(session.transcript().len(), turns_before);
    }

    #[tokio::test]
    async fn repeated_hint_requests_escalate_and_saturate() {
        let generator = MockGenerator::new();
        let retrieval = MockRetrieval::new();
        let bench = bench(generator, retrieval, MockAnalyzer::new());
        let mut session = started(&bench).await;

        bench.engine.process_silence(&mut session, 12.0).await.unwrap();

        let second = bench
            .engine
            .process_user_request(&mut session, UserRequestKind::Hint)
            .await
            .unwrap();
        assert_eq!(second.hint_level, Some(HintLevel::Strategy));

        let third = bench
            .engine
            .process_user_request(&mut session, UserRequestKind::Hint)
            .await
            .unwrap();
        assert_eq!(third.hint_level, Some(HintLevel::WorkedStep));

        let fourth = bench
            .engine
            .process_user_request(&mut session, UserRequestKind::Hint)
            .await
            .unwrap();
        assert_eq!(fourth.hint_level, Some(HintLevel::WorkedStep));

        assert_eq!(session.hints_used().len(), 4);
    }

    #[tokio::test]
    async fn generation_deadline_miss_substitutes_the_safe_default() {
        let generator = MockGenerator::new()
            .with_response(ALIGNED_REPLY)
            .with_delay(Duration::from_millis(100));
        let tuning = EngineTuning {
            generation_timeout: Duration::from_millis(20),
            ..EngineTuning::default()
        };
        let bench = bench_with(generator, MockRetrieval::new(), MockAnalyzer::new(), tuning);
        let mut session = started(&bench).await;

        let response = bench.engine.process_silence(&mut session, 12.0).await.unwrap();

        assert_eq!(response.text, templates::safe_default());
        assert!(response.degraded);
        assert_eq!(response.hint_level, Some(HintLevel::Nudge));
    }

    #[tokio::test]
    async fn drifting_reply_substitutes_the_safe_default() {
        let analyzer = MockAnalyzer::new().with_logic_error();
        let generator = MockGenerator::new().with_response(
            "Consider thermodynamic entropy across combustion chambers during ignition cycles",
        );
        let retrieval = MockRetrieval::new().with_documents(source_documents());
        let bench = bench(generator, retrieval, analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("the pivot can be anything", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Repair);
        assert_eq!(response.text, templates::safe_default());
        assert!(response.degraded);
    }

    #[tokio::test]
    async fn analyzer_failure_degrades_to_an_acknowledgement() {
        let analyzer = MockAnalyzer::new().with_failure();
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), analyzer);
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("so the next step is", 0.9))
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Acknowledge);
        assert_eq!(response.text, templates::acknowledgement());
        assert!(response.degraded);
        // The student turn stays on the transcript.
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn stuck_session_is_reset_with_a_restart_notice() {
        let tuning = EngineTuning {
            stuck_timeout_secs: 0.0,
            ..EngineTuning::default()
        };
        let bench = bench_with(
            MockGenerator::new(),
            MockRetrieval::new(),
            MockAnalyzer::new(),
            tuning,
        );
        let mut session = started(&bench).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("hello again", 0.9))
            .await
            .unwrap();

        assert_eq!(response.text, templates::restart_notice());
        assert_eq!(session.current_phase(), TutorPhase::Idle);
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[tokio::test]
    async fn input_after_a_reset_reopens_listening() {
        let tuning = EngineTuning {
            stuck_timeout_secs: 0.0,
            ..EngineTuning::default()
        };
        let bench = bench_with(
            MockGenerator::new(),
            MockRetrieval::new(),
            MockAnalyzer::new(),
            tuning,
        );
        let mut session = started(&bench).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        bench
            .engine
            .process_student_input(&mut session, spoken("hello", 0.9))
            .await
            .unwrap();
        assert_eq!(session.current_phase(), TutorPhase::Idle);

        let response = bench
            .engine
            .process_student_input(&mut session, spoken("ready to continue", 0.9))
            .await
            .unwrap();

        assert_eq!(session.current_phase(), TutorPhase::Listening);
        assert_eq!(response.kind, ResponseKind::Acknowledge);
    }

    #[tokio::test]
    async fn start_request_reopens_an_idle_session() {
        let tuning = EngineTuning {
            stuck_timeout_secs: 0.0,
            ..EngineTuning::default()
        };
        let bench = bench_with(
            MockGenerator::new(),
            MockRetrieval::new(),
            MockAnalyzer::new(),
            tuning,
        );
        let mut session = started(&bench).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        bench.engine.process_silence(&mut session, 1.0).await.unwrap();
        assert_eq!(session.current_phase(), TutorPhase::Idle);

        // The reset session is no longer stuck; a start request re-opens it.
        let response = bench
            .engine
            .process_user_request(&mut session, UserRequestKind::Start)
            .await
            .unwrap();

        assert_eq!(session.current_phase(), TutorPhase::Listening);
        assert!(response.text.contains("binary search"));
    }

    #[tokio::test]
    async fn start_request_on_an_active_session_is_acknowledged() {
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), MockAnalyzer::new());
        let mut session = started(&bench).await;

        let response = bench
            .engine
            .process_user_request(&mut session, UserRequestKind::Start)
            .await
            .unwrap();

        assert_eq!(response.kind, ResponseKind::Acknowledge);
        assert_eq!(response.text, templates::acknowledgement());
        assert_eq!(session.current_phase(), TutorPhase::Listening);
    }

    #[tokio::test]
    async fn end_session_summarizes_and_refuses_a_second_end() {
        let analyzer = MockAnalyzer::new().with_mentions(concepts(&["halving"]));
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), analyzer);
        let mut session = started(&bench).await;
        bench
            .engine
            .process_student_input(&mut session, spoken("each step halves the interval", 0.9))
            .await
            .unwrap();

        let summary = bench
            .engine
            .end_session(&mut session, &MetricsThresholds::default())
            .unwrap();

        assert_eq!(summary.concepts_covered, vec![ConceptId::new("halving").unwrap()]);
        assert!((summary.concept_coverage.value() - 1.0 / 3.0).abs() < 1e-9);
        assert!(summary.hints_used.is_empty());
        assert!(summary.duration_secs >= 0.0);
        assert!(summary.metrics.wpm > 0.0);

        let again = bench.engine.end_session(&mut session, &MetricsThresholds::default());
        assert!(matches!(again, Err(EngineError::Session(_))));
    }

    #[tokio::test]
    async fn session_state_reports_progress() {
        let analyzer = MockAnalyzer::new().with_mentions(concepts(&["halving"]));
        let bench = bench(MockGenerator::new(), MockRetrieval::new(), analyzer);
        let mut session = started(&bench).await;
        bench
            .engine
            .process_student_input(&mut session, spoken("each step halves the interval", 0.9))
            .await
            .unwrap();

        let snapshot = bench.engine.session_state(&session);

        assert_eq!(snapshot.phase, TutorPhase::Listening);
        assert_eq!(snapshot.status, SessionStatus::Active);
        assert_eq!(snapshot.covered_concepts.len(), 1);
        assert_eq!(snapshot.outstanding_concepts.len(), 2);
        assert_eq!(snapshot.hint_count, 0);
        assert_eq!(snapshot.turn_count, 3);
    }
}
