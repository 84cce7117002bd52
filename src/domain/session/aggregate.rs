//! Tutoring session aggregate.
//!
//! The session is the single writer surface for everything that happens
//! during one oral exercise: phase transitions, transcript, hint usage,
//! concept coverage and speaking statistics. All mutation goes through
//! the engine, which holds the session exclusively while it works.
//!
//! # Ownership
//!
//! Sessions reference their question by ID but do not own question
//! content. Question records live behind the question bank port.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::dialogue::{
    HintLadder, HintUsage, PhaseController, TransitionOutcome, TransitionRecord,
    TransitionThresholds, TutorEvent, TutorPhase,
};
use crate::domain::foundation::{
    ConceptId, Coverage, DomainError, ErrorCode, QuestionId, SessionId, SessionStatus,
    StateMachine, StudentId, Timestamp,
};
use crate::domain::metrics::{Pause, SpeechStats};

use super::turn::ConversationTurn;

/// One oral tutoring session.
///
/// # Invariants
///
/// - `covered_concepts` is always a subset of `required_concepts`
/// - the transcript is append-only and timestamp-ordered
/// - hints are only granted while the session is in the hinting phase
/// - `ended_at` is set exactly once; an ended session rejects mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutoringSession {
    /// Unique identifier for this session.
    id: SessionId,

    /// Question being worked through.
    question_id: QuestionId,

    /// Student doing the talking.
    student_id: StudentId,

    /// Current status (Active or Ended).
    status: SessionStatus,

    /// Phase state and transition history.
    fsm: PhaseController,

    /// Hint escalation for the current hinting episode.
    ladder: HintLadder,

    /// Everything said, in order.
    transcript: Vec<ConversationTurn>,

    /// Hints granted so far.
    hints_used: Vec<HintUsage>,

    /// Concepts the question expects the student to address.
    required_concepts: BTreeSet<ConceptId>,

    /// Required concepts the student has addressed.
    covered_concepts: BTreeSet<ConceptId>,

    /// Accumulated speaking time, word counts and pauses.
    speech: SpeechStats,

    /// When the session was created.
    started_at: Timestamp,

    /// When the session was finalized.
    ended_at: Option<Timestamp>,

    /// When the phase last moved. Drives stuck detection.
    last_transition_at: Timestamp,
}

impl TutoringSession {
    /// Creates a session and immediately opens it for listening.
    pub fn new(
        id: SessionId,
        question_id: QuestionId,
        student_id: StudentId,
        required_concepts: BTreeSet<ConceptId>,
        thresholds: TransitionThresholds,
    ) -> Self {
        let mut fsm = PhaseController::new(thresholds);
        fsm.process_event(&TutorEvent::start_request());
        let now = Timestamp::now();
        Self {
            id,
            question_id,
            student_id,
            status: SessionStatus::Active,
            fsm,
            ladder: HintLadder::new(),
            transcript: Vec::new(),
            hints_used: Vec::new(),
            required_concepts,
            covered_concepts: BTreeSet::new(),
            speech: SpeechStats::new(),
            started_at: now,
            ended_at: None,
            last_transition_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the question under discussion.
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    /// Returns the student.
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    /// Returns the current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the current tutor phase.
    pub fn current_phase(&self) -> TutorPhase {
        self.fsm.current_phase()
    }

    /// Returns the ordered phase transition history.
    pub fn phase_history(&self) -> &[TransitionRecord] {
        self.fsm.history()
    }

    /// Returns the transcript, oldest first.
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Returns every hint granted so far.
    pub fn hints_used(&self) -> &[HintUsage] {
        &self.hints_used
    }

    /// Returns the concepts the question requires.
    pub fn required_concepts(&self) -> &BTreeSet<ConceptId> {
        &self.required_concepts
    }

    /// Returns the required concepts addressed so far.
    pub fn covered_concepts(&self) -> &BTreeSet<ConceptId> {
        &self.covered_concepts
    }

    /// Returns accumulated speaking statistics.
    pub fn speech(&self) -> &SpeechStats {
        &self.speech
    }

    /// Returns when the session was created.
    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    /// Returns when the session ended, if it has.
    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    /// Returns when the phase last moved.
    pub fn last_transition_at(&self) -> Timestamp {
        self.last_transition_at
    }

    /// Returns the fraction of required concepts covered.
    ///
    /// An empty requirement set counts as fully covered; there is nothing
    /// left to address.
    pub fn concept_coverage(&self) -> Coverage {
        Coverage::from_ratio(self.covered_concepts.len(), self.required_concepts.len())
    }

    /// Returns the concept the tutor should steer toward next.
    ///
    /// Prefers the first uncovered required concept, falls back to the
    /// first required concept, and yields nothing for questions without
    /// knowledge nodes.
    pub fn next_target_concept(&self) -> Option<&ConceptId> {
        self.required_concepts
            .iter()
            .find(|concept| !self.covered_concepts.contains(*concept))
            .or_else(|| self.required_concepts.iter().next())
    }

    /// Returns elapsed session time in seconds, up to `as_of` for a
    /// session still running.
    pub fn duration_secs(&self, as_of: Timestamp) -> f64 {
        let end = self.ended_at.unwrap_or(as_of);
        end.seconds_since(&self.started_at).max(0.0)
    }

    /// Returns true when the phase has not moved for longer than the
    /// threshold. Idle and ended sessions are never stuck.
    pub fn is_stuck(&self, as_of: Timestamp, stuck_timeout_secs: f64) -> bool {
        self.status.is_mutable()
            && self.current_phase() != TutorPhase::Idle
            && as_of.seconds_since(&self.last_transition_at) > stuck_timeout_secs
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Feeds one event through the phase rules.
    ///
    /// An applied transition refreshes the stuck timer and lets the hint
    /// ladder observe the phase change. A rejected event changes nothing.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    pub fn apply_event(&mut self, event: &TutorEvent) -> Result<TransitionOutcome, DomainError> {
        self.ensure_mutable()?;

        let outcome = self.fsm.process_event(event);
        if let TransitionOutcome::Applied { from, to } = outcome {
            self.ladder.on_phase_change(from, to);
            self.last_transition_at = Timestamp::now();
        }
        Ok(outcome)
    }

    /// Forces the phase back to Idle, recording the override.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    pub fn force_idle(&mut self, reason: impl Into<String>) -> Result<TransitionRecord, DomainError> {
        self.ensure_mutable()?;

        let record = self.fsm.force_idle(reason);
        self.last_transition_at = Timestamp::now();
        Ok(record)
    }

    /// Grants the next hint level for the given concept.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    /// - `InvalidTransition` if the session is not in the hinting phase
    pub fn request_hint(&mut self, concept: ConceptId) -> Result<HintUsage, DomainError> {
        self.ensure_mutable()?;

        if self.current_phase() != TutorPhase::Hinting {
            return Err(DomainError::new(
                ErrorCode::InvalidTransition,
                "Hints are only granted in the hinting phase",
            ));
        }

        let usage = self.ladder.request(concept);
        self.hints_used.push(usage.clone());
        Ok(usage)
    }

    /// Appends a student turn and folds its timing into the speech stats.
    ///
    /// Pause offsets are relative to the utterance; the speech stats shift
    /// them onto the session timeline.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    pub fn record_student_turn(
        &mut self,
        content: impl Into<String>,
        word_count: usize,
        duration_secs: f64,
        pauses: &[Pause],
    ) -> Result<(), DomainError> {
        self.ensure_mutable()?;

        self.transcript
            .push(ConversationTurn::student(content, self.current_phase()));
        self.speech
            .record_utterance(word_count, duration_secs, pauses);
        Ok(())
    }

    /// Appends a tutor turn.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    pub fn record_tutor_turn(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;

        self.transcript
            .push(ConversationTurn::tutor(content, self.current_phase()));
        Ok(())
    }

    /// Marks mentioned concepts as covered, ignoring anything outside the
    /// required set. Returns how many concepts became newly covered.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if the session is finalized
    pub fn mark_concepts_covered(
        &mut self,
        mentioned: &BTreeSet<ConceptId>,
    ) -> Result<usize, DomainError> {
        self.ensure_mutable()?;

        let mut newly_covered = 0;
        for concept in mentioned {
            if self.required_concepts.contains(concept)
                && self.covered_concepts.insert(concept.clone())
            {
                newly_covered += 1;
            }
        }
        Ok(newly_covered)
    }

    /// Finalizes the session. The phase freezes where it stands.
    ///
    /// # Errors
    ///
    /// - `SessionEnded` if already finalized
    pub fn end(&mut self) -> Result<Timestamp, DomainError> {
        if !self.status.can_transition_to(&SessionStatus::Ended) {
            return Err(DomainError::new(
                ErrorCode::SessionEnded,
                "Session has already ended",
            ));
        }

        self.status = SessionStatus::Ended;
        let ended = Timestamp::now();
        self.ended_at = Some(ended);
        Ok(ended)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates that the session still accepts mutation.
    fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.status.is_mutable() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionEnded,
                "Cannot modify an ended session",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Coverage;

    fn concept(name: &str) -> ConceptId {
        ConceptId::new(name).unwrap()
    }

    fn required() -> BTreeSet<ConceptId> {
        [
            concept("base-case"),
            concept("recursive-step"),
            concept("termination"),
        ]
        .into_iter()
        .collect()
    }

    fn test_session() -> TutoringSession {
        TutoringSession::new(
            SessionId::new(),
            QuestionId::new(),
            StudentId::new("student-7".to_string()).unwrap(),
            required(),
            TransitionThresholds::default(),
        )
    }

    // Construction tests

    #[test]
    fn new_session_opens_in_listening() {
        let session = test_session();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.current_phase(), TutorPhase::Listening);
    }

    #[test]
    fn new_session_records_the_opening_transition() {
        let session = test_session();
        let history = session.phase_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from, TutorPhase::Idle);
        assert_eq!(history[0].to, TutorPhase::Listening);
    }

    #[test]
    fn new_session_has_nothing_covered() {
        let session = test_session();
        assert!(session.covered_concepts().is_empty());
        assert_eq!(session.concept_coverage(), Coverage::NONE);
        assert!(session.transcript().is_empty());
        assert!(session.hints_used().is_empty());
    }

    // Event tests

    #[test]
    fn apply_event_moves_the_phase() {
        let mut session = test_session();
        let outcome = session.apply_event(&TutorEvent::LogicGap).unwrap();
        assert!(outcome.was_applied());
        assert_eq!(session.current_phase(), TutorPhase::Probing);
    }

    #[test]
    fn rejected_event_changes_nothing() {
        let mut session = test_session();
        let before = session.last_transition_at();
        let outcome = session
            .apply_event(&TutorEvent::silence_timeout(1.0))
            .unwrap();
        assert!(!outcome.was_applied());
        assert_eq!(session.current_phase(), TutorPhase::Listening);
        assert_eq!(session.last_transition_at(), before);
    }

    #[test]
    fn applied_event_refreshes_the_stuck_timer() {
        let mut session = test_session();
        let before = session.last_transition_at();
        session.apply_event(&TutorEvent::LogicGap).unwrap();
        assert!(session.last_transition_at() >= before);
    }

    // Hint tests

    #[test]
    fn hints_escalate_within_one_hinting_entry() {
        let mut session = test_session();
        session
            .apply_event(&TutorEvent::silence_timeout(12.0))
            .unwrap();
        assert_eq!(session.current_phase(), TutorPhase::Hinting);

        let first = session.request_hint(concept("base-case")).unwrap();
        let second = session.request_hint(concept("base-case")).unwrap();
        let third = session.request_hint(concept("base-case")).unwrap();
        let fourth = session.request_hint(concept("base-case")).unwrap();

        let levels: Vec<u8> = [&first, &second, &third, &fourth]
            .iter()
            .map(|usage| usage.level.value())
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 3]);
        assert_eq!(session.hints_used().len(), 4);
    }

    #[test]
    fn reentering_hinting_resets_the_ladder() {
        let mut session = test_session();
        session
            .apply_event(&TutorEvent::silence_timeout(12.0))
            .unwrap();
        session.request_hint(concept("base-case")).unwrap();
        session.request_hint(concept("base-case")).unwrap();

        // Leave hinting and come back
        session
            .apply_event(&TutorEvent::coverage_threshold(Coverage::new(0.95)))
            .unwrap();
        session.apply_event(&TutorEvent::hint_request()).unwrap();

        let usage = session.request_hint(concept("termination")).unwrap();
        assert_eq!(usage.level.value(), 1);
    }

    #[test]
    fn hinting_self_loop_keeps_the_ladder() {
        let mut session = test_session();
        session
            .apply_event(&TutorEvent::silence_timeout(12.0))
            .unwrap();
        session.request_hint(concept("base-case")).unwrap();

        session.apply_event(&TutorEvent::hint_request()).unwrap();
        let usage = session.request_hint(concept("base-case")).unwrap();
        assert_eq!(usage.level.value(), 2);
    }

    #[test]
    fn hint_outside_hinting_phase_is_refused() {
        let mut session = test_session();
        let err = session.request_hint(concept("base-case")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert!(session.hints_used().is_empty());
    }

    // Coverage tests

    #[test]
    fn mentions_outside_the_required_set_are_ignored() {
        let mut session = test_session();
        let mentioned: BTreeSet<ConceptId> =
            [concept("base-case"), concept("unrelated-trivia")]
                .into_iter()
                .collect();

        let newly = session.mark_concepts_covered(&mentioned).unwrap();
        assert_eq!(newly, 1);
        assert!(session.covered_concepts().contains(&concept("base-case")));
        assert!(!session
            .covered_concepts()
            .contains(&concept("unrelated-trivia")));
    }

    #[test]
    fn repeated_mentions_do_not_double_count() {
        let mut session = test_session();
        let mentioned: BTreeSet<ConceptId> = [concept("base-case")].into_iter().collect();
        session.mark_concepts_covered(&mentioned).unwrap();
        let newly = session.mark_concepts_covered(&mentioned).unwrap();
        assert_eq!(newly, 0);
        assert_eq!(session.covered_concepts().len(), 1);
    }

    #[test]
    fn coverage_tracks_the_covered_fraction() {
        let mut session = test_session();
        let mentioned: BTreeSet<ConceptId> =
            [concept("base-case"), concept("termination")].into_iter().collect();
        session.mark_concepts_covered(&mentioned).unwrap();

        let coverage = session.concept_coverage();
        assert!((coverage.value() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_requirement_set_counts_as_fully_covered() {
        let session = TutoringSession::new(
            SessionId::new(),
            QuestionId::new(),
            StudentId::new("student-7".to_string()).unwrap(),
            BTreeSet::new(),
            TransitionThresholds::default(),
        );
        assert_eq!(session.concept_coverage(), Coverage::FULL);
        assert_eq!(session.next_target_concept(), None);
    }

    #[test]
    fn next_target_prefers_uncovered_concepts() {
        let mut session = test_session();
        assert_eq!(session.next_target_concept(), Some(&concept("base-case")));

        let mentioned: BTreeSet<ConceptId> = [concept("base-case")].into_iter().collect();
        session.mark_concepts_covered(&mentioned).unwrap();
        assert_eq!(
            session.next_target_concept(),
            Some(&concept("recursive-step"))
        );
    }

    #[test]
    fn next_target_falls_back_when_everything_is_covered() {
        let mut session = test_session();
        session.mark_concepts_covered(&required()).unwrap();
        assert_eq!(session.next_target_concept(), Some(&concept("base-case")));
    }

    // Transcript tests

    #[test]
    fn turns_append_in_order_with_the_current_phase() {
        let mut session = test_session();
        session
            .record_student_turn("the base case is n equals one", 6, 3.0, &[])
            .unwrap();
        session.apply_event(&TutorEvent::LogicGap).unwrap();
        session.record_tutor_turn("what happens for n of two?").unwrap();

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].phase_at_time, TutorPhase::Listening);
        assert_eq!(transcript[1].phase_at_time, TutorPhase::Probing);
        assert!(transcript[0].timestamp <= transcript[1].timestamp);
    }

    #[test]
    fn student_turns_accumulate_speech_stats() {
        let mut session = test_session();
        session
            .record_student_turn("first part", 2, 10.0, &[Pause::new(2.0, 4.0)])
            .unwrap();
        session
            .record_student_turn("second part", 2, 5.0, &[Pause::new(1.0, 2.0)])
            .unwrap();

        let speech = session.speech();
        assert_eq!(speech.word_count(), 4);
        assert!((speech.speaking_secs() - 15.0).abs() < 1e-9);
        assert_eq!(speech.pauses()[1], Pause::new(11.0, 12.0));
    }

    // Lifecycle tests

    #[test]
    fn end_finalizes_exactly_once() {
        let mut session = test_session();
        let ended = session.end().unwrap();
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.ended_at(), Some(&ended));

        let err = session.end().unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionEnded);
    }

    #[test]
    fn ended_session_rejects_all_mutation() {
        let mut session = test_session();
        session
            .apply_event(&TutorEvent::silence_timeout(12.0))
            .unwrap();
        session.end().unwrap();

        assert!(session.apply_event(&TutorEvent::LogicGap).is_err());
        assert!(session.record_tutor_turn("too late").is_err());
        assert!(session.record_student_turn("too late", 2, 1.0, &[]).is_err());
        assert!(session.request_hint(concept("base-case")).is_err());
        assert!(session.force_idle("stuck").is_err());
        assert!(session
            .mark_concepts_covered(&BTreeSet::new())
            .is_err());
    }

    #[test]
    fn ended_session_freezes_its_phase() {
        let mut session = test_session();
        session.apply_event(&TutorEvent::LogicGap).unwrap();
        session.end().unwrap();
        assert_eq!(session.current_phase(), TutorPhase::Probing);
    }

    #[test]
    fn duration_uses_as_of_until_the_session_ends() {
        let session = test_session();
        let as_of = session.started_at().plus_secs(90);
        assert!((session.duration_secs(as_of) - 90.0).abs() < 0.5);
    }

    #[test]
    fn duration_freezes_at_the_end_timestamp() {
        let mut session = test_session();
        session.end().unwrap();
        let long_after = session.started_at().plus_secs(3600);
        assert!(session.duration_secs(long_after) < 5.0);
    }

    // Stuck detection tests

    #[test]
    fn fresh_session_is_not_stuck() {
        let session = test_session();
        assert!(!session.is_stuck(Timestamp::now(), 120.0));
    }

    #[test]
    fn session_with_an_old_transition_is_stuck() {
        let session = test_session();
        let much_later = session.last_transition_at().plus_secs(300);
        assert!(session.is_stuck(much_later, 120.0));
    }

    #[test]
    fn forced_idle_session_is_not_stuck() {
        let mut session = test_session();
        session.force_idle("no transition for 120s").unwrap();
        let much_later = session.last_transition_at().plus_secs(300);
        assert!(!session.is_stuck(much_later, 120.0));
    }

    #[test]
    fn forced_idle_session_can_restart() {
        let mut session = test_session();
        session.force_idle("no transition for 120s").unwrap();
        let outcome = session.apply_event(&TutorEvent::start_request()).unwrap();
        assert!(outcome.was_applied());
        assert_eq!(session.current_phase(), TutorPhase::Listening);
    }

    // Persistence tests

    #[test]
    fn session_round_trips_through_json() {
        let mut session = test_session();
        session
            .apply_event(&TutorEvent::silence_timeout(12.0))
            .unwrap();
        session.request_hint(concept("base-case")).unwrap();
        session
            .record_student_turn("the base case is n equals one", 6, 3.0, &[])
            .unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let restored: TutoringSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.current_phase(), TutorPhase::Hinting);
        assert_eq!(restored.hints_used().len(), 1);
    }
}
