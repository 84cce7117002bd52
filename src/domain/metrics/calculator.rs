//! Session metric computation.
//!
//! Every function here is deterministic over its inputs. Degenerate
//! inputs (no speaking time, no required concepts) are refused with an
//! explicit error instead of being coerced to a misleading zero.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::dialogue::HintUsage;
use crate::domain::foundation::{ConceptId, Coverage};
use crate::domain::session::TutoringSession;

use super::pause::Pause;
use super::report::{DistractionPeriod, MetricsReport};

/// Input validation failures for metric computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("Speaking duration must be positive, got {actual} minutes")]
    NonPositiveDuration { actual: f64 },

    #[error("Cannot compute coverage over an empty required concept set")]
    EmptyConceptSet,
}

/// Timing parameters for focus analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsThresholds {
    /// A pause cluster longer than this counts as a distraction.
    pub distraction_threshold_secs: f64,
    /// Pauses closer together than this merge into one cluster.
    pub pause_merge_gap_secs: f64,
}

impl Default for MetricsThresholds {
    fn default() -> Self {
        Self {
            distraction_threshold_secs: 15.0,
            pause_merge_gap_secs: 2.0,
        }
    }
}

/// Pure metric formulas over session data.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Words per minute of recorded speech.
    ///
    /// # Errors
    ///
    /// - `NonPositiveDuration` if `speaking_minutes <= 0`
    pub fn words_per_minute(word_count: usize, speaking_minutes: f64) -> Result<f64, MetricsError> {
        if speaking_minutes <= 0.0 {
            return Err(MetricsError::NonPositiveDuration {
                actual: speaking_minutes,
            });
        }
        Ok(word_count as f64 / speaking_minutes)
    }

    /// Fraction of total speaking time spent in pauses.
    ///
    /// # Errors
    ///
    /// - `NonPositiveDuration` if `total_duration_secs <= 0`
    pub fn pause_rate(pauses: &[Pause], total_duration_secs: f64) -> Result<f64, MetricsError> {
        if total_duration_secs <= 0.0 {
            return Err(MetricsError::NonPositiveDuration {
                actual: total_duration_secs / 60.0,
            });
        }
        let paused: f64 = pauses.iter().map(Pause::duration_secs).sum();
        Ok(paused / total_duration_secs)
    }

    /// Independence score in (−∞, 1]: 1.0 for a session with no hints,
    /// lower the heavier the hinting relative to conversation length.
    ///
    /// Levels weigh 0.1 / 0.2 / 0.3. A session with no turns scores 1.0;
    /// there was no conversation to depend on hints for.
    pub fn hint_dependency(hints: &[HintUsage], total_turns: usize) -> f64 {
        if total_turns == 0 {
            return 1.0;
        }
        let weighted: f64 = hints.iter().map(|usage| usage.level.weight()).sum();
        1.0 - weighted / total_turns as f64
    }

    /// Fraction of required concepts present in the covered set.
    ///
    /// Only concepts that are actually required count; strays in the
    /// covered set are ignored.
    ///
    /// # Errors
    ///
    /// - `EmptyConceptSet` if `required` is empty
    pub fn concept_coverage(
        covered: &BTreeSet<ConceptId>,
        required: &BTreeSet<ConceptId>,
    ) -> Result<Coverage, MetricsError> {
        if required.is_empty() {
            return Err(MetricsError::EmptyConceptSet);
        }
        let hits = covered.iter().filter(|c| required.contains(*c)).count();
        Ok(Coverage::from_ratio(hits, required.len()))
    }

    /// Clusters pauses into distraction periods.
    ///
    /// Pauses must be ordered by start time (the session timeline
    /// guarantees this). Pauses separated by less than the merge gap form
    /// one cluster; a cluster whose summed pause time exceeds the
    /// distraction threshold is reported as a distraction spanning from
    /// its first pause to its last.
    pub fn distraction_periods(
        pauses: &[Pause],
        thresholds: &MetricsThresholds,
    ) -> Vec<DistractionPeriod> {
        let mut periods = Vec::new();
        let mut cluster: Option<(f64, f64, f64)> = None; // (start, end, paused total)

        for pause in pauses {
            cluster = match cluster {
                Some((start, end, total))
                    if pause.start_secs - end < thresholds.pause_merge_gap_secs =>
                {
                    Some((start, pause.end_secs.max(end), total + pause.duration_secs()))
                }
                Some(done) => {
                    Self::push_if_distraction(&mut periods, done, thresholds);
                    Some((pause.start_secs, pause.end_secs, pause.duration_secs()))
                }
                None => Some((pause.start_secs, pause.end_secs, pause.duration_secs())),
            };
        }
        if let Some(done) = cluster {
            Self::push_if_distraction(&mut periods, done, thresholds);
        }
        periods
    }

    /// Speaking time not lost to distraction periods, floored at zero.
    pub fn focus_duration(total_duration_secs: f64, distractions: &[DistractionPeriod]) -> f64 {
        let lost: f64 = distractions.iter().map(DistractionPeriod::duration_secs).sum();
        (total_duration_secs - lost).max(0.0)
    }

    /// Composes the full report from a session record.
    ///
    /// An empty required concept set reports full coverage, matching the
    /// session's own accounting; the hard error is reserved for direct
    /// `concept_coverage` callers who supplied a set they believed
    /// non-empty.
    ///
    /// # Errors
    ///
    /// - `NonPositiveDuration` if the session has no recorded speech
    pub fn generate_report(
        session: &TutoringSession,
        thresholds: &MetricsThresholds,
    ) -> Result<MetricsReport, MetricsError> {
        let speech = session.speech();
        let speaking_secs = speech.speaking_secs();
        let wpm = Self::words_per_minute(speech.word_count(), speaking_secs / 60.0)?;
        let pause_rate = Self::pause_rate(speech.pauses(), speaking_secs)?;
        let hint_dependency =
            Self::hint_dependency(session.hints_used(), session.transcript().len());
        let concept_coverage = if session.required_concepts().is_empty() {
            session.concept_coverage()
        } else {
            Self::concept_coverage(session.covered_concepts(), session.required_concepts())?
        };
        let distraction_periods = Self::distraction_periods(speech.pauses(), thresholds);
        let focus_duration_secs = Self::focus_duration(speaking_secs, &distraction_periods);

        Ok(MetricsReport {
            wpm,
            pause_rate,
            hint_dependency,
            concept_coverage,
            focus_duration_secs,
            distraction_periods,
        })
    }

    fn push_if_distraction(
        periods: &mut Vec<DistractionPeriod>,
        (start, end, total): (f64, f64, f64),
        thresholds: &MetricsThresholds,
    ) {
        if total > thresholds.distraction_threshold_secs {
            periods.push(DistractionPeriod {
                start_secs: start,
                end_secs: end,
            });
        }
    }
}
