//! Word timing and pause extraction.
//!
//! Transcription reports per-word timing relative to the start of each
//! utterance. Pauses are the silent gaps between consecutive words; the
//! session shifts them onto one continuous speaking timeline so that
//! later focus analysis can cluster them across turns.

use serde::{Deserialize, Serialize};

/// Timing of a single recognized word within one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start_secs: f64, end_secs: f64) -> Self {
        Self {
            word: word.into(),
            start_secs,
            end_secs,
        }
    }
}

/// A silent interval between two words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pause {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl Pause {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Moves the pause onto a later timeline origin.
    pub fn shift_by(&self, offset_secs: f64) -> Self {
        Self {
            start_secs: self.start_secs + offset_secs,
            end_secs: self.end_secs + offset_secs,
        }
    }
}

/// Extracts pauses from word timings ordered by start time.
///
/// A gap qualifies as a pause when it lasts at least `min_gap_secs`.
/// Overlapping or touching words produce no pause.
pub fn derive_pauses(timings: &[WordTiming], min_gap_secs: f64) -> Vec<Pause> {
    let mut pauses = Vec::new();
    for pair in timings.windows(2) {
        let gap = pair[1].start_secs - pair[0].end_secs;
        if gap >= min_gap_secs && gap > 0.0 {
            pauses.push(Pause::new(pair[0].end_secs, pair[1].start_secs));
        }
    }
    pauses
}

/// Accumulated speaking activity for one session.
///
/// Utterances are appended end to end, so pause offsets from later turns
/// are shifted past all earlier speaking time. Wall-clock gaps between
/// turns are not counted as pauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechStats {
    speaking_secs: f64,
    word_count: usize,
    pauses: Vec<Pause>,
}

impl SpeechStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one utterance, shifting its pauses onto the session timeline.
    pub fn record_utterance(&mut self, word_count: usize, duration_secs: f64, pauses: &[Pause]) {
        let offset = self.speaking_secs;
        self.pauses
            .extend(pauses.iter().map(|pause| pause.shift_by(offset)));
        self.word_count += word_count;
        self.speaking_secs += duration_secs.max(0.0);
    }

    /// Total recorded speaking time across all turns, in seconds.
    pub fn speaking_secs(&self) -> f64 {
        self.speaking_secs
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// All pauses on the session timeline, in arrival order.
    pub fn pauses(&self) -> &[Pause] {
        &self.pauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(word: &str, start: f64, end: f64) -> WordTiming {
        WordTiming::new(word, start, end)
    }

    mod derivation {
        use super::*;

        #[test]
        fn finds_gaps_at_or_above_the_minimum() {
            let timings = [
                timing("the", 0.0, 0.3),
                timing("answer", 0.4, 0.9),
                timing("is", 2.1, 2.4),
            ];
            let pauses = derive_pauses(&timings, 0.8);
            assert_eq!(pauses, vec![Pause::new(0.9, 2.1)]);
        }

        #[test]
        fn gap_exactly_at_the_minimum_counts() {
            let timings = [timing("so", 0.0, 1.0), timing("then", 1.8, 2.2)];
            let pauses = derive_pauses(&timings, 0.8);
            assert_eq!(pauses.len(), 1);
            assert!((pauses[0].duration_secs() - 0.8).abs() < 1e-9);
        }

        #[test]
        fn short_gaps_are_not_pauses() {
            let timings = [timing("a", 0.0, 0.5), timing("b", 0.7, 1.0)];
            assert!(derive_pauses(&timings, 0.8).is_empty());
        }

        #[test]
        fn overlapping_words_produce_nothing() {
            let timings = [timing("uh", 0.0, 1.0), timing("well", 0.6, 1.4)];
            assert!(derive_pauses(&timings, 0.1).is_empty());
        }

        #[test]
        fn fewer_than_two_words_produce_nothing() {
            assert!(derive_pauses(&[], 0.8).is_empty());
            assert!(derive_pauses(&[timing("hm", 0.0, 0.4)], 0.8).is_empty());
        }

        #[test]
        fn multiple_pauses_keep_order() {
            let timings = [
                timing("first", 0.0, 0.5),
                timing("second", 2.0, 2.5),
                timing("third", 5.0, 5.5),
            ];
            let pauses = derive_pauses(&timings, 1.0);
            assert_eq!(
                pauses,
                vec![Pause::new(0.5, 2.0), Pause::new(2.5, 5.0)]
            );
        }
    }

    mod accumulation {
        use super::*;

        #[test]
        fn later_utterances_are_shifted_past_earlier_speaking_time() {
            let mut stats = SpeechStats::new();
            stats.record_utterance(10, 20.0, &[Pause::new(3.0, 5.0)]);
            stats.record_utterance(5, 10.0, &[Pause::new(1.0, 2.5)]);

            assert_eq!(stats.word_count(), 15);
            assert!((stats.speaking_secs() - 30.0).abs() < 1e-9);
            assert_eq!(
                stats.pauses(),
                &[Pause::new(3.0, 5.0), Pause::new(21.0, 22.5)]
            );
        }

        #[test]
        fn negative_duration_does_not_shrink_the_timeline() {
            let mut stats = SpeechStats::new();
            stats.record_utterance(3, -4.0, &[]);
            assert_eq!(stats.speaking_secs(), 0.0);
            assert_eq!(stats.word_count(), 3);
        }

        #[test]
        fn empty_stats_report_zeroes() {
            let stats = SpeechStats::new();
            assert_eq!(stats.speaking_secs(), 0.0);
            assert_eq!(stats.word_count(), 0);
            assert!(stats.pauses().is_empty());
        }
    }
}
