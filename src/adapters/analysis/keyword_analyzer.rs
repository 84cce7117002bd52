//! Keyword Analyzer - Heuristic UtteranceAnalyzer.
//!
//! Classifies utterances with marker phrases and keyword matching. A
//! reasoning gap is signalled by hand-waving phrases ("it just works",
//! "somehow"); an error by the student's own corrections ("wait, no",
//! "that's wrong"). Concept mentions come from each knowledge node's
//! keyword list.
//!
//! Deliberately cheap and deterministic; deployments wanting deeper
//! judgement can put a model-backed analyzer behind the same port.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::foundation::ConceptId;
use crate::ports::{AnalysisError, QuestionRecord, UtteranceAnalysis, UtteranceAnalyzer};

/// Phrases that signal a skipped reasoning step.
pub const GAP_MARKERS: &[&str] = &[
    "it just works",
    "somehow",
    "obviously",
    "i guess",
    "skip the details",
    "trust me",
    "magically",
    "and so on",
];

/// Phrases that signal the student caught an incorrect claim.
pub const ERROR_MARKERS: &[&str] = &[
    "wait, no",
    "wait no",
    "that's wrong",
    "that's not right",
    "i mean the opposite",
    "scratch that",
    "i messed up",
    "actually no",
];

/// Marker-phrase implementation of [`UtteranceAnalyzer`].
pub struct KeywordAnalyzer {
    gap_markers: Vec<String>,
    error_markers: Vec<String>,
}

impl KeywordAnalyzer {
    /// Creates an analyzer with the default marker sets.
    pub fn new() -> Self {
        Self {
            gap_markers: GAP_MARKERS.iter().map(|m| m.to_string()).collect(),
            error_markers: ERROR_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Adds a gap marker on top of the defaults.
    pub fn with_gap_marker(mut self, marker: impl Into<String>) -> Self {
        self.gap_markers.push(marker.into().to_lowercase());
        self
    }

    /// Adds an error marker on top of the defaults.
    pub fn with_error_marker(mut self, marker: impl Into<String>) -> Self {
        self.error_markers.push(marker.into().to_lowercase());
        self
    }

    fn contains_any(lowered: &str, markers: &[String]) -> bool {
        markers.iter().any(|marker| lowered.contains(marker))
    }

    /// Collects uncovered concepts whose label or keywords appear.
    fn mentioned_concepts(
        lowered: &str,
        question: &QuestionRecord,
        already_covered: &BTreeSet<ConceptId>,
    ) -> BTreeSet<ConceptId> {
        let mut mentioned = BTreeSet::new();

        for node in &question.knowledge_nodes {
            if already_covered.contains(&node.id) {
                continue;
            }

            let label_hit = lowered.contains(&node.label.to_lowercase());
            let keyword_hit = node
                .keywords
                .iter()
                .any(|keyword| lowered.contains(&keyword.to_lowercase()));

            if label_hit || keyword_hit {
                mentioned.insert(node.id.clone());
            }
        }

        mentioned
    }
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UtteranceAnalyzer for KeywordAnalyzer {
    async fn analyze(
        &self,
        utterance: &str,
        question: &QuestionRecord,
        already_covered: &BTreeSet<ConceptId>,
    ) -> Result<UtteranceAnalysis, AnalysisError> {
        let lowered = utterance.to_lowercase();

        Ok(UtteranceAnalysis {
            logic_gap: Self::contains_any(&lowered, &self.gap_markers),
            logic_error: Self::contains_any(&lowered, &self.error_markers),
            concepts_mentioned: Self::mentioned_concepts(&lowered, question, already_covered),
        })
    }
}
