//! Analysis Port - Interface for utterance classification.
//!
//! After each committed utterance, a collaborator decides whether the
//! student left a reasoning gap, made an outright error, and which
//! knowledge nodes they touched. The engine turns that judgement into a
//! phase event; coverage itself is accounted by the session, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::ConceptId;

use super::question_bank::QuestionRecord;

/// Port for classifying one student utterance.
#[async_trait]
pub trait UtteranceAnalyzer: Send + Sync {
    /// Classifies an utterance against the question's expectations.
    ///
    /// `already_covered` lets implementations skip concepts the session
    /// has settled and concentrate on what is still open.
    async fn analyze(
        &self,
        utterance: &str,
        question: &QuestionRecord,
        already_covered: &BTreeSet<ConceptId>,
    ) -> Result<UtteranceAnalysis, AnalysisError>;
}

/// Judgement over a single utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtteranceAnalysis {
    /// The reasoning skipped a step without being wrong.
    pub logic_gap: bool,
    /// The reasoning contains an incorrect claim.
    pub logic_error: bool,
    /// Knowledge nodes this utterance addressed.
    pub concepts_mentioned: BTreeSet<ConceptId>,
}

impl UtteranceAnalysis {
    /// Judgement with no findings.
    pub fn unremarkable() -> Self {
        Self::default()
    }

    /// Returns true when the utterance raised no flags at all.
    pub fn is_unremarkable(&self) -> bool {
        !self.logic_gap && !self.logic_error && self.concepts_mentioned.is_empty()
    }
}

/// Analysis service errors.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Classifier is unavailable.
    #[error("analysis unavailable: {message}")]
    Unavailable { message: String },

    /// Classifier produced output that could not be interpreted.
    #[error("uninterpretable analysis: {0}")]
    Uninterpretable(String),
}

impl AnalysisError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
