//! Mock Analyzer - Scriptable UtteranceAnalyzer for tests.
//!
//! Returns queued judgements in FIFO order, falling back to an
//! unremarkable judgement once the queue is empty.

use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::ConceptId;
use crate::ports::{AnalysisError, QuestionRecord, UtteranceAnalysis, UtteranceAnalyzer};

/// A scripted outcome for one analyze call.
#[derive(Debug)]
pub enum MockJudgement {
    /// Return this analysis.
    Success(UtteranceAnalysis),
    /// Fail as unavailable.
    Unavailable,
}

/// Mock implementation of [`UtteranceAnalyzer`].
#[derive(Clone)]
pub struct MockAnalyzer {
    /// Queued judgements, consumed front to back.
    judgements: Arc<Mutex<VecDeque<MockJudgement>>>,
    /// Utterances observed so far.
    analyzed: Arc<Mutex<Vec<String>>>,
}

impl MockAnalyzer {
    /// Creates a mock with an empty judgement queue.
    pub fn new() -> Self {
        Self {
            judgements: Arc::new(Mutex::new(VecDeque::new())),
            analyzed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a judgement.
    pub fn with_judgement(self, analysis: UtteranceAnalysis) -> Self {
        if let Ok(mut judgements) = self.judgements.lock() {
            judgements.push_back(MockJudgement::Success(analysis));
        }
        self
    }

    /// Queues a gap finding.
    pub fn with_gap(self) -> Self {
        self.with_judgement(UtteranceAnalysis {
            logic_gap: true,
            ..UtteranceAnalysis::default()
        })
    }

    /// Queues an error finding.
    pub fn with_logic_error(self) -> Self {
        self.with_judgement(UtteranceAnalysis {
            logic_error: true,
            ..UtteranceAnalysis::default()
        })
    }

    /// Queues a judgement that only mentions concepts.
    pub fn with_mentions(self, concepts: BTreeSet<ConceptId>) -> Self {
        self.with_judgement(UtteranceAnalysis {
            concepts_mentioned: concepts,
            ..UtteranceAnalysis::default()
        })
    }

    /// Queues an unavailable failure.
    pub fn with_failure(self) -> Self {
        if let Ok(mut judgements) = self.judgements.lock() {
            judgements.push_back(MockJudgement::Unavailable);
        }
        self
    }

    /// Number of analyze calls observed so far.
    pub fn call_count(&self) -> usize {
        self.analyzed.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Snapshot of the utterances analyzed so far.
    pub fn analyzed_utterances(&self) -> Vec<String> {
        self.analyzed
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UtteranceAnalyzer for MockAnalyzer {
    async fn analyze(
        &self,
        utterance: &str,
        _question: &QuestionRecord,
        _already_covered: &BTreeSet<ConceptId>,
    ) -> Result<UtteranceAnalysis, AnalysisError> {
        if let Ok(mut analyzed) = self.analyzed.lock() {
            analyzed.push(utterance.to_string());
        }

        let judgement = self
            .judgements
            .lock()
            .ok()
            .and_then(|mut judgements| judgements.pop_front());

        match judgement {
            Some(MockJudgement::Success(analysis)) => Ok(analysis),
            Some(MockJudgement::Unavailable) => {
                Err(AnalysisError::unavailable("mock analyzer configured to fail"))
            }
            None => Ok(UtteranceAnalysis::unremarkable()),
        }
    }
}
