//! In-Memory Question Bank Adapter
//!
//! Serves question records from a process-local map. Question authoring
//! happens elsewhere; deployments seed this bank at startup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::QuestionId;
use crate::ports::{QuestionBank, QuestionBankError, QuestionRecord};

/// In-memory implementation of [`QuestionBank`].
#[derive(Debug, Clone)]
pub struct InMemoryQuestionBank {
    questions: Arc<RwLock<HashMap<QuestionId, QuestionRecord>>>,
}

impl InMemoryQuestionBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self {
            questions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a bank pre-seeded with the given questions
    pub fn with_questions(questions: Vec<QuestionRecord>) -> Self {
        let map = questions
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        Self {
            questions: Arc::new(RwLock::new(map)),
        }
    }

    /// Add or replace a question
    pub async fn insert(&self, record: QuestionRecord) {
        let mut questions = self.questions.write().await;
        questions.insert(record.id, record);
    }

    /// Get the number of stored questions
    pub async fn question_count(&self) -> usize {
        self.questions.read().await.len()
    }
}

impl Default for InMemoryQuestionBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn load_question(&self, id: &QuestionId) -> Result<QuestionRecord, QuestionBankError> {
        let questions = self.questions.read().await;
        questions
            .get(id)
            .cloned()
            .ok_or(QuestionBankError::NotFound { id: *id })
    }
}
