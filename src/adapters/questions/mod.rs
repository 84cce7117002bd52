//! Question Bank Adapters.
//!
//! Implementations of the QuestionBank port.
//!
//! ## Available Adapters
//!
//! - `InMemoryQuestionBank` - Process-local map seeded at startup

mod in_memory_question_bank;

pub use in_memory_question_bank::InMemoryQuestionBank;
