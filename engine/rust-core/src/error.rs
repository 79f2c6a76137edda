use thiserror::Error;
use uuid::Uuid;

use crate::models::{QuestionType, QuizKind, Tier};

/// Generation could not produce a complete quiz from the catalog slice it was given.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No catalog items found for tier {0}")]
    TierNotFound(Tier),

    #[error("Quiz {quiz_number} is out of range for tier {tier}")]
    QuizNumberOutOfRange { tier: Tier, quiz_number: u8 },

    #[error("Item selection for {0} quiz is empty")]
    EmptyItemSelection(QuizKind),

    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),

    #[error("Item {0} has no examples")]
    NoExamples(String),

    #[error("Item {0} has an empty description")]
    EmptyDescription(String),

    #[error("{question_type} question needs {needed} distractors, only {available} available")]
    InsufficientDistractors {
        question_type: QuestionType,
        needed: usize,
        available: usize,
    },

    #[error("Need at least {needed} distinct items, only {available} available")]
    InsufficientItems { needed: usize, available: usize },

    #[error("Invalid quiz request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("History store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("History record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("History log is corrupt at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A quiz session is already active")]
    AlreadyActive,

    #[error("No quiz session is active")]
    NoActiveSession,

    #[error("Question {0} is not the current question")]
    UnexpectedQuestion(Uuid),

    #[error("Quiz generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to persist attempt: {0}")]
    Persistence(#[from] PersistenceError),
}

impl SessionError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, SessionError::Persistence(_))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate catalog item id: {0}")]
    DuplicateId(String),

    #[error("Catalog is empty")]
    Empty,

    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),
}
