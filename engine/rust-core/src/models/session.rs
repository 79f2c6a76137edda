use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Question;
use super::quiz::Quiz;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Starting,
    InProgress,
    Grading,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    /// `None` when the question timed out without a selection.
    pub selected_option_id: Option<String>,
    pub correct_option_id: String,
    pub is_correct: bool,
    pub time_taken_ms: u64,
}

impl Answer {
    pub fn for_question(question: &Question, selected: Option<String>, time_taken_ms: u64) -> Self {
        let is_correct = selected
            .as_deref()
            .map(|option_id| question.is_correct(option_id))
            .unwrap_or(false);
        Self {
            question_id: question.id,
            selected_option_id: selected,
            correct_option_id: question.correct_answer.clone(),
            is_correct,
            time_taken_ms,
        }
    }
}

/// Live play state for one quiz. Answers are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub quiz: Quiz,
    answers: Vec<Answer>,
    current_question_index: usize,
    pub started_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub correct: usize,
    pub is_complete: bool,
}

impl Session {
    pub fn new(quiz: Quiz, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz,
            answers: Vec::new(),
            current_question_index: 0,
            started_at,
            is_active: true,
        }
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.current_question_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_question_index >= self.quiz.questions.len()
    }

    pub fn progress(&self) -> SessionProgress {
        let total = self.quiz.questions.len();
        let answered = self.answers.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            correct: self.answers.iter().filter(|answer| answer.is_correct).count(),
            is_complete: self.is_finished(),
        }
    }

    /// Records an answer for the current question and advances.
    pub(crate) fn record(&mut self, selected: Option<String>, time_taken_ms: u64) -> Option<&Answer> {
        let question = self.current_question()?;
        let answer = Answer::for_question(question, selected, time_taken_ms);
        self.answers.push(answer);
        self.current_question_index += 1;
        self.answers.last()
    }
}
