use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::content::Tier;
use super::question::Question;

/// Regular quizzes per tier; the unit test follows the last one.
pub const QUIZZES_PER_TIER: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    Regular,
    UnitTest,
    DailyChallenge,
    Custom,
    WeeklyGauntlet,
}

impl QuizKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizKind::Regular => "regular",
            QuizKind::UnitTest => "unit_test",
            QuizKind::DailyChallenge => "daily_challenge",
            QuizKind::Custom => "custom",
            QuizKind::WeeklyGauntlet => "weekly_gauntlet",
        }
    }

    pub fn is_curriculum(&self) -> bool {
        matches!(self, QuizKind::Regular | QuizKind::UnitTest)
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Uuid,
    pub kind: QuizKind,
    pub tier: Option<Tier>,
    pub quiz_number: Option<u8>,
    pub item_ids: Vec<String>,
    pub questions: Vec<Question>,
    pub passing_score_percent: u8,
    pub time_limit_seconds: u32,
}

impl Quiz {
    pub fn question(&self, question_id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == question_id)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

/// Caller-selected item subset for a custom quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomQuizRequest {
    #[validate(length(min = 3, message = "custom quiz needs at least 3 items"))]
    pub item_ids: Vec<String>,
    #[validate(range(min = 5, max = 30, message = "question count must be between 5 and 30"))]
    pub question_count: u32,
}

/// What the caller asks the orchestrator to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizRequest {
    Regular { tier: Tier, quiz_number: u8 },
    UnitTest { tier: Tier },
    DailyChallenge { item_id: String },
    Custom(CustomQuizRequest),
    WeeklyGauntlet,
}

impl QuizRequest {
    pub fn kind(&self) -> QuizKind {
        match self {
            QuizRequest::Regular { .. } => QuizKind::Regular,
            QuizRequest::UnitTest { .. } => QuizKind::UnitTest,
            QuizRequest::DailyChallenge { .. } => QuizKind::DailyChallenge,
            QuizRequest::Custom(_) => QuizKind::Custom,
            QuizRequest::WeeklyGauntlet => QuizKind::WeeklyGauntlet,
        }
    }
}
