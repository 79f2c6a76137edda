use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::Tier;
use super::quiz::QuizKind;

/// A graded quiz attempt. Never edited once appended to the history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub id: Uuid,
    pub kind: QuizKind,
    pub tier: Option<Tier>,
    pub quiz_number: Option<u8>,
    pub item_ids: Vec<String>,
    pub score: u8,
    pub total_questions: u32,
    #[serde(default)]
    pub correct_count: u32,
    pub passed: bool,
    pub time_taken_seconds: u64,
    pub completed_at: DateTime<Utc>,
    pub points_awarded: u32,
}

impl AttemptResult {
    pub fn is_passed_regular(&self, tier: Tier, quiz_number: u8) -> bool {
        self.passed
            && self.kind == QuizKind::Regular
            && self.tier == Some(tier)
            && self.quiz_number == Some(quiz_number)
    }

    pub fn is_passed_unit_test(&self, tier: Tier) -> bool {
        self.passed && self.kind == QuizKind::UnitTest && self.tier == Some(tier)
    }

    /// `(tier, quiz_number)` for passed regular attempts.
    pub fn curriculum_position(&self) -> Option<(Tier, u8)> {
        match (self.kind, self.passed, self.tier, self.quiz_number) {
            (QuizKind::Regular, true, Some(tier), Some(number)) => Some((tier, number)),
            _ => None,
        }
    }
}
