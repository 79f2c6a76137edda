use serde::{Deserialize, Serialize};

use super::content::{Tier, MAX_TIER};
use super::quiz::QuizKind;

/// Quiz number returned once tier 10 is fully passed; never generated.
pub const COMPLETED_QUIZ_NUMBER: u8 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NextUnit {
    pub kind: QuizKind,
    pub tier: Tier,
    pub quiz_number: Option<u8>,
}

impl NextUnit {
    pub fn regular(tier: Tier, quiz_number: u8) -> Self {
        Self {
            kind: QuizKind::Regular,
            tier,
            quiz_number: Some(quiz_number),
        }
    }

    pub fn unit_test(tier: Tier) -> Self {
        Self {
            kind: QuizKind::UnitTest,
            tier,
            quiz_number: None,
        }
    }

    pub fn curriculum_complete() -> Self {
        Self::regular(Tier::LAST, COMPLETED_QUIZ_NUMBER)
    }

    pub fn is_curriculum_complete(&self) -> bool {
        *self == Self::curriculum_complete()
    }

    /// Position in the linear curriculum; the unit test sorts after quiz 4 of its tier.
    pub fn rank(&self) -> (u8, u8) {
        if self.is_curriculum_complete() {
            return (MAX_TIER + 1, 0);
        }
        let step = match (self.kind, self.quiz_number) {
            (QuizKind::UnitTest, _) => COMPLETED_QUIZ_NUMBER,
            (_, Some(number)) => number,
            (_, None) => 0,
        };
        (self.tier.get(), step)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_attempts: usize,
    pub regular_attempts: usize,
    pub regular_passed: usize,
    /// Percentage of regular attempts that passed, 0.0 when none exist.
    pub regular_pass_rate: f64,
    pub quizzes_passed: usize,
    pub unit_tests_passed: usize,
    pub daily_challenges_passed: usize,
    pub weekly_gauntlets_passed: usize,
    pub custom_quizzes_passed: usize,
    pub total_points: u64,
}
