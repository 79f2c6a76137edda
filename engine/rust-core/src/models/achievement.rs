use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::Tier;
use super::quiz::QuizKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MedalLevel {
    Bronze,
    Silver,
    Gold,
}

impl MedalLevel {
    /// Level earned by a passed regular quiz, if any.
    pub fn for_score(score: u8) -> Option<Self> {
        match score {
            90..=u8::MAX => Some(MedalLevel::Gold),
            80..=89 => Some(MedalLevel::Silver),
            70..=79 => Some(MedalLevel::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MedalLevel::Bronze => "bronze",
            MedalLevel::Silver => "silver",
            MedalLevel::Gold => "gold",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrophyLevel {
    SmallTrophy,
    LargeTrophy,
}

impl TrophyLevel {
    pub fn for_score(score: u8) -> Option<Self> {
        match score {
            85..=u8::MAX => Some(TrophyLevel::LargeTrophy),
            70..=84 => Some(TrophyLevel::SmallTrophy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrophyLevel::SmallTrophy => "small_trophy",
            TrophyLevel::LargeTrophy => "large_trophy",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub badge_id: String,
    pub attempt_id: Uuid,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedalAward {
    pub tier: Tier,
    pub quiz_number: u8,
    #[serde(rename = "award_level")]
    pub level: MedalLevel,
    pub score: u8,
    pub attempt_id: Uuid,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrophyAward {
    pub tier: Tier,
    #[serde(rename = "award_level")]
    pub level: TrophyLevel,
    pub score: u8,
    pub attempt_id: Uuid,
    pub earned_at: DateTime<Utc>,
}

/// Persisted achievement log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementRecord {
    Badge(BadgeAward),
    Medal(MedalAward),
    Trophy(TrophyAward),
}

impl AchievementRecord {
    pub fn family(&self) -> &'static str {
        match self {
            AchievementRecord::Badge(_) => "badge",
            AchievementRecord::Medal(_) => "medal",
            AchievementRecord::Trophy(_) => "trophy",
        }
    }

    pub fn is_badge(&self, badge_id: &str) -> bool {
        matches!(self, AchievementRecord::Badge(award) if award.badge_id == badge_id)
    }

    pub fn is_medal(&self, tier: Tier, quiz_number: u8, level: MedalLevel) -> bool {
        matches!(
            self,
            AchievementRecord::Medal(award)
                if award.tier == tier && award.quiz_number == quiz_number && award.level == level
        )
    }

    pub fn is_trophy(&self, tier: Tier, level: TrophyLevel) -> bool {
        matches!(
            self,
            AchievementRecord::Trophy(award) if award.tier == tier && award.level == level
        )
    }

    /// Whether `other` grants the same award: same badge id, same medal
    /// (tier, quiz, level) or same trophy (tier, level).
    pub fn is_same_award(&self, other: &AchievementRecord) -> bool {
        match other {
            AchievementRecord::Badge(award) => self.is_badge(&award.badge_id),
            AchievementRecord::Medal(award) => {
                self.is_medal(award.tier, award.quiz_number, award.level)
            }
            AchievementRecord::Trophy(award) => self.is_trophy(award.tier, award.level),
        }
    }
}

/// What kind of attempt makes a badge worth checking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTrigger {
    Quiz(QuizKind),
    /// Checked after every attempt.
    Points,
    /// Checked after every attempt.
    Streak,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    MinPoints { points: u64 },
    MinCompleted { kind: QuizKind, count: u32 },
    TierCompleted { tier: Tier },
    MinStreak { days: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub triggers: Vec<BadgeTrigger>,
    pub criteria: BadgeCriteria,
}

impl BadgeDefinition {
    pub fn is_triggered_by(&self, kind: QuizKind) -> bool {
        self.triggers.iter().any(|trigger| match trigger {
            BadgeTrigger::Quiz(trigger_kind) => *trigger_kind == kind,
            BadgeTrigger::Points | BadgeTrigger::Streak => true,
        })
    }
}

/// Awards produced by one evaluation, grouped by family.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewAchievements {
    pub badges: Vec<BadgeAward>,
    pub medals: Vec<MedalAward>,
    pub trophies: Vec<TrophyAward>,
}

impl NewAchievements {
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty() && self.medals.is_empty() && self.trophies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.badges.len() + self.medals.len() + self.trophies.len()
    }

    pub fn to_records(&self) -> Vec<AchievementRecord> {
        self.medals
            .iter()
            .cloned()
            .map(AchievementRecord::Medal)
            .chain(self.trophies.iter().cloned().map(AchievementRecord::Trophy))
            .chain(self.badges.iter().cloned().map(AchievementRecord::Badge))
            .collect()
    }
}
