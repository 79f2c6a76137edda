pub mod achievement;
pub mod attempt;
pub mod content;
pub mod progress;
pub mod question;
pub mod quiz;
pub mod session;

pub use achievement::{
    AchievementRecord, BadgeAward, BadgeCriteria, BadgeDefinition, BadgeTrigger, MedalAward,
    MedalLevel, NewAchievements, TrophyAward, TrophyLevel,
};
pub use attempt::AttemptResult;
pub use content::{ContentItem, ItemFlags, Tier};
pub use progress::{NextUnit, ProgressStats};
pub use question::{Question, QuestionOption, QuestionType};
pub use quiz::{CustomQuizRequest, Quiz, QuizKind, QuizRequest, QUIZZES_PER_TIER};
pub use session::{Answer, Session, SessionPhase, SessionProgress};
