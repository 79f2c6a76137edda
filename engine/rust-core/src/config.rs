use serde::{Deserialize, Serialize};
use std::env;

use crate::models::QuestionType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub quiz: QuizSettings,
    pub daily: DailySettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizSettings {
    pub questions_per_regular_quiz: u32,
    pub questions_per_unit_test: u32,
    pub questions_per_daily_challenge: u32,
    pub questions_per_weekly_gauntlet: u32,
    pub paradoxes_per_regular_quiz: u32,
    pub question_time_limit_seconds: u32,
    pub passing_score_percent: u8,
    pub points_per_correct_answer: u32,
    pub question_type_distribution: QuestionTypeDistribution,
}

/// Share of a quiz's questions per type. Weights sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuestionTypeDistribution {
    pub example_selection: f64,
    pub true_false: f64,
    pub scenario_identification: f64,
    pub binary_choice: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySettings {
    pub reset_hour: u32,
    pub reset_minute: u32,
    pub reset_check_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    pub catalog_path: String,
    pub history_path: String,
    pub persist_max_attempts: usize,
}

impl QuestionTypeDistribution {
    pub fn weight(&self, question_type: QuestionType) -> f64 {
        match question_type {
            QuestionType::ExampleSelection => self.example_selection,
            QuestionType::TrueFalse => self.true_false,
            QuestionType::ScenarioIdentification => self.scenario_identification,
            QuestionType::BinaryChoice => self.binary_choice,
        }
    }

    pub fn weights(&self) -> [(QuestionType, f64); 4] {
        QuestionType::ALL.map(|question_type| (question_type, self.weight(question_type)))
    }
}

impl Default for QuestionTypeDistribution {
    fn default() -> Self {
        Self {
            example_selection: 0.4,
            true_false: 0.2,
            scenario_identification: 0.2,
            binary_choice: 0.2,
        }
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_regular_quiz: 10,
            questions_per_unit_test: 20,
            questions_per_daily_challenge: 10,
            questions_per_weekly_gauntlet: 50,
            paradoxes_per_regular_quiz: 5,
            question_time_limit_seconds: 10,
            passing_score_percent: 70,
            points_per_correct_answer: 10,
            question_type_distribution: QuestionTypeDistribution::default(),
        }
    }
}

impl Default for DailySettings {
    fn default() -> Self {
        Self {
            reset_hour: 0,
            reset_minute: 0,
            reset_check_interval_ms: 5000,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            catalog_path: "data/catalog.json".to_string(),
            history_path: "data/history.jsonl".to_string(),
            persist_max_attempts: 3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiz: QuizSettings::default(),
            daily: DailySettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real environment always wins
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        let defaults = Config::default();
        let quiz = &defaults.quiz;
        let distribution = &quiz.question_type_distribution;

        // Defaults < config/{env}.toml < APP__SECTION__KEY environment overrides
        let settings = config::Config::builder()
            .set_default("quiz.questions_per_regular_quiz", quiz.questions_per_regular_quiz)?
            .set_default("quiz.questions_per_unit_test", quiz.questions_per_unit_test)?
            .set_default(
                "quiz.questions_per_daily_challenge",
                quiz.questions_per_daily_challenge,
            )?
            .set_default(
                "quiz.questions_per_weekly_gauntlet",
                quiz.questions_per_weekly_gauntlet,
            )?
            .set_default("quiz.paradoxes_per_regular_quiz", quiz.paradoxes_per_regular_quiz)?
            .set_default(
                "quiz.question_time_limit_seconds",
                quiz.question_time_limit_seconds,
            )?
            .set_default("quiz.passing_score_percent", quiz.passing_score_percent)?
            .set_default("quiz.points_per_correct_answer", quiz.points_per_correct_answer)?
            .set_default(
                "quiz.question_type_distribution.example_selection",
                distribution.example_selection,
            )?
            .set_default(
                "quiz.question_type_distribution.true_false",
                distribution.true_false,
            )?
            .set_default(
                "quiz.question_type_distribution.scenario_identification",
                distribution.scenario_identification,
            )?
            .set_default(
                "quiz.question_type_distribution.binary_choice",
                distribution.binary_choice,
            )?
            .set_default("daily.reset_hour", defaults.daily.reset_hour)?
            .set_default("daily.reset_minute", defaults.daily.reset_minute)?
            .set_default(
                "daily.reset_check_interval_ms",
                defaults.daily.reset_check_interval_ms,
            )?
            .set_default("storage.catalog_path", defaults.storage.catalog_path.clone())?
            .set_default("storage.history_path", defaults.storage.history_path.clone())?
            .set_default(
                "storage.persist_max_attempts",
                defaults.storage.persist_max_attempts as u64,
            )?
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let quiz = &self.quiz;
        let weights = quiz.question_type_distribution.weights();

        if let Some((question_type, weight)) = weights.iter().find(|(_, weight)| *weight < 0.0) {
            return Err(invalid(format!(
                "question_type_distribution.{} must not be negative (got {})",
                question_type, weight
            )));
        }

        let sum: f64 = weights.iter().map(|(_, weight)| weight).sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(invalid(format!(
                "question_type_distribution must sum to 1.0 (got {})",
                sum
            )));
        }

        let counts = [
            ("questions_per_regular_quiz", quiz.questions_per_regular_quiz),
            ("questions_per_unit_test", quiz.questions_per_unit_test),
            ("questions_per_daily_challenge", quiz.questions_per_daily_challenge),
            ("questions_per_weekly_gauntlet", quiz.questions_per_weekly_gauntlet),
            ("paradoxes_per_regular_quiz", quiz.paradoxes_per_regular_quiz),
        ];
        if let Some((key, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(invalid(format!("quiz.{} must be greater than zero", key)));
        }

        if quiz.passing_score_percent > 100 {
            return Err(invalid(format!(
                "quiz.passing_score_percent must be at most 100 (got {})",
                quiz.passing_score_percent
            )));
        }

        if self.daily.reset_hour > 23 || self.daily.reset_minute > 59 {
            return Err(invalid(format!(
                "daily reset time {:02}:{:02} is not a valid wall-clock time",
                self.daily.reset_hour, self.daily.reset_minute
            )));
        }

        if self.daily.reset_check_interval_ms == 0 {
            return Err(invalid("daily.reset_check_interval_ms must be greater than zero".into()));
        }

        Ok(())
    }

    pub fn reset_time(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.daily.reset_hour, self.daily.reset_minute, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

fn invalid(message: String) -> config::ConfigError {
    config::ConfigError::Message(message)
}
