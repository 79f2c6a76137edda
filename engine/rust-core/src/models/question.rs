use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ExampleSelection,
    TrueFalse,
    ScenarioIdentification,
    BinaryChoice,
}

impl QuestionType {
    /// Fixed order used when splitting a question budget across types.
    pub const ALL: [QuestionType; 4] = [
        QuestionType::ExampleSelection,
        QuestionType::TrueFalse,
        QuestionType::ScenarioIdentification,
        QuestionType::BinaryChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ExampleSelection => "example_selection",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ScenarioIdentification => "scenario_identification",
            QuestionType::BinaryChoice => "binary_choice",
        }
    }

    pub fn option_count(&self) -> usize {
        match self {
            QuestionType::ExampleSelection | QuestionType::ScenarioIdentification => 4,
            QuestionType::TrueFalse | QuestionType::BinaryChoice => 2,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub question_text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer: String,
    pub source_item_id: String,
    pub source_item_title: String,
    pub ordinal: u32,
    pub time_limit_seconds: u32,
}

impl Question {
    pub fn is_correct(&self, selected_option_id: &str) -> bool {
        self.correct_answer == selected_option_id
    }

    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// `correct_answer` names exactly one option and the option count fits the type.
    pub fn is_well_formed(&self) -> bool {
        let matches = self
            .options
            .iter()
            .filter(|option| option.id == self.correct_answer)
            .count();
        matches == 1 && self.options.len() == self.question_type.option_count()
    }
}
