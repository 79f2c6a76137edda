use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::config::QuizSettings;
use crate::error::GenerationError;
use crate::metrics::{QUIZZES_GENERATED_TOTAL, QUIZ_GENERATION_FAILURES_TOTAL};
use crate::models::{
    ContentItem, CustomQuizRequest, Quiz, QuizKind, QuizRequest, Tier, QUIZZES_PER_TIER,
};
use crate::stores::CatalogRepository;

use super::question_generator::{generate_mixed, QuestionGenerator};

/// Smallest item set that can supply distractors for four-option questions on its own.
const MIN_SELF_CONTAINED_POOL: usize = 4;

/// Assembles complete quizzes from the catalog. Output is all-or-nothing.
pub struct QuizGenerator<'c> {
    catalog: &'c CatalogRepository,
    settings: &'c QuizSettings,
}

impl<'c> QuizGenerator<'c> {
    pub fn new(catalog: &'c CatalogRepository, settings: &'c QuizSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &QuizRequest,
        rng: &mut R,
    ) -> Result<Quiz, GenerationError> {
        let kind = request.kind();
        let result = match request {
            QuizRequest::Regular { tier, quiz_number } => self.regular(*tier, *quiz_number, rng),
            QuizRequest::UnitTest { tier } => self.unit_test(*tier, rng),
            QuizRequest::DailyChallenge { item_id } => self.daily_challenge(item_id, rng),
            QuizRequest::Custom(custom) => self.custom(custom, rng),
            QuizRequest::WeeklyGauntlet => self.weekly_gauntlet(rng),
        };

        match &result {
            Ok(quiz) => {
                QUIZZES_GENERATED_TOTAL
                    .with_label_values(&[kind.as_str()])
                    .inc();
                tracing::info!(
                    "Generated {} quiz {} with {} questions over {} items",
                    kind,
                    quiz.id,
                    quiz.questions.len(),
                    quiz.item_ids.len()
                );
            }
            Err(e) => {
                QUIZ_GENERATION_FAILURES_TOTAL
                    .with_label_values(&[kind.as_str()])
                    .inc();
                tracing::warn!("Failed to generate {} quiz: {}", kind, e);
            }
        }

        result
    }

    /// A `paradoxes_per_regular_quiz` slice of one tier.
    pub fn regular<R: Rng + ?Sized>(
        &self,
        tier: Tier,
        quiz_number: u8,
        rng: &mut R,
    ) -> Result<Quiz, GenerationError> {
        if !(1..=QUIZZES_PER_TIER).contains(&quiz_number) {
            return Err(GenerationError::QuizNumberOutOfRange { tier, quiz_number });
        }

        let tier_items = self.tier_items(tier)?;
        let per_quiz = self.settings.paradoxes_per_regular_quiz as usize;
        let offset = (quiz_number as usize - 1) * per_quiz;
        if offset >= tier_items.len() {
            return Err(GenerationError::QuizNumberOutOfRange { tier, quiz_number });
        }
        let end = (offset + per_quiz).min(tier_items.len());

        self.assemble(
            QuizKind::Regular,
            Some(tier),
            Some(quiz_number),
            tier_items[offset..end].to_vec(),
            self.settings.questions_per_regular_quiz as usize,
            rng,
        )
    }

    /// Every item of one tier.
    pub fn unit_test<R: Rng + ?Sized>(&self, tier: Tier, rng: &mut R) -> Result<Quiz, GenerationError> {
        let tier_items = self.tier_items(tier)?;
        self.assemble(
            QuizKind::UnitTest,
            Some(tier),
            None,
            tier_items,
            self.settings.questions_per_unit_test as usize,
            rng,
        )
    }

    /// All questions target the single featured item.
    pub fn daily_challenge<R: Rng + ?Sized>(
        &self,
        item_id: &str,
        rng: &mut R,
    ) -> Result<Quiz, GenerationError> {
        let item = self
            .catalog
            .content(item_id)
            .ok_or_else(|| GenerationError::UnknownItem(item_id.to_string()))?;
        self.assemble(
            QuizKind::DailyChallenge,
            None,
            None,
            vec![item],
            self.settings.questions_per_daily_challenge as usize,
            rng,
        )
    }

    pub fn custom<R: Rng + ?Sized>(
        &self,
        request: &CustomQuizRequest,
        rng: &mut R,
    ) -> Result<Quiz, GenerationError> {
        request
            .validate()
            .map_err(|e| GenerationError::InvalidRequest(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(request.item_ids.len());
        for id in &request.item_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let item = self
                .catalog
                .content(id)
                .ok_or_else(|| GenerationError::UnknownItem(id.clone()))?;
            items.push(item);
        }

        self.assemble(
            QuizKind::Custom,
            None,
            None,
            items,
            request.question_count as usize,
            rng,
        )
    }

    /// Marathon over the entire catalog.
    pub fn weekly_gauntlet<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Quiz, GenerationError> {
        self.assemble(
            QuizKind::WeeklyGauntlet,
            None,
            None,
            self.catalog.items().iter().collect(),
            self.settings.questions_per_weekly_gauntlet as usize,
            rng,
        )
    }

    fn tier_items(&self, tier: Tier) -> Result<Vec<&'c ContentItem>, GenerationError> {
        let items = self.catalog.by_tier(tier);
        if items.is_empty() {
            return Err(GenerationError::TierNotFound(tier));
        }
        Ok(items)
    }

    fn assemble<R: Rng + ?Sized>(
        &self,
        kind: QuizKind,
        tier: Option<Tier>,
        quiz_number: Option<u8>,
        items: Vec<&'c ContentItem>,
        question_count: usize,
        rng: &mut R,
    ) -> Result<Quiz, GenerationError> {
        if items.is_empty() {
            return Err(GenerationError::EmptyItemSelection(kind));
        }

        let mut generator =
            QuestionGenerator::new(items.clone(), self.settings.question_time_limit_seconds);
        // Small item sets borrow multiple-choice distractors from the whole catalog.
        if items.len() < MIN_SELF_CONTAINED_POOL {
            generator = generator.with_distractor_pool(self.catalog.items().iter().collect());
        }
        let mut questions = generate_mixed(
            &generator,
            &items,
            question_count,
            &self.settings.question_type_distribution,
            rng,
        )?;

        questions.shuffle(rng);
        for (index, question) in questions.iter_mut().enumerate() {
            question.ordinal = index as u32 + 1;
        }

        tracing::debug!(
            "Assembled {} quiz: tier={:?}, quiz_number={:?}, questions={}",
            kind,
            tier,
            quiz_number,
            questions.len()
        );

        Ok(Quiz {
            id: Uuid::new_v4(),
            kind,
            tier,
            quiz_number,
            item_ids: items.iter().map(|item| item.id.clone()).collect(),
            time_limit_seconds: self.settings.question_time_limit_seconds
                * questions.len() as u32,
            questions,
            passing_score_percent: self.settings.passing_score_percent,
        })
    }
}
