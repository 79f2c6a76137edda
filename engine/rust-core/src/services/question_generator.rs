use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use uuid::Uuid;

use crate::config::QuestionTypeDistribution;
use crate::error::GenerationError;
use crate::models::{ContentItem, Question, QuestionOption, QuestionType};

const OPTION_IDS: [&str; 4] = ["a", "b", "c", "d"];
const TRUE_OPTION_ID: &str = "true";
const FALSE_OPTION_ID: &str = "false";

/// Re-samples allowed per requested question before giving up.
const MAX_TRIES_PER_TARGET: usize = 4;

/// Builds single questions about a target item, drawing distractors from a pool.
pub struct QuestionGenerator<'a> {
    /// The quiz's own item set. True/false statements only borrow examples from here.
    quiz_items: Vec<&'a ContentItem>,
    pool: Vec<&'a ContentItem>,
    time_limit_seconds: u32,
}

impl<'a> QuestionGenerator<'a> {
    /// Distractors come from `quiz_items` unless a wider pool is set.
    pub fn new(quiz_items: Vec<&'a ContentItem>, time_limit_seconds: u32) -> Self {
        Self {
            pool: quiz_items.clone(),
            quiz_items,
            time_limit_seconds,
        }
    }

    /// Draws multiple-choice distractors from `pool`, which may or may not contain the target.
    pub fn with_distractor_pool(mut self, pool: Vec<&'a ContentItem>) -> Self {
        self.pool = pool;
        self
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        question_type: QuestionType,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Result<Question, GenerationError> {
        match question_type {
            QuestionType::ExampleSelection => self.example_selection(target, ordinal, rng),
            QuestionType::TrueFalse => self.true_false(target, ordinal, rng),
            QuestionType::ScenarioIdentification => {
                self.scenario_identification(target, ordinal, rng)
            }
            QuestionType::BinaryChoice => self.binary_choice(target, ordinal, rng),
        }
    }

    /// Four example texts; one belongs to the target.
    pub fn example_selection<R: Rng + ?Sized>(
        &self,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Result<Question, GenerationError> {
        let correct = pick_example(target, rng)?;

        let mut candidates: Vec<&str> = self
            .others(target)
            .flat_map(|item| usable_examples(item))
            .filter(|example| *example != correct && !target.examples.iter().any(|own| own == example))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let needed = QuestionType::ExampleSelection.option_count() - 1;
        if candidates.len() < needed {
            return Err(GenerationError::InsufficientDistractors {
                question_type: QuestionType::ExampleSelection,
                needed,
                available: candidates.len(),
            });
        }

        let distractors = candidates
            .choose_multiple(rng, needed)
            .map(|text| text.to_string())
            .collect();

        Ok(self.lettered(
            QuestionType::ExampleSelection,
            format!("Which of these is an example of {}?", target.title),
            correct.to_string(),
            distractors,
            target,
            ordinal,
            rng,
        ))
    }

    /// Shows one example; the learner says whether it belongs to the target.
    pub fn true_false<R: Rng + ?Sized>(
        &self,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Result<Question, GenerationError> {
        let genuine = pick_example(target, rng)?;

        let shown_false = if rng.random_bool(0.5) {
            None
        } else {
            let foreign: Vec<&str> = self
                .quiz_items
                .iter()
                .copied()
                .filter(|item| item.id != target.id)
                .flat_map(|item| usable_examples(item))
                .filter(|example| !target.examples.iter().any(|own| own == example))
                .collect();
            foreign.choose(rng).copied()
        };

        let (statement, answer) = match shown_false {
            Some(example) => (example, FALSE_OPTION_ID),
            None => (genuine, TRUE_OPTION_ID),
        };

        let mut options = vec![
            QuestionOption {
                id: TRUE_OPTION_ID.to_string(),
                text: "True".to_string(),
            },
            QuestionOption {
                id: FALSE_OPTION_ID.to_string(),
                text: "False".to_string(),
            },
        ];
        options.shuffle(rng);

        Ok(Question {
            id: Uuid::new_v4(),
            question_type: QuestionType::TrueFalse,
            question_text: format!(
                "True or false: \"{}\" is an example of {}.",
                statement, target.title
            ),
            options,
            correct_answer: answer.to_string(),
            source_item_id: target.id.clone(),
            source_item_title: target.title.clone(),
            ordinal,
            time_limit_seconds: self.time_limit_seconds,
        })
    }

    /// Shows the target's description; four titles to choose from.
    pub fn scenario_identification<R: Rng + ?Sized>(
        &self,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Result<Question, GenerationError> {
        if !target.has_description() {
            return Err(GenerationError::EmptyDescription(target.id.clone()));
        }

        let titles = self.other_titles(target);
        let needed = QuestionType::ScenarioIdentification.option_count() - 1;
        if titles.len() < needed {
            return Err(GenerationError::InsufficientDistractors {
                question_type: QuestionType::ScenarioIdentification,
                needed,
                available: titles.len(),
            });
        }

        let distractors = titles
            .choose_multiple(rng, needed)
            .map(|title| title.to_string())
            .collect();

        Ok(self.lettered(
            QuestionType::ScenarioIdentification,
            format!(
                "Which paradox does this scenario describe?\n\n{}",
                target.description.trim()
            ),
            target.title.clone(),
            distractors,
            target,
            ordinal,
            rng,
        ))
    }

    /// Shows one example; two titles to choose from.
    pub fn binary_choice<R: Rng + ?Sized>(
        &self,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Result<Question, GenerationError> {
        let example = pick_example(target, rng)?;

        let titles = self.other_titles(target);
        let other = titles
            .choose(rng)
            .ok_or(GenerationError::InsufficientItems {
                needed: 2,
                available: 1,
            })?;

        Ok(self.lettered(
            QuestionType::BinaryChoice,
            format!("Which paradox does this example illustrate?\n\n\"{}\"", example),
            target.title.clone(),
            vec![other.to_string()],
            target,
            ordinal,
            rng,
        ))
    }

    fn others<'s>(&'s self, target: &'s ContentItem) -> impl Iterator<Item = &'a ContentItem> + 's {
        self.pool
            .iter()
            .copied()
            .filter(move |item| item.id != target.id)
    }

    fn other_titles(&self, target: &ContentItem) -> Vec<&'a str> {
        let mut titles: Vec<&str> = self
            .others(target)
            .map(|item| item.title.as_str())
            .filter(|title| *title != target.title)
            .collect();
        titles.sort_unstable();
        titles.dedup();
        titles
    }

    /// Shuffles correct + distractor texts and labels them a, b, c, d.
    #[allow(clippy::too_many_arguments)]
    fn lettered<R: Rng + ?Sized>(
        &self,
        question_type: QuestionType,
        question_text: String,
        correct: String,
        distractors: Vec<String>,
        target: &ContentItem,
        ordinal: u32,
        rng: &mut R,
    ) -> Question {
        let mut texts: Vec<(String, bool)> = std::iter::once((correct, true))
            .chain(distractors.into_iter().map(|text| (text, false)))
            .collect();
        texts.shuffle(rng);

        let mut correct_answer = String::new();
        let options = texts
            .into_iter()
            .zip(OPTION_IDS)
            .map(|((text, is_correct), id)| {
                if is_correct {
                    correct_answer = id.to_string();
                }
                QuestionOption {
                    id: id.to_string(),
                    text,
                }
            })
            .collect();

        Question {
            id: Uuid::new_v4(),
            question_type,
            question_text,
            options,
            correct_answer,
            source_item_id: target.id.clone(),
            source_item_title: target.title.clone(),
            ordinal,
            time_limit_seconds: self.time_limit_seconds,
        }
    }
}

fn usable_examples(item: &ContentItem) -> impl Iterator<Item = &str> {
    item.examples
        .iter()
        .map(|example| example.as_str())
        .filter(|example| !example.trim().is_empty())
}

fn pick_example<'i, R: Rng + ?Sized>(
    item: &'i ContentItem,
    rng: &mut R,
) -> Result<&'i str, GenerationError> {
    let examples: Vec<&str> = usable_examples(item).collect();
    examples
        .choose(rng)
        .copied()
        .ok_or_else(|| GenerationError::NoExamples(item.id.clone()))
}

/// Splits `total` across question types by weight.
///
/// Every type but the last gets its rounded share; the last takes whatever is left,
/// so the counts always add up to `total`.
pub fn plan_type_counts(
    total: usize,
    distribution: &QuestionTypeDistribution,
) -> Vec<(QuestionType, usize)> {
    let weights = distribution.weights();
    let last = weights.len() - 1;
    let mut assigned = 0;

    weights
        .iter()
        .enumerate()
        .map(|(index, (question_type, weight))| {
            let remaining = total - assigned;
            let count = if index == last {
                remaining
            } else {
                ((weight * total as f64).round() as usize).min(remaining)
            };
            assigned += count;
            (*question_type, count)
        })
        .collect()
}

/// Generates `total` questions split by `distribution`, sampling targets with replacement.
///
/// A target that cannot produce the requested type is replaced by another random
/// target; the whole batch fails only when re-sampling keeps failing.
pub fn generate_mixed<R: Rng + ?Sized>(
    generator: &QuestionGenerator<'_>,
    targets: &[&ContentItem],
    total: usize,
    distribution: &QuestionTypeDistribution,
    rng: &mut R,
) -> Result<Vec<Question>, GenerationError> {
    if targets.is_empty() {
        return Err(GenerationError::InsufficientItems {
            needed: 1,
            available: 0,
        });
    }

    let max_tries = targets.len().max(1) * MAX_TRIES_PER_TARGET;
    let mut questions = Vec::with_capacity(total);

    for (question_type, count) in plan_type_counts(total, distribution) {
        for index in 0..count {
            let ordinal = index as u32 + 1;
            let mut last_error = None;

            for _ in 0..max_tries {
                let Some(target) = targets.choose(rng) else {
                    break;
                };
                match generator.generate(question_type, target, ordinal, rng) {
                    Ok(question) => {
                        questions.push(question);
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(
                            "Could not build {} question for {}: {}",
                            question_type,
                            target.id,
                            e
                        );
                        last_error = Some(e);
                    }
                }
            }

            if let Some(e) = last_error {
                return Err(e);
            }
        }
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, examples: &[&str]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            tier: Tier::FIRST,
            title: format!("{} paradox", id),
            description: format!("A situation where {} goes wrong", id),
            examples: examples.iter().map(|e| e.to_string()).collect(),
            is_favorite: false,
            is_learned: false,
        }
    }

    fn catalog() -> Vec<ContentItem> {
        vec![
            item("zeno", &["arrow in flight", "Achilles and the tortoise"]),
            item("liar", &["this sentence is false"]),
            item("sorites", &["heap of sand", "bald man"]),
            item("ship", &["ship of Theseus"]),
            item("barber", &["the barber who shaves"]),
        ]
    }

    #[test]
    fn plan_matches_default_distribution() {
        let counts = plan_type_counts(10, &QuestionTypeDistribution::default());
        assert_eq!(
            counts,
            vec![
                (QuestionType::ExampleSelection, 4),
                (QuestionType::TrueFalse, 2),
                (QuestionType::ScenarioIdentification, 2),
                (QuestionType::BinaryChoice, 2),
            ]
        );
    }

    #[test]
    fn plan_always_sums_to_total() {
        let distribution = QuestionTypeDistribution::default();
        for total in 0..60 {
            let sum: usize = plan_type_counts(total, &distribution)
                .iter()
                .map(|(_, count)| count)
                .sum();
            assert_eq!(sum, total);
        }
    }

    #[test]
    fn plan_gives_remainder_to_last_type() {
        let counts = plan_type_counts(3, &QuestionTypeDistribution::default());
        // 1.2 -> 1, 0.6 -> 1, 0.6 -> 1, remainder 0
        assert_eq!(counts[3], (QuestionType::BinaryChoice, 0));
    }

    #[test]
    fn every_variant_is_well_formed() {
        let items = catalog();
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(7);

        for seed_round in 0..25 {
            for question_type in QuestionType::ALL {
                let target = &items[seed_round % items.len()];
                let question = generator
                    .generate(question_type, target, 1, &mut rng)
                    .unwrap();
                assert!(question.is_well_formed(), "{:?}", question);
                assert_eq!(question.source_item_id, target.id);
                assert_eq!(question.time_limit_seconds, 10);
            }
        }
    }

    #[test]
    fn example_selection_fails_without_examples() {
        let mut items = catalog();
        items.push(item("empty", &[]));
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(1);

        let err = generator
            .example_selection(&items[5], 1, &mut rng)
            .unwrap_err();
        assert_eq!(err, GenerationError::NoExamples("empty".to_string()));
    }

    #[test]
    fn example_selection_correct_option_is_target_example() {
        let items = catalog();
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(3);

        let question = generator.example_selection(&items[0], 1, &mut rng).unwrap();
        let correct = question.option(&question.correct_answer).unwrap();
        assert!(items[0].examples.contains(&correct.text));
        let distractor_count = question
            .options
            .iter()
            .filter(|option| !items[0].examples.contains(&option.text))
            .count();
        assert_eq!(distractor_count, 3);
    }

    #[test]
    fn true_false_falls_back_to_true_without_other_items() {
        let items = vec![item("zeno", &["arrow in flight"])];
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..20 {
            let question = generator.true_false(&items[0], 1, &mut rng).unwrap();
            assert_eq!(question.correct_answer, TRUE_OPTION_ID);
        }
    }

    #[test]
    fn true_false_ignores_items_outside_the_quiz() {
        let items = catalog();
        let generator =
            QuestionGenerator::new(vec![&items[0]], 10).with_distractor_pool(items.iter().collect());
        let mut rng = StdRng::seed_from_u64(13);

        for _ in 0..30 {
            let question = generator.true_false(&items[0], 1, &mut rng).unwrap();
            assert_eq!(question.correct_answer, TRUE_OPTION_ID);
        }
        // The wider pool still supplies multiple-choice distractors.
        assert!(generator.example_selection(&items[0], 1, &mut rng).is_ok());
    }

    #[test]
    fn true_false_produces_both_answers() {
        let items = catalog();
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(5);

        let answers: Vec<String> = (0..40)
            .map(|_| {
                generator
                    .true_false(&items[1], 1, &mut rng)
                    .unwrap()
                    .correct_answer
            })
            .collect();
        assert!(answers.iter().any(|a| a == TRUE_OPTION_ID));
        assert!(answers.iter().any(|a| a == FALSE_OPTION_ID));
    }

    #[test]
    fn scenario_requires_description_and_three_other_titles() {
        let mut items = catalog();
        items[0].description = "   ".to_string();
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(
            generator
                .scenario_identification(&items[0], 1, &mut rng)
                .unwrap_err(),
            GenerationError::EmptyDescription("zeno".to_string())
        );

        let small: Vec<&ContentItem> = items.iter().skip(1).take(3).collect();
        let generator = QuestionGenerator::new(small, 10);
        assert!(matches!(
            generator.scenario_identification(&items[1], 1, &mut rng),
            Err(GenerationError::InsufficientDistractors { available: 2, .. })
        ));
    }

    #[test]
    fn binary_choice_needs_two_items() {
        let items = vec![item("zeno", &["arrow in flight"])];
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(2);

        assert!(matches!(
            generator.binary_choice(&items[0], 1, &mut rng),
            Err(GenerationError::InsufficientItems { needed: 2, .. })
        ));
    }

    #[test]
    fn correct_option_position_varies() {
        let items = catalog();
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let mut rng = StdRng::seed_from_u64(99);

        let mut positions = std::collections::HashSet::new();
        for _ in 0..40 {
            let question = generator.example_selection(&items[2], 1, &mut rng).unwrap();
            positions.insert(question.correct_answer);
        }
        assert!(positions.len() > 1);
    }

    #[test]
    fn mixed_generation_skips_unusable_targets() {
        let mut items = catalog();
        items.push(item("empty", &[]));
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let targets: Vec<&ContentItem> = items.iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        let questions = generate_mixed(
            &generator,
            &targets,
            10,
            &QuestionTypeDistribution::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(questions.len(), 10);
        assert!(questions.iter().all(Question::is_well_formed));
    }

    #[test]
    fn mixed_generation_fails_when_no_target_works() {
        let items = vec![item("empty", &[]), item("void", &[])];
        let generator = QuestionGenerator::new(items.iter().collect(), 10);
        let targets: Vec<&ContentItem> = items.iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        let result = generate_mixed(
            &generator,
            &targets,
            5,
            &QuestionTypeDistribution::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(GenerationError::NoExamples(_))));
    }
}
