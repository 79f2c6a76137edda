use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Answer, AttemptResult, Quiz};

/// Scores a finished quiz. Pure: the same inputs always give the same result.
///
/// Questions without an answer count as wrong. Answers naming a question that is not
/// in the quiz are ignored.
pub fn grade(
    quiz: &Quiz,
    answers: &[Answer],
    points_per_correct_answer: u32,
    completed_at: DateTime<Utc>,
) -> AttemptResult {
    let mut by_question: HashMap<Uuid, &Answer> = HashMap::with_capacity(answers.len());
    for answer in answers {
        if quiz.question(answer.question_id).is_none() {
            tracing::warn!(
                "Ignoring answer for unknown question {} in quiz {}",
                answer.question_id,
                quiz.id
            );
            continue;
        }
        by_question.entry(answer.question_id).or_insert(answer);
    }

    let correct_count = quiz
        .questions
        .iter()
        .filter(|question| {
            by_question
                .get(&question.id)
                .and_then(|answer| answer.selected_option_id.as_deref())
                .is_some_and(|selected| question.is_correct(selected))
        })
        .count() as u32;

    let total_questions = quiz.questions.len() as u32;
    let score = score_percent(correct_count, total_questions);
    let passed = score >= quiz.passing_score_percent;

    let time_taken_ms = by_question
        .values()
        .fold(0u64, |total, answer| total.saturating_add(answer.time_taken_ms));

    AttemptResult {
        id: quiz.id,
        kind: quiz.kind,
        tier: quiz.tier,
        quiz_number: quiz.quiz_number,
        item_ids: quiz.item_ids.clone(),
        score,
        total_questions,
        correct_count,
        passed,
        time_taken_seconds: time_taken_ms.saturating_add(500) / 1000,
        completed_at,
        points_awarded: if passed {
            correct_count.saturating_mul(points_per_correct_answer)
        } else {
            0
        },
    }
}

/// `round(correct / total * 100)`, 0 for an empty quiz.
pub fn score_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (correct.min(total) as f64 / total as f64 * 100.0).round();
    percent as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionOption, QuestionType, QuizKind, Tier};

    fn quiz(question_count: usize) -> Quiz {
        let questions = (0..question_count)
            .map(|index| Question {
                id: Uuid::new_v4(),
                question_type: QuestionType::BinaryChoice,
                question_text: format!("Question {}", index),
                options: vec![
                    QuestionOption {
                        id: "a".into(),
                        text: "Right".into(),
                    },
                    QuestionOption {
                        id: "b".into(),
                        text: "Wrong".into(),
                    },
                ],
                correct_answer: "a".into(),
                source_item_id: "zeno".into(),
                source_item_title: "Zeno".into(),
                ordinal: index as u32 + 1,
                time_limit_seconds: 10,
            })
            .collect();

        Quiz {
            id: Uuid::new_v4(),
            kind: QuizKind::Regular,
            tier: Tier::new(1),
            quiz_number: Some(1),
            item_ids: vec!["zeno".into()],
            questions,
            passing_score_percent: 70,
            time_limit_seconds: 100,
        }
    }

    fn answer_all(quiz: &Quiz, correct: usize) -> Vec<Answer> {
        quiz.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected = if index < correct { "a" } else { "b" };
                Answer::for_question(question, Some(selected.to_string()), 1500)
            })
            .collect()
    }

    #[test]
    fn six_of_ten_fails_with_no_points() {
        let quiz = quiz(10);
        let result = grade(&quiz, &answer_all(&quiz, 6), 10, Utc::now());
        assert_eq!(result.score, 60);
        assert!(!result.passed);
        assert_eq!(result.points_awarded, 0);
        assert_eq!(result.correct_count, 6);
    }

    #[test]
    fn passing_attempt_earns_points_per_correct_answer() {
        let quiz = quiz(10);
        let result = grade(&quiz, &answer_all(&quiz, 8), 10, Utc::now());
        assert_eq!(result.score, 80);
        assert!(result.passed);
        assert_eq!(result.points_awarded, 80);
        assert_eq!(result.time_taken_seconds, 15);
    }

    #[test]
    fn score_exactly_at_threshold_passes() {
        let quiz = quiz(10);
        let result = grade(&quiz, &answer_all(&quiz, 7), 10, Utc::now());
        assert_eq!(result.score, 70);
        assert!(result.passed);
    }

    #[test]
    fn missing_answers_count_as_incorrect() {
        let quiz = quiz(4);
        let answers = answer_all(&quiz, 4)[..2].to_vec();
        let result = grade(&quiz, &answers, 10, Utc::now());
        assert_eq!(result.score, 50);
        assert_eq!(result.total_questions, 4);
    }

    #[test]
    fn unknown_question_answers_are_ignored() {
        let quiz = quiz(2);
        let mut answers = answer_all(&quiz, 2);
        answers.push(Answer {
            question_id: Uuid::new_v4(),
            selected_option_id: Some("a".into()),
            correct_option_id: "a".into(),
            is_correct: true,
            time_taken_ms: 99_000,
        });
        let result = grade(&quiz, &answers, 10, Utc::now());
        assert_eq!(result.score, 100);
        assert_eq!(result.time_taken_seconds, 3);
    }

    #[test]
    fn timed_out_answer_is_incorrect() {
        let quiz = quiz(1);
        let answers = vec![Answer::for_question(&quiz.questions[0], None, 10_000)];
        let result = grade(&quiz, &answers, 10, Utc::now());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn huge_answer_times_saturate() {
        let quiz = quiz(2);
        let answers: Vec<Answer> = quiz
            .questions
            .iter()
            .map(|question| Answer::for_question(question, Some("a".into()), u64::MAX))
            .collect();
        let result = grade(&quiz, &answers, u32::MAX, Utc::now());
        assert_eq!(result.time_taken_seconds, u64::MAX / 1000);
        assert_eq!(result.points_awarded, u32::MAX);
    }

    #[test]
    fn grading_is_deterministic() {
        let quiz = quiz(7);
        let answers = answer_all(&quiz, 5);
        let at = Utc::now();
        assert_eq!(grade(&quiz, &answers, 10, at), grade(&quiz, &answers, 10, at));
    }

    #[test]
    fn score_rounds_to_nearest() {
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(5, 5), 100);
    }
}
