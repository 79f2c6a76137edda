use std::collections::BTreeSet;

use crate::models::{AttemptResult, NextUnit, ProgressStats, QuizKind, Tier, QUIZZES_PER_TIER};

/// The single next unit in the regular/unit-test curriculum.
pub fn next_unit(history: &[AttemptResult]) -> NextUnit {
    let Some((tier, quiz_number)) = passed_quizzes(history).into_iter().next_back() else {
        return NextUnit::regular(Tier::FIRST, 1);
    };

    if quiz_number < QUIZZES_PER_TIER {
        return NextUnit::regular(tier, quiz_number + 1);
    }

    if !history.iter().any(|attempt| attempt.is_passed_unit_test(tier)) {
        return NextUnit::unit_test(tier);
    }

    match tier.next() {
        Some(next_tier) => NextUnit::regular(next_tier, 1),
        None => NextUnit::curriculum_complete(),
    }
}

/// Distinct `(tier, quiz_number)` pairs with a passed regular attempt, in curriculum order.
pub fn passed_quizzes(history: &[AttemptResult]) -> BTreeSet<(Tier, u8)> {
    history
        .iter()
        .filter_map(AttemptResult::curriculum_position)
        .filter(|(_, number)| (1..=QUIZZES_PER_TIER).contains(number))
        .collect()
}

/// Tiers with a passed unit test.
pub fn completed_tiers(history: &[AttemptResult]) -> BTreeSet<Tier> {
    history
        .iter()
        .filter(|attempt| attempt.passed && attempt.kind == QuizKind::UnitTest)
        .filter_map(|attempt| attempt.tier)
        .collect()
}

pub fn progress_stats(history: &[AttemptResult]) -> ProgressStats {
    let regular: Vec<&AttemptResult> = history
        .iter()
        .filter(|attempt| attempt.kind == QuizKind::Regular)
        .collect();
    let regular_passed = regular.iter().filter(|attempt| attempt.passed).count();
    let regular_pass_rate = if regular.is_empty() {
        0.0
    } else {
        regular_passed as f64 / regular.len() as f64 * 100.0
    };

    let passed_of_kind = |kind: QuizKind| {
        history
            .iter()
            .filter(|attempt| attempt.kind == kind && attempt.passed)
            .count()
    };

    ProgressStats {
        total_attempts: history.len(),
        regular_attempts: regular.len(),
        regular_passed,
        regular_pass_rate,
        quizzes_passed: passed_quizzes(history).len(),
        unit_tests_passed: completed_tiers(history).len(),
        daily_challenges_passed: passed_of_kind(QuizKind::DailyChallenge),
        weekly_gauntlets_passed: passed_of_kind(QuizKind::WeeklyGauntlet),
        custom_quizzes_passed: passed_of_kind(QuizKind::Custom),
        total_points: total_points(history),
    }
}

pub fn total_points(history: &[AttemptResult]) -> u64 {
    history
        .iter()
        .map(|attempt| attempt.points_awarded as u64)
        .sum()
}

/// Whether a curriculum unit may be started: already passed, or not beyond the next unit.
/// Non-curriculum kinds are always available.
pub fn is_quiz_unlocked(
    history: &[AttemptResult],
    kind: QuizKind,
    tier: Tier,
    quiz_number: Option<u8>,
) -> bool {
    let candidate = match (kind, quiz_number) {
        (QuizKind::Regular, Some(number)) if (1..=QUIZZES_PER_TIER).contains(&number) => {
            NextUnit::regular(tier, number)
        }
        (QuizKind::Regular, _) => return false,
        (QuizKind::UnitTest, _) => NextUnit::unit_test(tier),
        _ => return true,
    };

    let already_passed = history.iter().any(|attempt| match kind {
        QuizKind::UnitTest => attempt.is_passed_unit_test(tier),
        _ => quiz_number.is_some_and(|number| attempt.is_passed_regular(tier, number)),
    });

    already_passed || candidate.rank() <= next_unit(history).rank()
}

/// Highest score recorded for a unit, passed or not.
pub fn best_score(
    history: &[AttemptResult],
    kind: QuizKind,
    tier: Option<Tier>,
    quiz_number: Option<u8>,
) -> Option<u8> {
    history
        .iter()
        .filter(|attempt| {
            attempt.kind == kind && attempt.tier == tier && attempt.quiz_number == quiz_number
        })
        .map(|attempt| attempt.score)
        .max()
}
