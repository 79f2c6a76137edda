use std::collections::BTreeSet;

use crate::models::{
    AchievementRecord, AttemptResult, BadgeAward, BadgeCriteria, BadgeDefinition, BadgeTrigger,
    MedalAward, MedalLevel, NewAchievements, QuizKind, Tier, TrophyAward, TrophyLevel,
};

/// Stats badge criteria are checked against. Rebuilt from the full log on every evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedStats {
    pub custom_quizzes_completed: u32,
    pub gauntlets_completed: u32,
    pub daily_challenges_completed: u32,
    pub completed_tiers: BTreeSet<Tier>,
    pub new_points_total: u64,
}

impl DerivedStats {
    /// Folds `history` plus `current`. A history entry sharing the current attempt's id is
    /// the same attempt already persisted and is counted once.
    pub fn compute(current: &AttemptResult, history: &[AttemptResult]) -> Self {
        let mut stats = Self::default();

        let attempts = history
            .iter()
            .filter(|attempt| attempt.id != current.id)
            .chain(std::iter::once(current));

        for attempt in attempts {
            match attempt.kind {
                QuizKind::Custom => stats.custom_quizzes_completed += 1,
                QuizKind::WeeklyGauntlet => stats.gauntlets_completed += 1,
                QuizKind::DailyChallenge => stats.daily_challenges_completed += 1,
                QuizKind::Regular | QuizKind::UnitTest => {}
            }

            if attempt.kind == QuizKind::UnitTest && attempt.passed {
                if let Some(tier) = attempt.tier {
                    stats.completed_tiers.insert(tier);
                }
            }

            stats.new_points_total += u64::from(attempt.points_awarded);
        }

        stats
    }

    pub fn completed(&self, kind: QuizKind) -> u32 {
        match kind {
            QuizKind::Custom => self.custom_quizzes_completed,
            QuizKind::WeeklyGauntlet => self.gauntlets_completed,
            QuizKind::DailyChallenge => self.daily_challenges_completed,
            QuizKind::Regular | QuizKind::UnitTest => 0,
        }
    }
}

/// Computes achievements newly earned by `current`.
///
/// Pure: nothing is persisted, and evaluating the same attempt against records that already
/// hold its awards returns nothing.
pub fn evaluate(
    current: &AttemptResult,
    history: &[AttemptResult],
    existing: &[AchievementRecord],
    definitions: &[BadgeDefinition],
) -> NewAchievements {
    let mut earned = NewAchievements::default();

    if let Some(medal) = medal_for(current, existing) {
        earned.medals.push(medal);
    }
    if let Some(trophy) = trophy_for(current, existing) {
        earned.trophies.push(trophy);
    }

    let stats = DerivedStats::compute(current, history);
    for definition in definitions {
        let already_earned = existing.iter().any(|record| record.is_badge(&definition.id))
            || earned
                .badges
                .iter()
                .any(|badge| badge.badge_id == definition.id);
        if already_earned || !definition.is_triggered_by(current.kind) {
            continue;
        }

        if criteria_met(&definition.criteria, &stats) {
            tracing::debug!("Badge {} earned by attempt {}", definition.id, current.id);
            earned.badges.push(BadgeAward {
                badge_id: definition.id.clone(),
                attempt_id: current.id,
                earned_at: current.completed_at,
            });
        }
    }

    earned
}

fn medal_for(current: &AttemptResult, existing: &[AchievementRecord]) -> Option<MedalAward> {
    if current.kind != QuizKind::Regular || !current.passed {
        return None;
    }
    let tier = current.tier?;
    let quiz_number = current.quiz_number?;
    let level = MedalLevel::for_score(current.score)?;

    if existing
        .iter()
        .any(|record| record.is_medal(tier, quiz_number, level))
    {
        return None;
    }

    Some(MedalAward {
        tier,
        quiz_number,
        level,
        score: current.score,
        attempt_id: current.id,
        earned_at: current.completed_at,
    })
}

fn trophy_for(current: &AttemptResult, existing: &[AchievementRecord]) -> Option<TrophyAward> {
    if current.kind != QuizKind::UnitTest || !current.passed {
        return None;
    }
    let tier = current.tier?;
    let level = TrophyLevel::for_score(current.score)?;

    if existing.iter().any(|record| record.is_trophy(tier, level)) {
        return None;
    }

    Some(TrophyAward {
        tier,
        level,
        score: current.score,
        attempt_id: current.id,
        earned_at: current.completed_at,
    })
}

fn criteria_met(criteria: &BadgeCriteria, stats: &DerivedStats) -> bool {
    match criteria {
        BadgeCriteria::MinPoints { points } => stats.new_points_total >= *points,
        BadgeCriteria::MinCompleted { kind, count } => stats.completed(*kind) >= *count,
        BadgeCriteria::TierCompleted { tier } => stats.completed_tiers.contains(tier),
        // Streaks are not tracked yet.
        BadgeCriteria::MinStreak { .. } => false,
    }
}

fn badge(
    id: &str,
    name: &str,
    description: &str,
    triggers: Vec<BadgeTrigger>,
    criteria: BadgeCriteria,
) -> BadgeDefinition {
    BadgeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        triggers,
        criteria,
    }
}

/// Built-in badge set.
pub fn default_badge_definitions() -> Vec<BadgeDefinition> {
    let unit_test = || vec![BadgeTrigger::Quiz(QuizKind::UnitTest)];
    let tier = |n: u8| Tier::new(n).unwrap_or(Tier::LAST);

    vec![
        badge(
            "first_custom_quiz",
            "Curator",
            "Complete your first custom quiz",
            vec![BadgeTrigger::Quiz(QuizKind::Custom)],
            BadgeCriteria::MinCompleted {
                kind: QuizKind::Custom,
                count: 1,
            },
        ),
        badge(
            "custom_quiz_regular",
            "Self-Directed",
            "Complete 10 custom quizzes",
            vec![BadgeTrigger::Quiz(QuizKind::Custom)],
            BadgeCriteria::MinCompleted {
                kind: QuizKind::Custom,
                count: 10,
            },
        ),
        badge(
            "first_gauntlet",
            "Gauntlet Runner",
            "Complete a weekly gauntlet",
            vec![BadgeTrigger::Quiz(QuizKind::WeeklyGauntlet)],
            BadgeCriteria::MinCompleted {
                kind: QuizKind::WeeklyGauntlet,
                count: 1,
            },
        ),
        badge(
            "gauntlet_veteran",
            "Gauntlet Veteran",
            "Complete 5 weekly gauntlets",
            vec![BadgeTrigger::Quiz(QuizKind::WeeklyGauntlet)],
            BadgeCriteria::MinCompleted {
                kind: QuizKind::WeeklyGauntlet,
                count: 5,
            },
        ),
        badge(
            "daily_regular",
            "Daily Thinker",
            "Complete 7 daily challenges",
            vec![BadgeTrigger::Quiz(QuizKind::DailyChallenge)],
            BadgeCriteria::MinCompleted {
                kind: QuizKind::DailyChallenge,
                count: 7,
            },
        ),
        badge(
            "tier_1_complete",
            "First Steps",
            "Pass the tier 1 unit test",
            unit_test(),
            BadgeCriteria::TierCompleted { tier: tier(1) },
        ),
        badge(
            "tier_5_complete",
            "Halfway There",
            "Pass the tier 5 unit test",
            unit_test(),
            BadgeCriteria::TierCompleted { tier: tier(5) },
        ),
        badge(
            "tier_10_complete",
            "Paradox Master",
            "Pass the tier 10 unit test",
            unit_test(),
            BadgeCriteria::TierCompleted { tier: tier(10) },
        ),
        badge(
            "points_1000",
            "Point Collector",
            "Earn 1,000 points",
            vec![BadgeTrigger::Points],
            BadgeCriteria::MinPoints { points: 1_000 },
        ),
        badge(
            "points_10000",
            "Point Hoarder",
            "Earn 10,000 points",
            vec![BadgeTrigger::Points],
            BadgeCriteria::MinPoints { points: 10_000 },
        ),
        badge(
            "streak_7",
            "Week Streak",
            "Play seven days in a row",
            vec![BadgeTrigger::Streak],
            BadgeCriteria::MinStreak { days: 7 },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn attempt(
        kind: QuizKind,
        tier: Option<u8>,
        quiz_number: Option<u8>,
        score: u8,
    ) -> AttemptResult {
        let passed = score >= 70;
        AttemptResult {
            id: Uuid::new_v4(),
            kind,
            tier: tier.and_then(Tier::new),
            quiz_number,
            item_ids: Vec::new(),
            score,
            total_questions: 10,
            correct_count: u32::from(score / 10),
            passed,
            time_taken_seconds: 40,
            completed_at: Utc::now(),
            points_awarded: if passed { u32::from(score / 10) * 10 } else { 0 },
        }
    }

    fn regular(tier: u8, quiz_number: u8, score: u8) -> AttemptResult {
        attempt(QuizKind::Regular, Some(tier), Some(quiz_number), score)
    }

    fn unit_test(tier: u8, score: u8) -> AttemptResult {
        attempt(QuizKind::UnitTest, Some(tier), None, score)
    }

    #[test]
    fn medal_levels_follow_score() {
        let cases = [
            (95, Some(MedalLevel::Gold)),
            (85, Some(MedalLevel::Silver)),
            (72, Some(MedalLevel::Bronze)),
            (60, None),
        ];
        for (score, expected) in cases {
            let earned = evaluate(&regular(1, 1, score), &[], &[], &[]);
            assert_eq!(
                earned.medals.first().map(|medal| medal.level),
                expected,
                "score {}",
                score
            );
        }
    }

    #[test]
    fn failed_attempt_earns_no_medal_even_above_seventy() {
        let mut current = regular(1, 1, 75);
        current.passed = false;
        assert!(evaluate(&current, &[], &[], &[]).is_empty());
    }

    #[test]
    fn existing_medal_at_same_level_is_not_repeated() {
        let first = regular(2, 3, 92);
        let earned = evaluate(&first, &[], &[], &[]);
        let records = earned.to_records();

        let again = regular(2, 3, 97);
        assert!(evaluate(&again, &[first], &records, &[]).medals.is_empty());
    }

    #[test]
    fn higher_medal_level_is_a_new_record() {
        let bronze = regular(2, 3, 71);
        let records = evaluate(&bronze, &[], &[], &[]).to_records();

        let gold = regular(2, 3, 91);
        let earned = evaluate(&gold, &[bronze], &records, &[]);
        assert_eq!(earned.medals.len(), 1);
        assert_eq!(earned.medals[0].level, MedalLevel::Gold);
    }

    #[test]
    fn unit_test_at_88_earns_large_trophy_once() {
        let first = unit_test(4, 88);
        let earned = evaluate(&first, &[], &[], &[]);
        assert_eq!(earned.trophies.len(), 1);
        assert_eq!(earned.trophies[0].level, TrophyLevel::LargeTrophy);
        assert!(earned.medals.is_empty());

        let records = earned.to_records();
        let second = unit_test(4, 88);
        assert!(evaluate(&second, &[first], &records, &[]).trophies.is_empty());
    }

    #[test]
    fn tier_completion_badge_triggers_on_unit_test() {
        let definitions = default_badge_definitions();
        let earned = evaluate(&unit_test(1, 80), &[], &[], &definitions);
        let ids: Vec<&str> = earned.badges.iter().map(|badge| badge.badge_id.as_str()).collect();
        assert_eq!(ids, vec!["tier_1_complete"]);
    }

    #[test]
    fn completed_count_includes_failed_attempts() {
        let definitions = default_badge_definitions();
        let history: Vec<AttemptResult> = (0..9)
            .map(|_| attempt(QuizKind::Custom, None, None, 40))
            .collect();
        let records = vec![AchievementRecord::Badge(BadgeAward {
            badge_id: "first_custom_quiz".into(),
            attempt_id: history[0].id,
            earned_at: Utc::now(),
        })];

        let current = attempt(QuizKind::Custom, None, None, 50);
        let earned = evaluate(&current, &history, &records, &definitions);
        let ids: Vec<&str> = earned.badges.iter().map(|badge| badge.badge_id.as_str()).collect();
        assert_eq!(ids, vec!["custom_quiz_regular"]);
    }

    #[test]
    fn badge_not_triggered_by_other_kinds() {
        let definitions = default_badge_definitions();
        let history = vec![attempt(QuizKind::Custom, None, None, 80)];
        // A regular attempt doesn't re-check the custom quiz badges.
        let earned = evaluate(&regular(1, 1, 50), &history, &[], &definitions);
        assert!(earned.badges.is_empty());
    }

    #[test]
    fn points_badge_counts_current_attempt_once() {
        let definition = badge(
            "points_150",
            "Hundred and a half",
            "",
            vec![BadgeTrigger::Points],
            BadgeCriteria::MinPoints { points: 150 },
        );
        let current = regular(1, 1, 100);
        // The same attempt already appended to history must not count twice.
        let history = vec![current.clone()];
        assert!(evaluate(&current, &history, &[], &[definition.clone()]).badges.is_empty());

        let earlier = regular(1, 2, 100);
        let earned = evaluate(&current, &[earlier], &[], &[definition]);
        assert_eq!(earned.badges.len(), 1);
    }

    #[test]
    fn streak_criteria_never_met() {
        let definitions = default_badge_definitions();
        let history: Vec<AttemptResult> = (0..30).map(|_| regular(1, 1, 100)).collect();
        let earned = evaluate(&regular(1, 2, 100), &history, &[], &definitions);
        assert!(earned.badges.iter().all(|badge| badge.badge_id != "streak_7"));
    }

    #[test]
    fn derived_stats_count_by_kind() {
        let history = vec![
            attempt(QuizKind::WeeklyGauntlet, None, None, 30),
            attempt(QuizKind::DailyChallenge, None, None, 90),
            unit_test(3, 75),
            unit_test(4, 40),
        ];
        let stats = DerivedStats::compute(&attempt(QuizKind::Custom, None, None, 80), &history);
        assert_eq!(stats.custom_quizzes_completed, 1);
        assert_eq!(stats.gauntlets_completed, 1);
        assert_eq!(stats.daily_challenges_completed, 1);
        assert_eq!(stats.completed_tiers, BTreeSet::from([Tier::new(3).unwrap()]));
    }
}
