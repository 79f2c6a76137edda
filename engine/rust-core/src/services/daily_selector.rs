use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{AttemptResult, ContentItem, QuizKind, Tier, QUIZZES_PER_TIER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DailySelectionMode {
    /// Pick from one tier.
    Tier { tier: Tier },
    /// The curriculum's last regular quiz is passed; pick from everything.
    Ultimate,
}

/// Decides where today's item comes from, looking only at attempts finished before `boundary`.
pub fn selection_mode(history: &[AttemptResult], boundary: DateTime<Utc>) -> DailySelectionMode {
    let before_boundary = || {
        history
            .iter()
            .filter(move |attempt| attempt.completed_at < boundary)
    };

    let finished_curriculum = before_boundary()
        .any(|attempt| attempt.is_passed_regular(Tier::LAST, QUIZZES_PER_TIER));
    if finished_curriculum {
        return DailySelectionMode::Ultimate;
    }

    let tier = before_boundary()
        .filter(|attempt| attempt.passed && attempt.kind == QuizKind::Regular)
        .max_by_key(|attempt| attempt.completed_at)
        .and_then(|attempt| attempt.tier)
        .unwrap_or(Tier::FIRST);

    DailySelectionMode::Tier { tier }
}

/// Today's featured item. `None` only for an empty catalog.
pub fn select_todays_item<'c, R: Rng + ?Sized>(
    history: &[AttemptResult],
    catalog: &'c [ContentItem],
    boundary: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'c ContentItem> {
    let mode = selection_mode(history, boundary);

    let candidates: Vec<&ContentItem> = match mode {
        DailySelectionMode::Ultimate => catalog.iter().collect(),
        DailySelectionMode::Tier { tier } => {
            let in_tier: Vec<&ContentItem> =
                catalog.iter().filter(|item| item.tier == tier).collect();
            if in_tier.is_empty() {
                tracing::warn!("No catalog items in tier {}, selecting from whole catalog", tier);
                catalog.iter().collect()
            } else {
                in_tier
            }
        }
    };

    let selected = candidates.choose(rng).copied();
    if let Some(item) = selected {
        tracing::info!("Selected daily item {} ({:?})", item.id, mode);
    }
    selected
}
