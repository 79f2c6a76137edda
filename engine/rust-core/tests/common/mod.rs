#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use paradox_engine::{
    config::Config,
    models::{AchievementRecord, AttemptResult, ContentItem, QuizKind, Tier},
    stores::{CatalogRepository, HistoryStore, InMemoryHistoryStore},
    PersistenceError,
};

pub const ITEMS_PER_TIER: usize = 20;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn test_config() -> Config {
    Config::default()
}

pub fn item(tier: u8, index: usize) -> ContentItem {
    let id = format!("t{}-p{:02}", tier, index);
    ContentItem {
        tier: Tier::new(tier).expect("valid tier"),
        title: format!("Paradox {}", id),
        description: format!("Description of paradox {}", id),
        examples: (1..=3)
            .map(|n| format!("Example {} of paradox {}", n, id))
            .collect(),
        is_favorite: false,
        is_learned: false,
        id,
    }
}

/// Ten tiers of `ITEMS_PER_TIER` fully populated items.
pub fn catalog_items() -> Vec<ContentItem> {
    Tier::all()
        .flat_map(|tier| (1..=ITEMS_PER_TIER).map(move |index| item(tier.get(), index)))
        .collect()
}

pub fn catalog() -> Arc<CatalogRepository> {
    Arc::new(CatalogRepository::new(catalog_items()).expect("fixture catalog is valid"))
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn attempt(
    kind: QuizKind,
    tier: Option<u8>,
    quiz_number: Option<u8>,
    score: u8,
    completed_at: DateTime<Utc>,
) -> AttemptResult {
    let passed = score >= 70;
    let correct_count = u32::from(score) / 10;
    AttemptResult {
        id: Uuid::new_v4(),
        kind,
        tier: tier.and_then(Tier::new),
        quiz_number,
        item_ids: Vec::new(),
        score,
        total_questions: 10,
        correct_count,
        passed,
        time_taken_seconds: 45,
        completed_at,
        points_awarded: if passed { correct_count * 10 } else { 0 },
    }
}

pub fn passed_regular(tier: u8, quiz_number: u8, completed_at: DateTime<Utc>) -> AttemptResult {
    attempt(QuizKind::Regular, Some(tier), Some(quiz_number), 90, completed_at)
}

pub fn passed_unit_test(tier: u8, completed_at: DateTime<Utc>) -> AttemptResult {
    attempt(QuizKind::UnitTest, Some(tier), None, 90, completed_at)
}

/// Wraps an in-memory store and fails the first `failures` completion writes.
pub struct FlakyHistoryStore {
    inner: InMemoryHistoryStore,
    failures: AtomicUsize,
    pub completion_calls: AtomicUsize,
}

impl FlakyHistoryStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: InMemoryHistoryStore::new(),
            failures: AtomicUsize::new(failures),
            completion_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HistoryStore for FlakyHistoryStore {
    async fn append_attempt(&self, attempt: &AttemptResult) -> Result<(), PersistenceError> {
        self.inner.append_attempt(attempt).await
    }

    async fn append_achievements(
        &self,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        self.inner.append_achievements(records).await
    }

    async fn append_completion(
        &self,
        attempt: &AttemptResult,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistenceError::Io(std::io::Error::other("disk unavailable")));
        }
        self.inner.append_completion(attempt, records).await
    }

    async fn all_attempts(&self) -> Result<Vec<AttemptResult>, PersistenceError> {
        self.inner.all_attempts().await
    }

    async fn all_achievements(&self) -> Result<Vec<AchievementRecord>, PersistenceError> {
        self.inner.all_achievements().await
    }
}
