use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::PersistenceError;
use crate::metrics::DAILY_RESET_TICKS_TOTAL;
use crate::models::{AttemptResult, ContentItem};
use crate::stores::{CatalogRepository, HistoryStore};
use crate::utils::clock::Clock;
use crate::utils::time::most_recent_boundary;

use super::daily_selector::select_todays_item;

/// Tracks the last daily selection and decides when the next one is due.
///
/// A selection is due when the last one happened before the most recent reset instant.
/// Comparing instants rather than dates means a late or repeated check fires exactly once.
#[derive(Debug, Clone)]
pub struct DailyResetScheduler<Tz: TimeZone = Local> {
    reset_time: NaiveTime,
    tz: Tz,
    last_selection_at: Option<DateTime<Utc>>,
    current: Option<ContentItem>,
}

impl DailyResetScheduler<Local> {
    pub fn new(reset_time: NaiveTime) -> Self {
        Self::with_timezone(reset_time, Local)
    }
}

impl<Tz: TimeZone> DailyResetScheduler<Tz> {
    pub fn with_timezone(reset_time: NaiveTime, tz: Tz) -> Self {
        Self {
            reset_time,
            tz,
            last_selection_at: None,
            current: None,
        }
    }

    /// Restores state persisted by the host from a previous run.
    pub fn restore(&mut self, selected_at: DateTime<Utc>, item: ContentItem) {
        self.last_selection_at = Some(selected_at);
        self.current = Some(item);
    }

    pub fn current_item(&self) -> Option<&ContentItem> {
        self.current.as_ref()
    }

    pub fn last_selection_at(&self) -> Option<DateTime<Utc>> {
        self.last_selection_at
    }

    pub fn boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        most_recent_boundary(now, self.reset_time, &self.tz)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_selection_at {
            None => true,
            Some(last) => last < self.boundary(now),
        }
    }

    /// Selects a new item if a boundary was crossed since the last selection.
    pub fn check<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        history: &[AttemptResult],
        catalog: &[ContentItem],
        rng: &mut R,
    ) -> Option<&ContentItem> {
        if !self.is_due(now) {
            return None;
        }

        let boundary = self.boundary(now);
        let selected = select_todays_item(history, catalog, boundary, rng)?.clone();
        self.last_selection_at = Some(now);
        self.current = Some(selected);
        self.current.as_ref()
    }
}

/// Polls the scheduler on a fixed interval and publishes each new daily item.
pub struct DailyResetWorker {
    scheduler: DailyResetScheduler<Local>,
    catalog: Arc<CatalogRepository>,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    rng: StdRng,
    publisher: watch::Sender<Option<ContentItem>>,
}

impl DailyResetWorker {
    pub fn new(
        config: &Config,
        catalog: Arc<CatalogRepository>,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            scheduler: DailyResetScheduler::new(config.reset_time()),
            catalog,
            history,
            clock,
            interval: Duration::from_millis(config.daily.reset_check_interval_ms),
            rng: StdRng::from_os_rng(),
            publisher,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ContentItem>> {
        self.publisher.subscribe()
    }

    pub fn scheduler(&self) -> &DailyResetScheduler<Local> {
        &self.scheduler
    }

    pub async fn run(&mut self) {
        info!(
            "Starting daily reset worker loop (interval {}ms)",
            self.interval.as_millis()
        );

        loop {
            match self.run_once().await {
                Ok(_) => {
                    DAILY_RESET_TICKS_TOTAL.with_label_values(&["success"]).inc();
                }
                Err(err) => {
                    DAILY_RESET_TICKS_TOTAL.with_label_values(&["error"]).inc();
                    warn!(error = %err, "Daily reset tick failed");
                }
            }

            sleep(self.interval).await;
        }
    }

    /// One check. Returns the newly selected item when a boundary was crossed.
    pub async fn run_once(&mut self) -> Result<Option<ContentItem>, PersistenceError> {
        let now = self.clock.now();
        if !self.scheduler.is_due(now) {
            return Ok(None);
        }

        let attempts = self.history.all_attempts().await?;
        let selected = self
            .scheduler
            .check(now, &attempts, self.catalog.items(), &mut self.rng)
            .cloned();

        if let Some(item) = &selected {
            DAILY_RESET_TICKS_TOTAL.with_label_values(&["selected"]).inc();
            info!("Daily item reset: {} (tier {})", item.id, item.tier);
            self.publisher.send_replace(Some(item.clone()));
        }

        Ok(selected)
    }
}
