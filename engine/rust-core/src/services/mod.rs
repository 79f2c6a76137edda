use anyhow::Context;
use std::sync::Arc;

use crate::config::Config;
use crate::stores::{CatalogRepository, HistoryStore, JsonlHistoryStore};
use crate::utils::clock::{Clock, SystemClock};

pub struct EngineState {
    pub config: Config,
    pub catalog: Arc<CatalogRepository>,
    pub history: Arc<dyn HistoryStore>,
    pub clock: Arc<dyn Clock>,
}

impl EngineState {
    /// Loads the catalog and opens the history log named in `config.storage`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Loading catalog from {}", config.storage.catalog_path);
        let catalog = CatalogRepository::from_json_file(&config.storage.catalog_path)
            .with_context(|| format!("Failed to load catalog {}", config.storage.catalog_path))?;
        tracing::info!(
            "Catalog loaded: {} items across {} tiers",
            catalog.len(),
            catalog.tiers().len()
        );

        let history = JsonlHistoryStore::open(&config.storage.history_path)
            .await
            .with_context(|| format!("Failed to open history {}", config.storage.history_path))?;
        tracing::info!("History log opened at {}", config.storage.history_path);

        Ok(Self::from_parts(
            config,
            Arc::new(catalog),
            Arc::new(history),
            Arc::new(SystemClock),
        ))
    }

    pub fn from_parts(
        config: Config,
        catalog: Arc<CatalogRepository>,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            catalog,
            history,
            clock,
        }
    }

    pub fn orchestrator(&self) -> session_orchestrator::SessionOrchestrator {
        session_orchestrator::SessionOrchestrator::new(
            &self.config,
            Arc::clone(&self.catalog),
            Arc::clone(&self.history),
            Arc::clone(&self.clock),
        )
    }

    pub fn daily_reset_worker(&self) -> daily_reset::DailyResetWorker {
        daily_reset::DailyResetWorker::new(
            &self.config,
            Arc::clone(&self.catalog),
            Arc::clone(&self.history),
            Arc::clone(&self.clock),
        )
    }
}

pub mod achievement_service;
pub mod daily_reset;
pub mod daily_selector;
pub mod grader;
pub mod progression;
pub mod question_generator;
pub mod quiz_generator;
pub mod session_orchestrator;
