pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod stores;
pub mod utils;

pub use config::Config;
pub use error::{CatalogError, GenerationError, PersistenceError, SessionError};
pub use services::session_orchestrator::{CompletionReport, SessionOrchestrator, SubmitOutcome};
pub use services::EngineState;
