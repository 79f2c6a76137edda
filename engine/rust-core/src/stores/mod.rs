pub mod catalog;
pub mod history;

pub use catalog::CatalogRepository;
pub use history::{HistoryStore, InMemoryHistoryStore, JsonlHistoryStore};
