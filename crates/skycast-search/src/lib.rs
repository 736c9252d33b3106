//! Search history and fetch orchestration for Skycast
//!
//! Owns the bounded, deduplicated history of past city searches and the
//! lifecycle of the single active weather fetch.

pub mod history;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use history::{SearchHistory, DEFAULT_CITIES, MAX_HISTORY};
pub use orchestrator::{SearchError, SearchOrchestrator};
pub use state::FetchState;
pub use store::{HistoryStore, JsonFileHistoryStore};
