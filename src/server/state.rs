//! Application state

use crate::data::SplitDataset;
use crate::server::ServerConfig;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// State shared across handlers.
///
/// The split is computed once at startup and never mutated; experiment runs
/// borrow it per request.
pub struct AppState {
    pub config: ServerConfig,
    pub split: SplitDataset,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, split: SplitDataset) -> Self {
        Self {
            config,
            split,
            started_at: Utc::now(),
        }
    }

    /// Short run identifier for log correlation
    pub fn generate_run_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }
}
