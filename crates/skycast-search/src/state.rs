//! Fetch lifecycle state machine.
//!
//! Exactly one value exists per orchestrator. Starting a new fetch
//! replaces the previous state immediately (optimistic transition to
//! `Loading`), not on completion.

use skycast_weather::CurrentConditions;

/// Lifecycle of the most recent fetch attempt.
#[derive(Debug, Clone, Default)]
pub enum FetchState {
    /// No fetch has occurred, or results were cleared.
    #[default]
    Idle,
    /// A fetch for `city` is outstanding.
    Loading { city: String },
    /// The last fetch completed successfully.
    Success {
        city: String,
        report: CurrentConditions,
    },
    /// The last fetch completed with a failure.
    Failed { city: String, message: String },
}

impl FetchState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    /// City of a completed fetch (success or failure), if any.
    ///
    /// This is the query `refresh` re-submits; an outstanding `Loading`
    /// fetch already owns the latest sequence number, so it is not
    /// refreshable.
    pub fn settled_city(&self) -> Option<&str> {
        match self {
            FetchState::Success { city, .. } | FetchState::Failed { city, .. } => Some(city),
            FetchState::Idle | FetchState::Loading { .. } => None,
        }
    }
}
