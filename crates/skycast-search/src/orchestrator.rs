//! Search orchestrator: single authority over the current fetch and the
//! recent-search history.
//!
//! All five user operations (submit, replay, clear result, clear history,
//! refresh) funnel through here; no other component mutates fetch state
//! or history. Fetch completions are correlated by sequence number and
//! stale ones are dropped, so a slow earlier request never clobbers a
//! faster later one.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use skycast_weather::{CityLookup, FetchError, FetchGateway};

use crate::history::SearchHistory;
use crate::state::FetchState;
use crate::store::HistoryStore;

/// Errors returned synchronously from submit/replay.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Query must not be empty")]
    EmptyQuery,
}

struct Inner {
    state: FetchState,
    history: SearchHistory,
    /// Sequence number of the most recently issued fetch. Completions
    /// whose ticket no longer matches are stale and must be discarded.
    seq: u64,
}

pub struct SearchOrchestrator<C> {
    gateway: FetchGateway<C>,
    store: Arc<dyn HistoryStore>,
    inner: Mutex<Inner>,
}

impl<C: CityLookup> SearchOrchestrator<C> {
    /// Create an orchestrator, seeding history from the store.
    ///
    /// The store is read exactly once; afterwards the in-memory history
    /// is authoritative and the store is a write-behind backstop.
    pub async fn new(gateway: FetchGateway<C>, store: Arc<dyn HistoryStore>) -> Self {
        let history = match store.load().await {
            Some(stored) => SearchHistory::from_entries(stored),
            None => SearchHistory::default(),
        };

        if !history.is_empty() {
            tracing::debug!("Seeded {} recent searches from store", history.len());
        }

        Self {
            gateway,
            store,
            inner: Mutex::new(Inner {
                state: FetchState::Idle,
                history,
                seq: 0,
            }),
        }
    }

    /// Submit a city query.
    ///
    /// Empty or whitespace-only input fails with `EmptyQuery` and changes
    /// nothing. Otherwise the state moves to `Loading` before the network
    /// call suspends, and the completion is applied only if no newer fetch
    /// was issued in the meantime.
    ///
    /// # Errors
    /// Returns `SearchError::EmptyQuery` for blank input.
    pub async fn submit(&self, query: &str) -> Result<(), SearchError> {
        let city = query.trim();
        if city.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let city = city.to_string();

        let ticket = {
            let mut inner = self.inner.lock();
            inner.seq += 1;
            inner.state = FetchState::Loading { city: city.clone() };
            inner.seq
        };

        let outcome = self.gateway.fetch(&city).await;

        let mut inner = self.inner.lock();
        if ticket != inner.seq {
            tracing::debug!(city = %city, "Discarding stale fetch completion");
            return Ok(());
        }

        match outcome {
            Ok(report) => {
                inner.state = FetchState::Success {
                    city: city.clone(),
                    report,
                };
                inner.history.promote(&city);
                let snapshot = inner.history.entries().to_vec();
                drop(inner);
                self.persist(snapshot);
            }
            Err(err @ FetchError::LookupFailed { .. }) => {
                inner.state = FetchState::Failed {
                    city,
                    message: err.to_string(),
                };
            }
        }

        Ok(())
    }

    /// Replay a history entry.
    ///
    /// Same fetch behavior and state transitions as `submit`, including
    /// re-promotion on success: the history orders by "most recently
    /// successfully viewed", and a failing replay does not reorder it.
    ///
    /// # Errors
    /// Returns `SearchError::EmptyQuery` for blank input.
    pub async fn replay(&self, entry: &str) -> Result<(), SearchError> {
        self.submit(entry).await
    }

    /// Drop the current result; history is unaffected.
    pub fn clear_result(&self) {
        self.inner.lock().state = FetchState::Idle;
    }

    /// Empty the history and remove the persisted copy. Idempotent.
    ///
    /// A store failure is logged and swallowed; the in-memory history is
    /// cleared regardless.
    pub async fn clear_history(&self) {
        self.inner.lock().history.clear();
        if let Err(e) = self.store.clear().await {
            tracing::warn!("Failed to clear persisted history: {}", e);
        }
    }

    /// Re-fetch the current (settled) query.
    ///
    /// A no-op when there is nothing to refresh (`Idle`, or a fetch still
    /// outstanding).
    pub async fn refresh(&self) {
        let city = {
            let inner = self.inner.lock();
            inner.state.settled_city().map(str::to_string)
        };

        if let Some(city) = city {
            // A settled city is never blank, so submit cannot reject it.
            let _ = self.submit(&city).await;
        }
    }

    /// Snapshot of the current fetch state.
    pub fn state(&self) -> FetchState {
        self.inner.lock().state.clone()
    }

    /// Snapshot of the history, most recent first.
    pub fn history(&self) -> Vec<String> {
        self.inner.lock().history.entries().to_vec()
    }

    /// Write the history snapshot in the background. Failures are logged,
    /// never surfaced: history loss must not block the search flow.
    fn persist(&self, entries: Vec<String>) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save(&entries).await {
                tracing::warn!("Failed to persist search history: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::store::JsonFileHistoryStore;
    use skycast_weather::{ClientError, CurrentConditions};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn sample_report(city: &str) -> CurrentConditions {
        serde_json::from_value(serde_json::json!({
            "name": city,
            "main": {
                "temp": 15.0, "feels_like": 14.2, "temp_min": 12.0, "temp_max": 17.0,
                "pressure": 1013, "humidity": 55
            },
            "weather": [
                {"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}
            ],
            "wind": {"speed": 2.5, "deg": 90},
            "sys": {"country": "FR", "sunrise": 0, "sunset": 0},
            "clouds": {"all": 5},
            "dt": 0,
            "timezone": 0
        }))
        .unwrap()
    }

    /// Lookup double: succeeds unless the city is in the failing set.
    #[derive(Default)]
    struct FakeLookup {
        failing: Mutex<HashSet<String>>,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn fail_city(&self, city: &str) {
            self.failing.lock().insert(city.to_lowercase());
        }

        fn succeed_city(&self, city: &str) {
            self.failing.lock().remove(&city.to_lowercase());
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CityLookup for FakeLookup {
        async fn lookup(&self, city: &str) -> Result<CurrentConditions, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().contains(&city.to_lowercase()) {
                Err(ClientError::CityNotFound(city.to_string()))
            } else {
                Ok(sample_report(city))
            }
        }
    }

    /// Lookup double that parks one city's fetch on a gate until released.
    struct GatedLookup {
        slow_city: String,
        gate: Arc<Notify>,
        parked: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl CityLookup for GatedLookup {
        async fn lookup(&self, city: &str) -> Result<CurrentConditions, ClientError> {
            if city.eq_ignore_ascii_case(&self.slow_city) {
                self.parked.store(true, Ordering::SeqCst);
                self.gate.notified().await;
            }
            Ok(sample_report(city))
        }
    }

    /// In-memory store double.
    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<Option<Vec<String>>>,
        fail_saves: bool,
        cleared: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl HistoryStore for MemoryStore {
        async fn load(&self) -> Option<Vec<String>> {
            self.data.lock().clone()
        }

        async fn save(&self, entries: &[String]) -> Result<(), skycast_core::StorageError> {
            if self.fail_saves {
                return Err(skycast_core::StorageError::WriteFailed {
                    path: "memory".into(),
                    message: "simulated failure".into(),
                });
            }
            *self.data.lock() = Some(entries.to_vec());
            Ok(())
        }

        async fn clear(&self) -> Result<(), skycast_core::StorageError> {
            self.cleared.fetch_add(1, Ordering::SeqCst);
            *self.data.lock() = None;
            Ok(())
        }
    }

    async fn orchestrator_with(
        lookup: Arc<FakeLookup>,
        store: Arc<dyn HistoryStore>,
    ) -> SearchOrchestrator<Arc<FakeLookup>> {
        SearchOrchestrator::new(FetchGateway::new(lookup), store).await
    }

    /// Let detached persistence tasks run.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_submit_success_sets_state_and_history() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        orch.submit("Paris").await.unwrap();

        match orch.state() {
            FetchState::Success { city, report } => {
                assert_eq!(city, "Paris");
                assert_eq!(report.name, "Paris");
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(orch.history(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_submit_trims_query() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        orch.submit("  Paris  ").await.unwrap();

        assert_eq!(orch.history(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected_without_state_change() {
        let lookup = Arc::new(FakeLookup::default());
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        assert_eq!(orch.submit("").await, Err(SearchError::EmptyQuery));
        assert_eq!(orch.submit("   ").await, Err(SearchError::EmptyQuery));
        assert!(orch.state().is_idle());
        assert_eq!(lookup.call_count(), 0);

        // Also unchanged when a result is already showing
        orch.submit("Paris").await.unwrap();
        assert_eq!(orch.submit(" ").await, Err(SearchError::EmptyQuery));
        assert!(matches!(orch.state(), FetchState::Success { .. }));
    }

    #[tokio::test]
    async fn test_failed_lookup_sets_failed_and_leaves_history() {
        let lookup = Arc::new(FakeLookup::default());
        lookup.fail_city("Atlantis");
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        orch.submit("Paris").await.unwrap();
        orch.submit("Atlantis").await.unwrap();

        match orch.state() {
            FetchState::Failed { city, message } => {
                assert_eq!(city, "Atlantis");
                assert!(message.contains("Atlantis"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(orch.history(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_case_of_latest_submission_wins() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        orch.submit("Paris").await.unwrap();
        orch.submit("paris").await.unwrap();

        assert_eq!(orch.history(), ["paris"]);
    }

    #[tokio::test]
    async fn test_history_bound_eviction() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        for city in ["A", "B", "C", "D", "E", "F"] {
            orch.submit(city).await.unwrap();
        }

        assert_eq!(orch.history(), ["F", "E", "D", "C", "B"]);
    }

    #[tokio::test]
    async fn test_replay_success_repromotes() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        orch.submit("Paris").await.unwrap();
        orch.submit("London").await.unwrap();
        orch.replay("Paris").await.unwrap();

        assert_eq!(orch.history(), ["Paris", "London"]);
    }

    #[tokio::test]
    async fn test_replay_failure_does_not_promote() {
        let lookup = Arc::new(FakeLookup::default());
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        orch.submit("Paris").await.unwrap();
        orch.submit("London").await.unwrap();
        assert_eq!(orch.history(), ["London", "Paris"]);

        lookup.fail_city("Paris");
        orch.replay("Paris").await.unwrap();

        assert!(matches!(orch.state(), FetchState::Failed { .. }));
        assert_eq!(orch.history(), ["London", "Paris"]);
    }

    #[tokio::test]
    async fn test_clear_result_keeps_history() {
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), Arc::new(MemoryStore::default()))
                .await;

        orch.submit("Paris").await.unwrap();
        orch.clear_result();

        assert!(orch.state().is_idle());
        assert_eq!(orch.history(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_clear_history_is_idempotent_and_clears_store() {
        let store = Arc::new(MemoryStore::default());
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), store.clone()).await;

        orch.submit("Paris").await.unwrap();
        orch.clear_history().await;
        orch.clear_history().await;

        assert!(orch.history().is_empty());
        assert_eq!(store.load().await, None);
        assert_eq!(store.cleared.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_idle_is_a_silent_noop() {
        let lookup = Arc::new(FakeLookup::default());
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        orch.refresh().await;

        assert!(orch.state().is_idle());
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_retries_failed_city() {
        let lookup = Arc::new(FakeLookup::default());
        lookup.fail_city("Paris");
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        orch.submit("Paris").await.unwrap();
        assert!(matches!(orch.state(), FetchState::Failed { .. }));
        assert!(orch.history().is_empty());

        lookup.succeed_city("Paris");
        orch.refresh().await;

        assert!(matches!(orch.state(), FetchState::Success { city, .. } if city == "Paris"));
        assert_eq!(orch.history(), ["Paris"]);
    }

    #[tokio::test]
    async fn test_refresh_refetches_current_success() {
        let lookup = Arc::new(FakeLookup::default());
        let orch =
            orchestrator_with(Arc::clone(&lookup), Arc::new(MemoryStore::default())).await;

        orch.submit("Paris").await.unwrap();
        orch.refresh().await;

        assert_eq!(lookup.call_count(), 2);
        assert!(matches!(orch.state(), FetchState::Success { city, .. } if city == "Paris"));
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let gate = Arc::new(Notify::new());
        let parked = Arc::new(AtomicBool::new(false));
        let lookup = GatedLookup {
            slow_city: "Slowville".into(),
            gate: Arc::clone(&gate),
            parked: Arc::clone(&parked),
        };
        let orch = Arc::new(
            SearchOrchestrator::new(FetchGateway::new(lookup), Arc::new(MemoryStore::default()))
                .await,
        );

        let slow = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit("Slowville").await })
        };
        while !parked.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        // The slow fetch is outstanding and visible as Loading
        assert!(matches!(orch.state(), FetchState::Loading { city } if city == "Slowville"));

        // A newer fetch completes first
        orch.submit("Fastburg").await.unwrap();
        assert!(matches!(orch.state(), FetchState::Success { city, .. } if city == "Fastburg"));

        // Now the superseded fetch resolves; its completion must be dropped
        gate.notify_one();
        slow.await.unwrap().unwrap();

        assert!(matches!(orch.state(), FetchState::Success { city, .. } if city == "Fastburg"));
        assert_eq!(orch.history(), ["Fastburg"]);
    }

    #[tokio::test]
    async fn test_history_persists_in_background() {
        let store = Arc::new(MemoryStore::default());
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), store.clone()).await;

        orch.submit("Paris").await.unwrap();
        settle().await;

        assert_eq!(store.load().await, Some(vec!["Paris".to_string()]));
    }

    #[tokio::test]
    async fn test_persistence_failure_never_surfaces() {
        let store = Arc::new(MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        });
        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), store.clone()).await;

        orch.submit("Paris").await.unwrap();
        settle().await;

        // In-memory state is correct even though every save failed
        assert!(matches!(orch.state(), FetchState::Success { .. }));
        assert_eq!(orch.history(), ["Paris"]);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_seeds_history_from_store() {
        let store = Arc::new(MemoryStore::default());
        store
            .save(&["Paris".to_string(), "London".to_string()])
            .await
            .unwrap();

        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), store.clone()).await;

        assert_eq!(orch.history(), ["Paris", "London"]);
        assert!(orch.state().is_idle());
    }

    #[tokio::test]
    async fn test_seeding_reapplies_invariants() {
        let store = Arc::new(MemoryStore::default());
        store
            .save(&[
                "Paris".to_string(),
                "paris".to_string(),
                "London".to_string(),
                "Tokyo".to_string(),
                "Sydney".to_string(),
                "Madrid".to_string(),
                "Rome".to_string(),
            ])
            .await
            .unwrap();

        let orch =
            orchestrator_with(Arc::new(FakeLookup::default()), store.clone()).await;

        assert_eq!(orch.history(), ["Paris", "London", "Tokyo", "Sydney", "Madrid"]);
    }

    #[tokio::test]
    async fn test_clear_history_round_trip_through_file_store() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = Arc::new(JsonFileHistoryStore::new(dir.path()));
            let orch =
                orchestrator_with(Arc::new(FakeLookup::default()), store).await;
            orch.submit("Paris").await.unwrap();
            settle().await;
            orch.clear_history().await;
        }

        // "Process restart": a fresh orchestrator over the same directory
        let store = Arc::new(JsonFileHistoryStore::new(dir.path()));
        let orch = orchestrator_with(Arc::new(FakeLookup::default()), store).await;
        assert!(orch.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_survives_restart_through_file_store() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = Arc::new(JsonFileHistoryStore::new(dir.path()));
            let orch =
                orchestrator_with(Arc::new(FakeLookup::default()), store).await;
            orch.submit("Paris").await.unwrap();
            orch.submit("London").await.unwrap();
            settle().await;
        }

        let store = Arc::new(JsonFileHistoryStore::new(dir.path()));
        let orch = orchestrator_with(Arc::new(FakeLookup::default()), store).await;
        assert_eq!(orch.history(), ["London", "Paris"]);
    }
}
