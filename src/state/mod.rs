use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    bracket::BracketEngine, config::AppConfig, dao::tournament_store::TournamentStore,
    error::ServiceError,
};

/// Reference-counted handle passed to every handler.
pub type SharedState = Arc<AppState>;
/// Upper bound for one storage call or locked tournament operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state storing the bracket engine and database handles.
pub struct AppState {
    tournament_store: RwLock<Option<Arc<dyn TournamentStore>>>,
    degraded: watch::Sender<bool>,
    tournament_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    engine: BracketEngine,
    config: AppConfig,
    operation_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            tournament_store: RwLock::new(None),
            degraded: degraded_tx,
            tournament_gates: DashMap::new(),
            engine: BracketEngine::with_drop_order(config.loser_drop_order()),
            config,
            operation_timeout: Some(DEFAULT_OPERATION_TIMEOUT),
        })
    }

    /// Obtain a handle to the current tournament store, if one is installed.
    pub async fn tournament_store(&self) -> Option<Arc<dyn TournamentStore>> {
        let guard = self.tournament_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current tournament store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_tournament_store(&self) -> Result<Arc<dyn TournamentStore>, ServiceError> {
        self.tournament_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new tournament store implementation and leave degraded mode.
    pub async fn set_tournament_store(&self, store: Arc<dyn TournamentStore>) {
        {
            let mut guard = self.tournament_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Engine shared by every request.
    pub fn engine(&self) -> &BracketEngine {
        &self.engine
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run `work` while holding the lock of tournament `id`, bounded by the operation timeout.
    ///
    /// The gate is dropped again once no other caller waits on it, so ids that never existed
    /// leave nothing behind.
    pub async fn with_tournament_lock<F, Fut, T>(&self, id: Uuid, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self
            .tournament_gates
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = gate.lock().await;
            match self.operation_timeout {
                Some(limit) => match timeout(limit, work()).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(tournament_id = %id, "tournament operation timed out");
                        Err(ServiceError::Timeout)
                    }
                },
                None => work().await,
            }
        };

        drop(gate);
        // Waiters hold their own clone, so a count of one means the map is the last owner.
        self.tournament_gates
            .remove_if(&id, |_, gate| Arc::strong_count(gate) == 1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::tournament_store::memory::MemoryTournamentStore,
        dto::tournament::UpdateMatchRequest, services::tournament_service,
    };

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_tournament_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .set_tournament_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(state.require_tournament_store().await.is_ok());
    }

    #[tokio::test]
    async fn lock_serializes_work_on_one_tournament() {
        let state = AppState::new(AppConfig::default());
        let id = Uuid::new_v4();
        let counter = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let state = state.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                state
                    .with_tournament_lock(id, || async {
                        counter.lock().await.push("start-1");
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        counter.lock().await.push("end-1");
                        Ok(())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        state
            .with_tournament_lock(id, || async {
                counter.lock().await.push("start-2");
                Ok(())
            })
            .await
            .unwrap();
        first.await.unwrap().unwrap();

        assert_eq!(*counter.lock().await, vec!["start-1", "end-1", "start-2"]);
        assert!(state.tournament_gates.is_empty());
    }

    #[tokio::test]
    async fn unknown_tournaments_leave_no_gate_behind() {
        let state = AppState::new(AppConfig::default());
        state
            .set_tournament_store(Arc::new(MemoryTournamentStore::new()))
            .await;
        let owner = Uuid::new_v4();

        for _ in 0..50 {
            let missing = Uuid::new_v4();
            let report = tournament_service::update_match(
                &state,
                owner,
                missing,
                Uuid::new_v4(),
                UpdateMatchRequest {
                    score_a: 1,
                    score_b: 0,
                    winner: None,
                },
            )
            .await;
            assert!(matches!(report, Err(ServiceError::NotFound(_))));

            let deletion = tournament_service::delete_tournament(&state, owner, missing).await;
            assert!(matches!(deletion, Err(ServiceError::NotFound(_))));
        }

        assert_eq!(state.tournament_gates.len(), 0);
    }
}
