use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, tournament_store::TournamentStore},
    state::SharedState,
};

/// Delays and limits driving the supervisor loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorPolicy {
    /// Delay before the first retry of a failed connection.
    pub initial_delay: Duration,
    /// Upper bound of the exponential backoff.
    pub max_delay: Duration,
    /// Pause between two health checks of a working store.
    pub health_poll_interval: Duration,
    /// Reconnection attempts before the store is dropped and rebuilt.
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

impl SupervisorPolicy {
    fn next_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_delay)
    }
}

/// Connect to the storage backend and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TournamentStore>, StorageError>> + Send,
{
    run_with_policy(state, connect, SupervisorPolicy::default()).await
}

/// Same as [`run`] with explicit delays.
pub async fn run_with_policy<F, Fut>(state: SharedState, mut connect: F, policy: SupervisorPolicy)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TournamentStore>, StorageError>> + Send,
{
    let mut delay = policy.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_tournament_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = policy.initial_delay;

                watch_store(&state, store.as_ref(), &policy).await;
                warn!("exhausted storage reconnect attempts; staying in degraded mode");
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = policy.next_delay(delay);
    }
}

/// Poll a connected store until it fails and cannot be reconnected.
async fn watch_store(state: &SharedState, store: &dyn TournamentStore, policy: &SupervisorPolicy) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store, policy).await {
                    return;
                }
                state.update_degraded(false).await;
            }
        }
        sleep(policy.health_poll_interval).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn TournamentStore, policy: &SupervisorPolicy) -> bool {
    let mut delay = policy.initial_delay;

    for attempt in 0..policy.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = policy.next_delay(delay);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::{self, BoxFuture};
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::TournamentEntity, storage::StorageResult},
        state::AppState,
    };

    /// Store whose health check fails a fixed number of times and never reconnects.
    struct FlakyStore {
        failures_left: AtomicU32,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    fn refused() -> StorageError {
        StorageError::unavailable("connection refused".into(), Refused)
    }

    impl TournamentStore for FlakyStore {
        fn save_tournament(&self, _: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(future::ready(Ok(())))
        }

        fn find_tournament(
            &self,
            _: Uuid,
            _: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
            Box::pin(future::ready(Ok(None)))
        }

        fn list_tournaments(
            &self,
            _: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
            Box::pin(future::ready(Ok(Vec::new())))
        }

        fn delete_tournament(&self, _: Uuid, _: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            Box::pin(future::ready(Ok(false)))
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            Box::pin(future::ready(if failing { Err(refused()) } else { Ok(()) }))
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(future::ready(Err(refused())))
        }
    }

    fn fast_policy() -> SupervisorPolicy {
        SupervisorPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            health_poll_interval: Duration::from_millis(1),
            max_reconnect_attempts: 2,
        }
    }

    #[tokio::test]
    async fn failed_reconnects_enter_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        state
            .set_tournament_store(Arc::new(FlakyStore {
                failures_left: AtomicU32::new(0),
            }))
            .await;
        assert!(!state.is_degraded().await);

        let store = FlakyStore {
            failures_left: AtomicU32::new(1),
        };
        assert!(!reconnect(&state, &store, &fast_policy()).await);
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn connection_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let supervisor = tokio::spawn(run_with_policy(
            state.clone(),
            || async {
                let store: Arc<dyn TournamentStore> = Arc::new(FlakyStore {
                    failures_left: AtomicU32::new(0),
                });
                Ok::<_, StorageError>(store)
            },
            fast_policy(),
        ));

        for _ in 0..100 {
            if !state.is_degraded().await {
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        supervisor.abort();

        assert!(!state.is_degraded().await);
        assert!(state.tournament_store().await.is_some());
    }
}
