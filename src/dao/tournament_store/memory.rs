//! Process-local store used by the `memory` backend and by tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture};
use uuid::Uuid;

use crate::dao::{
    models::{TournamentEntity, sort_newest_first},
    storage::StorageResult,
};

use super::TournamentStore;

/// [`TournamentStore`] keeping every tournament in a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryTournamentStore {
    tournaments: Arc<DashMap<Uuid, TournamentEntity>>,
}

impl MemoryTournamentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TournamentStore for MemoryTournamentStore {
    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.tournaments.insert(tournament.id, tournament);
        Box::pin(future::ready(Ok(())))
    }

    fn find_tournament(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let found = self
            .tournaments
            .get(&id)
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.value().clone());
        Box::pin(future::ready(Ok(found)))
    }

    fn list_tournaments(
        &self,
        owner: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let mut owned = self
            .tournaments
            .iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        sort_newest_first(&mut owned);
        Box::pin(future::ready(Ok(owned)))
    }

    fn delete_tournament(&self, owner: Uuid, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self
            .tournaments
            .remove_if(&id, |_, entity| entity.owner == owner)
            .is_some();
        Box::pin(future::ready(Ok(removed)))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}
