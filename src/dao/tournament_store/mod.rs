/// CouchDB backend over its HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::TournamentEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for tournaments.
///
/// Every lookup is scoped to the owning account: a tournament belonging to someone else is
/// reported as absent.
pub trait TournamentStore: Send + Sync {
    /// Insert or replace a tournament.
    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load one tournament owned by `owner`.
    fn find_tournament(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>>;
    /// Every tournament owned by `owner`, newest first.
    fn list_tournaments(&self, owner: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>>;
    /// Remove a tournament owned by `owner`; `false` when nothing matched.
    fn delete_tournament(&self, owner: Uuid, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap round-trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
