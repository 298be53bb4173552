use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoTournamentDocument, doc_id, owned_doc_id, owner_filter},
};
use crate::dao::{models::TournamentEntity, storage::StorageResult, tournament_store::TournamentStore};

const TOURNAMENT_COLLECTION_NAME: &str = "tournaments";

/// MongoDB-backed [`TournamentStore`] implementation.
#[derive(Clone)]
pub struct MongoTournamentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        info!("MongoDB connection re-established");
        Ok(())
    }
}

impl MongoTournamentStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"owner": 1, "created_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("tournament_owner_created_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TOURNAMENT_COLLECTION_NAME,
                index: "owner,created_at",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoTournamentDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoTournamentDocument>(TOURNAMENT_COLLECTION_NAME)
    }

    async fn save_tournament(&self, tournament: TournamentEntity) -> MongoResult<()> {
        let id = tournament.id;
        let document: MongoTournamentDocument = tournament.into();
        let collection = self.collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTournament { id, source })?;

        Ok(())
    }

    async fn find_tournament(&self, owner: Uuid, id: Uuid) -> MongoResult<Option<TournamentEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(owned_doc_id(owner, id))
            .await
            .map_err(|source| MongoDaoError::LoadTournament { id, source })?;

        document.map(TournamentEntity::try_from).transpose()
    }

    async fn list_tournaments(&self, owner: Uuid) -> MongoResult<Vec<TournamentEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoTournamentDocument> = collection
            .find(owner_filter(owner))
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListTournaments { owner, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTournaments { owner, source })?;

        documents
            .into_iter()
            .map(TournamentEntity::try_from)
            .collect()
    }

    async fn delete_tournament(&self, owner: Uuid, id: Uuid) -> MongoResult<bool> {
        let collection = self.collection().await;
        let result = collection
            .delete_one(owned_doc_id(owner, id))
            .await
            .map_err(|source| MongoDaoError::DeleteTournament { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl TournamentStore for MongoTournamentStore {
    fn save_tournament(&self, tournament: TournamentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_tournament(tournament).await.map_err(Into::into) })
    }

    fn find_tournament(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_tournament(owner, id).await.map_err(Into::into) })
    }

    fn list_tournaments(
        &self,
        owner: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_tournaments(owner).await.map_err(Into::into) })
    }

    fn delete_tournament(&self, owner: Uuid, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_tournament(owner, id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
