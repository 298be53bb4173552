use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dao::{
    models::{TournamentEntity, sort_newest_first},
    storage::StorageResult,
    tournament_store::TournamentStore,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult, TournamentAction},
    models::{
        AllDocsResponse, CouchTournamentDocument, END_SUFFIX, RevisionOnly, TOURNAMENT_PREFIX,
        tournament_doc_id,
    },
};

/// Tournament store speaking the CouchDB HTTP API; one document per tournament.
#[derive(Clone)]
pub struct CouchTournamentStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchTournamentStore {
    /// Build the HTTP client and create the tournament database when it is missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: format!("{}/{}", config.base_url, config.database).into(),
            credentials: config.username.zip(config.password).map(Arc::new),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    /// Request against the database itself (`path == ""`) or one of its documents.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            self.database_url.to_string()
        } else {
            format!("{}/{path}", self.database_url)
        };
        let builder = self.client.request(method, url);
        match self.credentials.as_deref() {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn send(action: TournamentAction, builder: RequestBuilder) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport { action, source })
    }

    async fn decode<T: DeserializeOwned>(
        action: TournamentAction,
        response: Response,
    ) -> CouchResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|source| CouchDaoError::Transport { action, source })?;
        serde_json::from_slice(&body).map_err(|source| CouchDaoError::Unreadable { action, source })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let action = TournamentAction::Bootstrap;
        let response = Self::send(action, self.request(Method::GET, "")).await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = Self::send(action, self.request(Method::PUT, "")).await?;
                match created.status() {
                    // 412: another instance created it first.
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        info!(database = %self.database_url, "created CouchDB tournament database");
                        Ok(())
                    }
                    status => Err(CouchDaoError::Rejected { action, status }),
                }
            }
            status => Err(CouchDaoError::Rejected { action, status }),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        action: TournamentAction,
        id: Uuid,
    ) -> CouchResult<Option<T>> {
        let response = Self::send(action, self.request(Method::GET, &tournament_doc_id(id))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Self::decode(action, response).await.map(Some),
            status => Err(CouchDaoError::Rejected { action, status }),
        }
    }

    async fn save_tournament(&self, tournament: TournamentEntity) -> CouchResult<()> {
        let id = tournament.id;
        let action = TournamentAction::Save(id);
        let rev = self
            .fetch::<RevisionOnly>(action, id)
            .await?
            .map(|existing| existing.rev);
        let document = CouchTournamentDocument::from((tournament, rev));

        let response = Self::send(
            action,
            self.request(Method::PUT, &document.id).json(&document),
        )
        .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict { id }),
            status => Err(CouchDaoError::Rejected { action, status }),
        }
    }

    async fn find_tournament(&self, owner: Uuid, id: Uuid) -> CouchResult<Option<TournamentEntity>> {
        self.fetch::<CouchTournamentDocument>(TournamentAction::Find(id), id)
            .await?
            .filter(|doc| doc.tournament.owner == owner)
            .map(TournamentEntity::try_from)
            .transpose()
    }

    async fn list_tournaments(&self, owner: Uuid) -> CouchResult<Vec<TournamentEntity>> {
        let action = TournamentAction::List(owner);
        let range = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{TOURNAMENT_PREFIX}\"")),
            ("endkey", format!("\"{TOURNAMENT_PREFIX}{END_SUFFIX}\"")),
        ];
        let response = Self::send(action, self.request(Method::GET, "_all_docs").query(&range)).await?;
        if !response.status().is_success() {
            return Err(CouchDaoError::Rejected {
                action,
                status: response.status(),
            });
        }

        let payload: AllDocsResponse<CouchTournamentDocument> =
            Self::decode(action, response).await?;
        let mut owned = payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .filter(|doc| doc.tournament.owner == owner)
            .map(TournamentEntity::try_from)
            .collect::<CouchResult<Vec<_>>>()?;
        sort_newest_first(&mut owned);
        Ok(owned)
    }

    async fn delete_tournament(&self, owner: Uuid, id: Uuid) -> CouchResult<bool> {
        let action = TournamentAction::Delete(id);
        let Some(existing) = self.fetch::<RevisionOnly>(action, id).await? else {
            return Ok(false);
        };
        if existing.owner != owner {
            debug!(tournament_id = %id, "delete requested by another account");
            return Ok(false);
        }

        let response = Self::send(
            action,
            self.request(Method::DELETE, &tournament_doc_id(id))
                .query(&[("rev", existing.rev.as_str())]),
        )
        .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict { id }),
            status if status.is_success() => Ok(true),
            status => Err(CouchDaoError::Rejected { action, status }),
        }
    }
}

impl TournamentStore for CouchTournamentStore {
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
        Box::pin(async move {
            let action = TournamentAction::Bootstrap;
            let response = Self::send(action, store.request(Method::GET, "")).await?;
            match response.status() {
                status if status.is_success() => Ok(()),
                status => Err(CouchDaoError::Rejected { action, status }.into()),
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
