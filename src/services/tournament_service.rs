use std::{future::Future, sync::Arc};

use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    bracket::{BracketEngine, Tournament, roster::normalize_roster},
    config::MIN_PARTICIPANTS,
    dao::{storage::StorageResult, tournament_store::TournamentStore},
    dto::tournament::{CreateTournamentRequest, TournamentSummary, UpdateMatchRequest},
    error::ServiceError,
    state::{DEFAULT_OPERATION_TIMEOUT, SharedState},
};

/// Generate a bracket for the submitted roster and persist the new tournament.
#[instrument(skip(state, request), fields(owner = %owner))]
pub async fn create_tournament(
    state: &SharedState,
    owner: Uuid,
    request: CreateTournamentRequest,
) -> Result<TournamentSummary, ServiceError> {
    let limit = state.config().participant_limit();
    if !(MIN_PARTICIPANTS..=limit).contains(&request.max_participants) {
        return Err(ServiceError::InvalidInput(format!(
            "max_participants must be between {MIN_PARTICIPANTS} and {limit}"
        )));
    }

    let store = state.require_tournament_store().await?;
    let style = request
        .style
        .unwrap_or_else(|| state.config().default_style());
    let participants = normalize_roster(
        request.participants.unwrap_or_default(),
        request.max_participants,
    );
    let matches = state.engine().build_bracket(&participants, style)?;

    let tournament = Tournament::new(
        owner,
        request.name.trim().to_owned(),
        request.game.trim().to_owned(),
        request.max_participants,
        style,
        participants,
        matches,
    );

    bounded(store.save_tournament(tournament.clone().into())).await?;
    info!(
        tournament_id = %tournament.id,
        style = %tournament.style,
        matches = tournament.matches.len(),
        "tournament created"
    );
    Ok(tournament.into())
}

/// Every tournament of `owner`, newest first.
pub async fn list_tournaments(
    state: &SharedState,
    owner: Uuid,
) -> Result<Vec<TournamentSummary>, ServiceError> {
    let store = state.require_tournament_store().await?;
    let entities = bounded(store.list_tournaments(owner)).await?;
    Ok(entities
        .into_iter()
        .map(|entity| Tournament::from(entity).into())
        .collect())
}

/// One tournament of `owner`.
pub async fn get_tournament(
    state: &SharedState,
    owner: Uuid,
    id: Uuid,
) -> Result<TournamentSummary, ServiceError> {
    let store = state.require_tournament_store().await?;
    bounded(store.find_tournament(owner, id))
        .await?
        .map(|entity| Tournament::from(entity).into())
        .ok_or_else(|| tournament_not_found(id))
}

/// Remove a tournament of `owner`.
#[instrument(skip(state), fields(owner = %owner))]
pub async fn delete_tournament(
    state: &SharedState,
    owner: Uuid,
    id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_tournament_store().await?;
    let deleted = state
        .with_tournament_lock(id, || async move {
            store
                .delete_tournament(owner, id)
                .await
                .map_err(ServiceError::from)
        })
        .await?;

    if !deleted {
        return Err(tournament_not_found(id));
    }
    info!(tournament_id = %id, "tournament deleted");
    Ok(())
}

/// Record a final result (when `winner` is given) or live scores on one match.
///
/// The load-mutate-save cycle runs under the tournament lock; nothing is saved when the
/// engine rejects the report.
#[instrument(skip(state, request), fields(owner = %owner))]
pub async fn update_match(
    state: &SharedState,
    owner: Uuid,
    tournament_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchRequest,
) -> Result<TournamentSummary, ServiceError> {
    let store = state.require_tournament_store().await?;
    let engine = state.engine().clone();

    state
        .with_tournament_lock(tournament_id, || {
            apply_report(store, engine, owner, tournament_id, match_id, request)
        })
        .await
}

async fn apply_report(
    store: Arc<dyn TournamentStore>,
    engine: BracketEngine,
    owner: Uuid,
    tournament_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchRequest,
) -> Result<TournamentSummary, ServiceError> {
    let entity = store
        .find_tournament(owner, tournament_id)
        .await?
        .ok_or_else(|| tournament_not_found(tournament_id))?;
    let mut tournament = Tournament::from(entity);
    let previous_status = tournament.status;

    let outcome = match request.winner.as_deref().map(str::trim) {
        Some(winner) => engine.record_result(
            &mut tournament,
            match_id,
            request.score_a,
            request.score_b,
            winner,
        ),
        None => engine.report_progress(&mut tournament, match_id, request.score_a, request.score_b),
    };
    if let Err(err) = outcome {
        warn!(%tournament_id, %match_id, error = %err, "match report rejected");
        return Err(err.into());
    }

    store.save_tournament(tournament.clone().into()).await?;
    if tournament.status != previous_status {
        info!(
            %tournament_id,
            from = ?previous_status,
            to = ?tournament.status,
            "tournament status changed"
        );
    }
    Ok(tournament.into())
}

fn tournament_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("tournament `{id}` not found"))
}

/// Bound a storage call by the default operation timeout.
async fn bounded<T>(work: impl Future<Output = StorageResult<T>>) -> Result<T, ServiceError> {
    match timeout(DEFAULT_OPERATION_TIMEOUT, work).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ServiceError::Timeout),
    }
}
