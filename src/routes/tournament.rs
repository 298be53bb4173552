use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::tournament::{CreateTournamentRequest, TournamentSummary, UpdateMatchRequest},
    error::AppError,
    services::tournament_service,
    state::SharedState,
};

const ACCOUNT_HEADER: &str = "x-account-id";

/// Identity of the caller, taken from the `X-Account-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct AccountId(pub Uuid);

/// Tournament endpoints, all scoped to the calling account.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tournaments", get(list_tournaments).post(create_tournament))
        .route(
            "/tournaments/{id}",
            get(get_tournament).delete(delete_tournament),
        )
        .route("/tournaments/{id}/matches/{match_id}", put(update_match))
        .route_layer(middleware::from_fn(require_account))
}

/// List the caller's tournaments, newest first.
#[utoipa::path(
    get,
    path = "/tournaments",
    tag = "tournaments",
    params(("X-Account-Id" = String, Header, description = "Account owning the tournaments")),
    responses((status = 200, description = "Tournaments of the account", body = [TournamentSummary]))
)]
pub async fn list_tournaments(
    State(state): State<SharedState>,
    Extension(AccountId(owner)): Extension<AccountId>,
) -> Result<Json<Vec<TournamentSummary>>, AppError> {
    Ok(Json(
        tournament_service::list_tournaments(&state, owner).await?,
    ))
}

/// Create a tournament and generate its full bracket.
#[utoipa::path(
    post,
    path = "/tournaments",
    tag = "tournaments",
    params(("X-Account-Id" = String, Header, description = "Account owning the tournament")),
    request_body = CreateTournamentRequest,
    responses(
        (status = 201, description = "Tournament created", body = TournamentSummary),
        (status = 400, description = "Invalid roster, capacity or style")
    )
)]
pub async fn create_tournament(
    State(state): State<SharedState>,
    Extension(AccountId(owner)): Extension<AccountId>,
    Valid(Json(payload)): Valid<Json<CreateTournamentRequest>>,
) -> Result<(StatusCode, Json<TournamentSummary>), AppError> {
    let tournament = tournament_service::create_tournament(&state, owner, payload).await?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Retrieve one tournament with its bracket.
#[utoipa::path(
    get,
    path = "/tournaments/{id}",
    tag = "tournaments",
    params(("X-Account-Id" = String, Header, description = "Account owning the tournament"),
    ("id" = String, Path, description = "Identifier of the tournament")),
    responses(
        (status = 200, description = "Tournament", body = TournamentSummary),
        (status = 404, description = "No such tournament for this account")
    )
)]
pub async fn get_tournament(
    State(state): State<SharedState>,
    Extension(AccountId(owner)): Extension<AccountId>,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentSummary>, AppError> {
    Ok(Json(
        tournament_service::get_tournament(&state, owner, id).await?,
    ))
}

/// Delete a tournament.
#[utoipa::path(
    delete,
    path = "/tournaments/{id}",
    tag = "tournaments",
    params(("X-Account-Id" = String, Header, description = "Account owning the tournament"),
    ("id" = String, Path, description = "Identifier of the tournament")),
    responses(
        (status = 204, description = "Tournament deleted"),
        (status = 404, description = "No such tournament for this account")
    )
)]
pub async fn delete_tournament(
    State(state): State<SharedState>,
    Extension(AccountId(owner)): Extension<AccountId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tournament_service::delete_tournament(&state, owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report a match: final result when `winner` is set, live scores otherwise.
#[utoipa::path(
    put,
    path = "/tournaments/{id}/matches/{match_id}",
    tag = "tournaments",
    params(("X-Account-Id" = String, Header, description = "Account owning the tournament"),
    ("id" = String, Path, description = "Identifier of the tournament"),
    ("match_id" = String, Path, description = "Identifier of the match")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Updated tournament", body = TournamentSummary),
        (status = 400, description = "Tied final score or winner not seated in the match"),
        (status = 404, description = "No such tournament or match"),
        (status = 409, description = "Match not ready or already completed")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Extension(AccountId(owner)): Extension<AccountId>,
    Path((id, match_id)): Path<(Uuid, Uuid)>,
    Valid(Json(payload)): Valid<Json<UpdateMatchRequest>>,
) -> Result<Json<TournamentSummary>, AppError> {
    Ok(Json(
        tournament_service::update_match(&state, owner, id, match_id, payload).await?,
    ))
}

async fn require_account(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw = req
        .headers()
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing account header `X-Account-Id`".into()))?;

    let account = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Unauthorized("`X-Account-Id` must be a UUID".into()))?;

    req.extensions_mut().insert(AccountId(account));
    Ok(next.run(req).await)
}
