use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Bracket Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::tournament::list_tournaments,
        crate::routes::tournament::create_tournament,
        crate::routes::tournament::get_tournament,
        crate::routes::tournament::delete_tournament,
        crate::routes::tournament::update_match,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::tournament::CreateTournamentRequest,
            crate::dto::tournament::UpdateMatchRequest,
            crate::dto::tournament::TournamentSummary,
            crate::dto::tournament::MatchSummary,
            crate::bracket::BracketStyle,
            crate::bracket::Segment,
            crate::bracket::Slot,
            crate::bracket::MatchState,
            crate::bracket::TournamentStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tournaments", description = "Bracket generation and match reporting"),
    )
)]
/// OpenAPI document covering every route.
pub struct ApiDoc;
