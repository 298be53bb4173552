use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    bracket::{BracketStyle, Match, MatchState, Segment, Slot, Tournament, TournamentStatus},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_participant_names},
    },
};

/// Payload for creating a tournament and generating its bracket.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTournamentRequest {
    /// Display name of the tournament.
    #[validate(length(max = 100), custom(function = validate_not_blank))]
    pub name: String,
    /// Title of the game being played.
    #[validate(length(max = 100), custom(function = validate_not_blank))]
    pub game: String,
    /// Bracket capacity; the roster is padded or truncated to it.
    #[validate(range(min = 2))]
    pub max_participants: usize,
    /// Entrant names; missing or blank entries get a `Player N` placeholder.
    #[serde(default)]
    #[validate(custom(function = validate_participant_names))]
    pub participants: Option<Vec<Option<String>>>,
    /// Defaults to the configured style.
    #[serde(default)]
    pub style: Option<BracketStyle>,
}

/// Score report for one match.
///
/// With a `winner` the result is final and propagated; without one the scores are stored as
/// live progress.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateMatchRequest {
    /// Score of the participant in slot A.
    pub score_a: u32,
    /// Score of the participant in slot B.
    pub score_b: u32,
    /// Name of the winning participant; omit to report live progress.
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub winner: Option<String>,
}

/// Tournament as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct TournamentSummary {
    /// Tournament identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Title of the game being played.
    pub game: String,
    /// Bracket capacity.
    pub max_participants: usize,
    /// Bracket format.
    pub style: BracketStyle,
    /// Lifecycle derived from the matches.
    pub status: TournamentStatus,
    /// Entrant names after normalization.
    pub participants: Vec<String>,
    /// Winner of the deciding match, once played.
    pub champion: Option<String>,
    /// Every match of the bracket.
    pub matches: Vec<MatchSummary>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

/// Match as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier, used when reporting scores.
    pub id: Uuid,
    /// Positive in the winners segment, negative in the losers segment.
    pub round: i32,
    /// Position within the round.
    pub match_number: u32,
    /// Winners, losers or grand finals.
    pub segment: Segment,
    /// Occupant of side A.
    pub slot_a: Slot,
    /// Occupant of side B.
    pub slot_b: Slot,
    /// Points of side A.
    pub score_a: Option<u32>,
    /// Points of side B.
    pub score_b: Option<u32>,
    /// Winning participant, once decided.
    pub winner: Option<String>,
    /// Match lifecycle.
    pub state: MatchState,
    /// Both entrants are known and the match can be reported.
    pub ready: bool,
}

impl From<&Match> for MatchSummary {
    fn from(value: &Match) -> Self {
        Self {
            id: value.id,
            round: value.round,
            match_number: value.match_number,
            segment: value.segment,
            slot_a: value.slot_a.clone(),
            slot_b: value.slot_b.clone(),
            score_a: value.score_a,
            score_b: value.score_b,
            winner: value.winner.clone(),
            state: value.state,
            ready: value.is_ready(),
        }
    }
}

impl From<Tournament> for TournamentSummary {
    fn from(value: Tournament) -> Self {
        let champion = value.champion().map(str::to_owned);
        let matches = value.matches.iter().map(MatchSummary::from).collect();
        Self {
            id: value.id,
            name: value.name,
            game: value.game,
            max_participants: value.max_participants,
            style: value.style,
            status: value.status,
            participants: value.participants,
            champion,
            matches,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}
