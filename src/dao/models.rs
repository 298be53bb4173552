use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::bracket::{
    BracketStyle, Match, MatchState, Segment, Slot, Tournament, TournamentStatus, compute_status,
};

/// Persisted tournament, scoped to the account that created it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentEntity {
    /// Stable identifier for the tournament.
    pub id: Uuid,
    /// Account owning the tournament.
    pub owner: Uuid,
    /// Display name of the tournament.
    pub name: String,
    /// Title of the game being played.
    pub game: String,
    /// Declared capacity.
    pub max_participants: u32,
    /// Elimination format.
    pub style: BracketStyle,
    /// Status derived from the matches at the last save.
    pub status: TournamentStatus,
    /// Entrant names in the order they were submitted.
    pub participants: Vec<String>,
    /// Every match of the bracket.
    pub matches: Vec<MatchEntity>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Timestamp of the last mutation.
    pub updated_at: SystemTime,
}

/// Persisted match inside a [`TournamentEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Stable identifier for the match.
    pub id: Uuid,
    /// Signed round number; negative for the losers segment.
    pub round: i32,
    /// 1-based position within the round.
    pub match_number: u32,
    /// Part of the bracket holding the match.
    pub segment: Segment,
    /// Upper participant slot.
    pub slot_a: Slot,
    /// Lower participant slot.
    pub slot_b: Slot,
    /// Score of slot A, if reported.
    pub score_a: Option<u32>,
    /// Score of slot B, if reported.
    pub score_b: Option<u32>,
    /// Name of the winner once completed.
    pub winner: Option<String>,
    /// Lifecycle state.
    pub state: MatchState,
}

impl From<Match> for MatchEntity {
    fn from(value: Match) -> Self {
        Self {
            id: value.id,
            round: value.round,
            match_number: value.match_number,
            segment: value.segment,
            slot_a: value.slot_a,
            slot_b: value.slot_b,
            score_a: value.score_a,
            score_b: value.score_b,
            winner: value.winner,
            state: value.state,
        }
    }
}

impl From<MatchEntity> for Match {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            round: value.round,
            match_number: value.match_number,
            segment: value.segment,
            slot_a: value.slot_a,
            slot_b: value.slot_b,
            score_a: value.score_a,
            score_b: value.score_b,
            winner: value.winner,
            state: value.state,
        }
    }
}

impl From<Tournament> for TournamentEntity {
    fn from(value: Tournament) -> Self {
        Self {
            id: value.id,
            owner: value.owner,
            name: value.name,
            game: value.game,
            max_participants: u32::try_from(value.max_participants).unwrap_or(u32::MAX),
            style: value.style,
            status: value.status,
            participants: value.participants,
            matches: value.matches.into_iter().map(Into::into).collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// The stored `status` is ignored; it is derived again from the loaded matches.
impl From<TournamentEntity> for Tournament {
    fn from(value: TournamentEntity) -> Self {
        let matches: Vec<Match> = value.matches.into_iter().map(Into::into).collect();
        Self {
            id: value.id,
            owner: value.owner,
            name: value.name,
            game: value.game,
            max_participants: value.max_participants as usize,
            style: value.style,
            status: compute_status(&matches),
            participants: value.participants,
            matches,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Newest tournaments first.
pub fn sort_newest_first(tournaments: &mut [TournamentEntity]) {
    tournaments.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}
