use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::compute_status;

/// Bracket format requested for a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BracketStyle {
    /// One loss eliminates a participant.
    #[default]
    SingleElimination,
    /// Winners and losers segments converging into a grand final.
    DoubleElimination,
    /// Accepted by the API surface but never laid out.
    RoundRobin,
}

impl fmt::Display for BracketStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BracketStyle::SingleElimination => "single-elimination",
            BracketStyle::DoubleElimination => "double-elimination",
            BracketStyle::RoundRobin => "round-robin",
        };
        f.write_str(label)
    }
}

/// Partition of the bracket a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Main tree; every entrant starts here.
    Winners,
    /// Second-chance tree fed by winners-segment losers.
    Losers,
    /// Deciding match between the two segment champions.
    GrandFinals,
}

/// Lifecycle of a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Waiting for participants or for a result.
    #[default]
    Pending,
    /// Being played; interim scores may be stored.
    Live,
    /// Result recorded and propagated.
    Completed,
}

/// Lifecycle of a tournament, always derived from its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// No contested match has been played or started.
    #[default]
    NotStarted,
    /// At least one match is live or decided between two players.
    InProgress,
    /// Every match is completed or void.
    Finished,
}

/// Content of one side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Slot {
    /// Waiting for the outcome of an earlier match.
    #[default]
    Open,
    /// No opponent will ever arrive here.
    Bye,
    /// A participant occupying the slot.
    Player(String),
}

impl Slot {
    /// Name of the participant, if the slot holds one.
    pub fn player(&self) -> Option<&str> {
        match self {
            Slot::Player(name) => Some(name),
            _ => None,
        }
    }

    /// Still waiting for its feeder match.
    pub fn is_open(&self) -> bool {
        matches!(self, Slot::Open)
    }

    /// Will never receive a participant.
    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }
}

/// One side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First slot, fed by odd-numbered matches.
    A,
    /// Second slot, fed by even-numbered matches.
    B,
}

impl Side {
    /// Odd match numbers feed side A of their destination, even ones side B.
    pub fn from_match_number(match_number: u32) -> Self {
        if match_number % 2 == 1 { Side::A } else { Side::B }
    }

    /// The other side of the same match.
    pub fn opposite(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// The atomic unit of competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Stable identifier assigned at creation.
    pub id: Uuid,
    /// Positive for winners rounds, negative for losers rounds and the grand final.
    pub round: i32,
    /// 1-based position, unique only within `(round, segment)`.
    pub match_number: u32,
    /// Segment the match is played in.
    pub segment: Segment,
    /// Occupant of side A.
    pub slot_a: Slot,
    /// Occupant of side B.
    pub slot_b: Slot,
    /// Points of side A, once reported.
    pub score_a: Option<u32>,
    /// Points of side B, once reported.
    pub score_b: Option<u32>,
    /// Name of the winning participant.
    pub winner: Option<String>,
    /// Where the match is in its lifecycle.
    pub state: MatchState,
}

impl Match {
    pub(crate) fn new(
        segment: Segment,
        round: i32,
        match_number: u32,
        slot_a: Slot,
        slot_b: Slot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            match_number,
            segment,
            slot_a,
            slot_b,
            score_a: None,
            score_b: None,
            winner: None,
            state: MatchState::Pending,
        }
    }

    /// Occupant of `side`.
    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::A => &self.slot_a,
            Side::B => &self.slot_b,
        }
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    /// Both slots are known, whatever they hold.
    pub fn is_filled(&self) -> bool {
        !self.slot_a.is_open() && !self.slot_b.is_open()
    }

    /// Two real participants are seated and no result has been recorded yet.
    pub fn is_ready(&self) -> bool {
        self.slot_a.player().is_some()
            && self.slot_b.player().is_some()
            && self.state != MatchState::Completed
    }

    /// Neither side will ever receive a participant, so the match is never played.
    pub fn is_void(&self) -> bool {
        self.slot_a.is_bye() && self.slot_b.is_bye()
    }

    /// Completed without a contest because one side was a bye.
    pub fn is_walkover(&self) -> bool {
        self.state == MatchState::Completed && (self.slot_a.is_bye() || self.slot_b.is_bye())
    }

    /// Side occupied by `name`, preferring side A when both sides carry the same name.
    pub fn side_of(&self, name: &str) -> Option<Side> {
        if self.slot_a.player() == Some(name) {
            Some(Side::A)
        } else if self.slot_b.player() == Some(name) {
            Some(Side::B)
        } else {
            None
        }
    }
}

/// Aggregate root owning every match of one bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tournament {
    /// Stable identifier.
    pub id: Uuid,
    /// Account that created the tournament; every lookup is scoped to it.
    pub owner: Uuid,
    /// Display name.
    pub name: String,
    /// Title of the game being played.
    pub game: String,
    /// Capacity the roster was padded or truncated to.
    pub max_participants: usize,
    /// Bracket format.
    pub style: BracketStyle,
    /// Lifecycle derived from `matches`.
    pub status: TournamentStatus,
    /// Normalized entrant names in submission order.
    pub participants: Vec<String>,
    /// Every match of the bracket, laid out at creation.
    pub matches: Vec<Match>,
    /// Creation time.
    pub created_at: SystemTime,
    /// Time of the last recorded change.
    pub updated_at: SystemTime,
}

impl Tournament {
    /// Assemble a freshly generated tournament; the status is derived from `matches`.
    pub fn new(
        owner: Uuid,
        name: String,
        game: String,
        max_participants: usize,
        style: BracketStyle,
        participants: Vec<String>,
        matches: Vec<Match>,
    ) -> Self {
        let now = SystemTime::now();
        let status = compute_status(&matches);
        Self {
            id: Uuid::new_v4(),
            owner,
            name,
            game,
            max_participants,
            style,
            status,
            participants,
            matches,
            created_at: now,
            updated_at: now,
        }
    }

    /// Match with the given id, if it belongs to this tournament.
    pub fn find_match(&self, id: Uuid) -> Option<&Match> {
        self.matches.iter().find(|candidate| candidate.id == id)
    }

    /// Name of the grand-final or winners-final winner once decided.
    pub fn champion(&self) -> Option<&str> {
        let decider = match self.style {
            BracketStyle::DoubleElimination => self
                .matches
                .iter()
                .find(|candidate| candidate.segment == Segment::GrandFinals),
            _ => self
                .matches
                .iter()
                .filter(|candidate| candidate.segment == Segment::Winners)
                .max_by_key(|candidate| candidate.round),
        };
        decider.and_then(|decider| decider.winner.as_deref())
    }
}
