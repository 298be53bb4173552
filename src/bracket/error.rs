use thiserror::Error;
use uuid::Uuid;

use super::model::BracketStyle;

/// Failures raised while generating or advancing a bracket.
///
/// Every variant except [`BracketError::PropagationInvariantViolation`] is detected before the
/// match arena is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Fewer than two entrants.
    #[error("a bracket needs at least 2 participants, got {count}")]
    InvalidRoster {
        /// Entrants submitted.
        count: usize,
    },
    /// The style has no topology builder.
    #[error("bracket style `{style}` is not supported")]
    UnsupportedStyle {
        /// Requested style.
        style: BracketStyle,
    },
    /// No match with this id exists in the tournament.
    #[error("match `{id}` not found")]
    MatchNotFound {
        /// Match identifier.
        id: Uuid,
    },
    /// One or both slots are still open or hold a bye.
    #[error("match `{id}` does not have two determined participants")]
    UndeterminedMatch {
        /// Match identifier.
        id: Uuid,
    },
    /// Both scores are equal.
    #[error("match `{id}` cannot end in a tie ({score}-{score})")]
    TiedScore {
        /// Match identifier.
        id: Uuid,
        /// Score shared by both sides.
        score: u32,
    },
    /// A result was already recorded.
    #[error("match `{id}` is already completed")]
    MatchAlreadyCompleted {
        /// Match identifier.
        id: Uuid,
    },
    /// The declared winner is not seated in the match.
    #[error("`{winner}` is not playing in match `{id}`")]
    InvalidWinner {
        /// Match identifier.
        id: Uuid,
        /// Name given as the winner.
        winner: String,
    },
    /// Advancement reached a slot that cannot accept the outcome.
    #[error("bracket propagation failed: {reason}")]
    PropagationInvariantViolation {
        /// Which routing step failed.
        reason: String,
    },
}

impl BracketError {
    pub(crate) fn violation(reason: impl Into<String>) -> Self {
        BracketError::PropagationInvariantViolation {
            reason: reason.into(),
        }
    }
}
