use super::model::{Match, MatchState, TournamentStatus};

/// Derive the tournament lifecycle from its matches.
///
/// Byes resolved at creation do not start a tournament: only a live match or one completed
/// between two real participants does. A bracket is finished once every match is completed or
/// void. An empty match set has nothing to play and reports `NotStarted`.
pub fn compute_status(matches: &[Match]) -> TournamentStatus {
    if matches.is_empty() {
        return TournamentStatus::NotStarted;
    }

    let resolved = matches
        .iter()
        .all(|candidate| candidate.state == MatchState::Completed || candidate.is_void());
    if resolved {
        return TournamentStatus::Finished;
    }

    let contested = matches.iter().any(|candidate| match candidate.state {
        MatchState::Live => true,
        MatchState::Completed => !candidate.is_walkover(),
        MatchState::Pending => false,
    });

    if contested {
        TournamentStatus::InProgress
    } else {
        TournamentStatus::NotStarted
    }
}
