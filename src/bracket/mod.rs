//! Bracket generation and advancement engine.
//!
//! The engine is synchronous and owns no storage: it lays out the full match set of a
//! single- or double-elimination bracket, then applies results to a [`Tournament`] aggregate,
//! routing winners and losers into the matches that depend on them. Callers serialize access
//! to one tournament and persist it only when an operation succeeds.

mod advancement;
mod error;
mod model;
/// Entrant list normalization.
pub mod roster;
mod routing;
mod seeding;
mod status;
mod topology;

use std::{sync::Arc, time::SystemTime};

use rand::Rng;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub use error::BracketError;
pub use model::{
    BracketStyle, Match, MatchState, Segment, Side, Slot, Tournament, TournamentStatus,
};
pub use routing::{LoserDropOrder, LoserRouting, SlotRef, StandardLoserRouting};
pub use seeding::{assign_slots, next_power_of_two};
pub use status::compute_status;
pub use topology::BracketShape;

/// Entry point for building brackets and recording results.
#[derive(Debug, Clone)]
pub struct BracketEngine {
    routing: Arc<dyn LoserRouting>,
}

impl Default for BracketEngine {
    fn default() -> Self {
        Self::new(Arc::new(StandardLoserRouting::default()))
    }
}

impl BracketEngine {
    /// Engine using a custom loser-routing strategy.
    pub fn new(routing: Arc<dyn LoserRouting>) -> Self {
        Self { routing }
    }

    /// Engine using the standard table with the given drop order.
    pub fn with_drop_order(order: LoserDropOrder) -> Self {
        Self::new(Arc::new(StandardLoserRouting::new(order)))
    }

    /// Lay out every match for `participants`, seeded in random order.
    pub fn build_bracket(
        &self,
        participants: &[String],
        style: BracketStyle,
    ) -> Result<Vec<Match>, BracketError> {
        self.build_bracket_with_rng(participants, style, &mut rand::rng())
    }

    /// Same as [`BracketEngine::build_bracket`] with a caller-provided source of randomness.
    #[instrument(skip(self, participants, rng), fields(participants = participants.len()))]
    pub fn build_bracket_with_rng<R>(
        &self,
        participants: &[String],
        style: BracketStyle,
        rng: &mut R,
    ) -> Result<Vec<Match>, BracketError>
    where
        R: Rng + ?Sized,
    {
        if style == BracketStyle::RoundRobin {
            return Err(BracketError::UnsupportedStyle { style });
        }

        let slots = assign_slots(participants, rng)?;
        let shape = BracketShape::new(slots.len() as u32, style)?;
        let mut matches = topology::layout(&shape, slots);
        advancement::settle_new_bracket(self.routing.as_ref(), &shape, &mut matches)
            .inspect_err(|err| error!(error = %err, "failed to resolve byes in new bracket"))?;

        info!(matches = matches.len(), "bracket generated");
        Ok(matches)
    }

    /// Record the final result of a match and propagate its outcome.
    ///
    /// On error the tournament is left untouched.
    #[instrument(skip(self, tournament), fields(tournament_id = %tournament.id))]
    pub fn record_result(
        &self,
        tournament: &mut Tournament,
        match_id: Uuid,
        score_a: u32,
        score_b: u32,
        winner: &str,
    ) -> Result<(), BracketError> {
        let shape = BracketShape::from_matches(&tournament.matches, tournament.style)?;
        let mut staged = tournament.matches.clone();

        advancement::apply_result(
            self.routing.as_ref(),
            &shape,
            &mut staged,
            match_id,
            score_a,
            score_b,
            winner,
        )
        .inspect_err(|err| {
            if matches!(err, BracketError::PropagationInvariantViolation { .. }) {
                error!(error = %err, "result rejected, bracket left unchanged");
            }
        })?;

        commit(tournament, staged);
        Ok(())
    }

    /// Store in-progress scores on a ready match and mark it live. Ties are allowed.
    #[instrument(skip(self, tournament), fields(tournament_id = %tournament.id))]
    pub fn report_progress(
        &self,
        tournament: &mut Tournament,
        match_id: Uuid,
        score_a: u32,
        score_b: u32,
    ) -> Result<(), BracketError> {
        let mut staged = tournament.matches.clone();
        advancement::apply_progress(&mut staged, match_id, score_a, score_b)?;
        commit(tournament, staged);
        Ok(())
    }
}

fn commit(tournament: &mut Tournament, matches: Vec<Match>) {
    tournament.matches = matches;
    tournament.status = compute_status(&tournament.matches);
    tournament.updated_at = SystemTime::now();
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn roster(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("P{i}")).collect()
    }

    fn tournament(count: usize, style: BracketStyle) -> (BracketEngine, Tournament) {
        let engine = BracketEngine::default();
        let mut rng = StdRng::seed_from_u64(count as u64);
        let participants = roster(count);
        let matches = engine
            .build_bracket_with_rng(&participants, style, &mut rng)
            .unwrap();
        let tournament = Tournament::new(
            Uuid::new_v4(),
            "Cup".into(),
            "Chess".into(),
            count,
            style,
            participants,
            matches,
        );
        (engine, tournament)
    }

    fn find(tournament: &Tournament, segment: Segment, round: i32, number: u32) -> &Match {
        tournament
            .matches
            .iter()
            .find(|m| m.segment == segment && m.round == round && m.match_number == number)
            .unwrap()
    }

    /// Report side A as the winner of every ready match until none is left.
    fn play_out(engine: &BracketEngine, tournament: &mut Tournament) -> usize {
        let mut played = 0;
        loop {
            let next = tournament
                .matches
                .iter()
                .find(|m| m.is_ready())
                .map(|m| (m.id, m.slot_a.player().unwrap().to_owned()));
            let Some((id, winner)) = next else {
                return played;
            };
            engine
                .record_result(tournament, id, 3, 1, &winner)
                .unwrap();
            played += 1;
        }
    }

    #[test]
    fn four_entrants_single_elimination() {
        let (_, t) = tournament(4, BracketStyle::SingleElimination);
        assert_eq!(t.matches.len(), 3);
        assert_eq!(t.matches.iter().filter(|m| m.round == 1).count(), 2);

        let final_match = find(&t, Segment::Winners, 2, 1);
        assert_eq!(final_match.slot_a, Slot::Open);
        assert_eq!(final_match.slot_b, Slot::Open);
        assert_eq!(final_match.state, MatchState::Pending);
    }

    #[test]
    fn four_entrants_double_elimination() {
        let (_, t) = tournament(4, BracketStyle::DoubleElimination);
        let by_segment = |segment| t.matches.iter().filter(|m| m.segment == segment).count();

        assert_eq!(t.matches.len(), 6);
        assert_eq!(by_segment(Segment::Winners), 3);
        assert_eq!(by_segment(Segment::Losers), 2);
        assert_eq!(by_segment(Segment::GrandFinals), 1);
        assert_eq!(find(&t, Segment::GrandFinals, -3, 1).state, MatchState::Pending);
    }

    #[test]
    fn match_counts_follow_slot_count() {
        for count in 2..=33 {
            let (_, t) = tournament(count, BracketStyle::SingleElimination);
            let slots = next_power_of_two(count);
            assert_eq!(t.matches.len(), slots - 1, "{count} entrants");
            assert_eq!(
                t.matches.iter().filter(|m| m.round == 1).count(),
                slots / 2,
                "{count} entrants"
            );
        }
    }

    #[test]
    fn byes_complete_at_creation() {
        let (_, t) = tournament(3, BracketStyle::SingleElimination);
        let walkover = t
            .matches
            .iter()
            .find(|m| m.round == 1 && m.slot_b.is_bye())
            .unwrap();

        assert_eq!(walkover.state, MatchState::Completed);
        assert_eq!(walkover.winner.as_deref(), walkover.slot_a.player());
        assert_eq!((walkover.score_a, walkover.score_b), (Some(1), Some(0)));

        let final_match = find(&t, Segment::Winners, 2, 1);
        assert_eq!(final_match.slot_b, walkover.slot_a);
        assert_eq!(t.status, TournamentStatus::NotStarted);
    }

    #[test]
    fn winner_moves_to_next_round_slot_a() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let opener = find(&t, Segment::Winners, 1, 1).clone();
        let winner = opener.slot_a.player().unwrap().to_owned();

        engine
            .record_result(&mut t, opener.id, 2, 0, &winner)
            .unwrap();

        let recorded = t.find_match(opener.id).unwrap();
        assert_eq!(recorded.state, MatchState::Completed);
        assert_eq!(recorded.winner.as_deref(), Some(winner.as_str()));
        assert_eq!(find(&t, Segment::Winners, 2, 1).slot_a, Slot::Player(winner));
        assert_eq!(t.status, TournamentStatus::InProgress);
    }

    #[test]
    fn even_match_feeds_slot_b() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let second = find(&t, Segment::Winners, 1, 2).clone();
        let winner = second.slot_b.player().unwrap().to_owned();

        engine.record_result(&mut t, second.id, 0, 2, &winner).unwrap();

        let final_match = find(&t, Segment::Winners, 2, 1);
        assert_eq!(final_match.slot_a, Slot::Open);
        assert_eq!(final_match.slot_b, Slot::Player(winner));
        assert!(!final_match.is_ready());
    }

    #[test]
    fn tie_is_rejected_without_changes() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let before = t.clone();
        let opener = find(&t, Segment::Winners, 1, 1).clone();

        let err = engine
            .record_result(&mut t, opener.id, 1, 1, opener.slot_a.player().unwrap())
            .unwrap_err();

        assert_eq!(err, BracketError::TiedScore { id: opener.id, score: 1 });
        assert_eq!(t, before);
    }

    #[test]
    fn undetermined_match_is_rejected() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let final_id = find(&t, Segment::Winners, 2, 1).id;

        let err = engine
            .record_result(&mut t, final_id, 2, 1, "P1")
            .unwrap_err();
        assert_eq!(err, BracketError::UndeterminedMatch { id: final_id });
    }

    #[test]
    fn unknown_match_and_foreign_winner_are_rejected() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let missing = Uuid::new_v4();
        assert_eq!(
            engine.record_result(&mut t, missing, 2, 1, "P1").unwrap_err(),
            BracketError::MatchNotFound { id: missing }
        );

        let opener = find(&t, Segment::Winners, 1, 1).id;
        assert!(matches!(
            engine.record_result(&mut t, opener, 2, 1, "Nobody").unwrap_err(),
            BracketError::InvalidWinner { .. }
        ));
    }

    #[test]
    fn completed_match_cannot_be_reported_twice() {
        let (engine, mut t) = tournament(2, BracketStyle::SingleElimination);
        let only = t.matches[0].clone();
        let winner = only.slot_a.player().unwrap().to_owned();

        engine.record_result(&mut t, only.id, 2, 1, &winner).unwrap();
        assert_eq!(t.status, TournamentStatus::Finished);
        assert_eq!(
            engine.record_result(&mut t, only.id, 1, 2, &winner).unwrap_err(),
            BracketError::MatchAlreadyCompleted { id: only.id }
        );
    }

    #[test]
    fn loser_drops_into_losers_segment() {
        let (engine, mut t) = tournament(4, BracketStyle::DoubleElimination);
        let opener = find(&t, Segment::Winners, 1, 1).clone();
        let winner = opener.slot_a.player().unwrap().to_owned();
        let loser = opener.slot_b.clone();

        engine.record_result(&mut t, opener.id, 2, 1, &winner).unwrap();

        assert_eq!(find(&t, Segment::Losers, -1, 1).slot_a, loser);
    }

    #[test]
    fn double_elimination_reaches_grand_final() {
        let (engine, mut t) = tournament(4, BracketStyle::DoubleElimination);
        play_out(&engine, &mut t);

        let grand_final = find(&t, Segment::GrandFinals, -3, 1);
        assert_eq!(grand_final.state, MatchState::Completed);
        assert!(grand_final.slot_a.player().is_some());
        assert!(grand_final.slot_b.player().is_some());
        assert_eq!(t.status, TournamentStatus::Finished);
        assert!(t.champion().is_some());
    }

    #[test]
    fn two_entrant_double_elimination_replays_in_grand_final() {
        let (engine, mut t) = tournament(2, BracketStyle::DoubleElimination);
        assert_eq!(play_out(&engine, &mut t), 2);

        let grand_final = find(&t, Segment::GrandFinals, -3, 1);
        let mut finalists = [
            grand_final.slot_a.player().unwrap(),
            grand_final.slot_b.player().unwrap(),
        ];
        finalists.sort();
        assert_eq!(finalists, ["P1", "P2"]);
        assert_eq!(t.status, TournamentStatus::Finished);
    }

    #[test]
    fn every_bracket_plays_out_to_finished() {
        for style in [BracketStyle::SingleElimination, BracketStyle::DoubleElimination] {
            for count in 2..=24 {
                let (engine, mut t) = tournament(count, style);
                play_out(&engine, &mut t);

                assert_eq!(t.status, TournamentStatus::Finished, "{style} with {count}");
                assert!(t.champion().is_some(), "{style} with {count}");
                for m in t.matches.iter().filter(|m| m.state == MatchState::Completed) {
                    let winner = m.winner.as_deref().unwrap();
                    assert!(m.side_of(winner).is_some());
                }
            }
        }
    }

    #[test]
    fn every_entrant_loses_at_most_twice_in_double_elimination() {
        let (engine, mut t) = tournament(16, BracketStyle::DoubleElimination);
        play_out(&engine, &mut t);

        for name in &t.participants {
            let losses = t
                .matches
                .iter()
                .filter(|m| m.state == MatchState::Completed && !m.is_walkover())
                .filter(|m| m.side_of(name).is_some() && m.winner.as_deref() != Some(name))
                .count();
            assert!(losses <= 2, "{name} lost {losses} times");
        }
    }

    #[test]
    fn topology_shape_is_stable_across_calls() {
        let engine = BracketEngine::default();
        let participants = roster(11);
        let shape = |matches: Vec<Match>| {
            matches
                .into_iter()
                .map(|m| (m.segment, m.round, m.match_number))
                .collect::<Vec<_>>()
        };

        let first = engine
            .build_bracket(&participants, BracketStyle::DoubleElimination)
            .unwrap();
        let second = engine
            .build_bracket(&participants, BracketStyle::DoubleElimination)
            .unwrap();
        assert_eq!(shape(first), shape(second));
    }

    #[test]
    fn progress_marks_match_live() {
        let (engine, mut t) = tournament(4, BracketStyle::SingleElimination);
        let opener = find(&t, Segment::Winners, 1, 1).clone();

        engine.report_progress(&mut t, opener.id, 1, 1).unwrap();
        let live = t.find_match(opener.id).unwrap();
        assert_eq!(live.state, MatchState::Live);
        assert_eq!((live.score_a, live.score_b), (Some(1), Some(1)));
        assert_eq!(t.status, TournamentStatus::InProgress);

        let winner = opener.slot_a.player().unwrap();
        engine.record_result(&mut t, opener.id, 2, 1, winner).unwrap();
        assert_eq!(t.find_match(opener.id).unwrap().state, MatchState::Completed);
    }

    #[test]
    fn round_robin_is_rejected() {
        let engine = BracketEngine::default();
        let err = engine
            .build_bracket(&roster(4), BracketStyle::RoundRobin)
            .unwrap_err();
        assert_eq!(
            err,
            BracketError::UnsupportedStyle {
                style: BracketStyle::RoundRobin
            }
        );
    }

    #[test]
    fn single_entrant_is_rejected() {
        let engine = BracketEngine::default();
        assert_eq!(
            engine
                .build_bracket(&roster(1), BracketStyle::SingleElimination)
                .unwrap_err(),
            BracketError::InvalidRoster { count: 1 }
        );
    }

    #[derive(Debug)]
    struct NowhereRouting;

    impl LoserRouting for NowhereRouting {
        fn loser_destination(&self, _: &BracketShape, _: u32, _: u32) -> Option<SlotRef> {
            None
        }
    }

    #[test]
    fn failed_propagation_leaves_tournament_untouched() {
        let engine = BracketEngine::new(Arc::new(NowhereRouting));
        let participants = roster(4);
        let mut rng = StdRng::seed_from_u64(3);
        let matches = engine
            .build_bracket_with_rng(&participants, BracketStyle::DoubleElimination, &mut rng)
            .unwrap();
        let mut t = Tournament::new(
            Uuid::new_v4(),
            "Cup".into(),
            "Chess".into(),
            4,
            BracketStyle::DoubleElimination,
            participants,
            matches,
        );
        let before = t.clone();
        let opener = find(&t, Segment::Winners, 1, 1).clone();

        let err = engine
            .record_result(&mut t, opener.id, 2, 1, opener.slot_a.player().unwrap())
            .unwrap_err();

        assert!(matches!(err, BracketError::PropagationInvariantViolation { .. }));
        assert_eq!(t, before);
    }

    /// Sends every first-round loser to the same slot; later rounds use the standard table.
    #[derive(Debug)]
    struct CollidingRouting;

    impl LoserRouting for CollidingRouting {
        fn loser_destination(
            &self,
            shape: &BracketShape,
            winners_round: u32,
            match_number: u32,
        ) -> Option<SlotRef> {
            if winners_round == 1 {
                return Some(SlotRef {
                    segment: Segment::Losers,
                    round: -1,
                    match_number: 1,
                    side: Side::A,
                });
            }
            StandardLoserRouting::default().loser_destination(shape, winners_round, match_number)
        }
    }

    #[test]
    fn occupied_loser_target_falls_back_to_first_open_losers_slot() {
        let engine = BracketEngine::new(Arc::new(CollidingRouting));
        let participants = roster(4);
        let mut rng = StdRng::seed_from_u64(11);
        let matches = engine
            .build_bracket_with_rng(&participants, BracketStyle::DoubleElimination, &mut rng)
            .unwrap();
        let mut t = Tournament::new(
            Uuid::new_v4(),
            "Cup".into(),
            "Chess".into(),
            4,
            BracketStyle::DoubleElimination,
            participants,
            matches,
        );
        // Nothing feeds side B of the first losers match.
        assert_eq!(find(&t, Segment::Losers, -1, 1).slot_b, Slot::Bye);

        let first = find(&t, Segment::Winners, 1, 1).clone();
        let first_loser = first.slot_b.player().unwrap().to_owned();
        engine
            .record_result(&mut t, first.id, 2, 0, first.slot_a.player().unwrap())
            .unwrap();
        // Alone against a bye, the first loser walks over into the drop-in round.
        assert_eq!(
            find(&t, Segment::Losers, -2, 1).slot_a,
            Slot::Player(first_loser)
        );

        let second = find(&t, Segment::Winners, 1, 2).clone();
        let second_loser = second.slot_b.player().unwrap().to_owned();
        engine
            .record_result(&mut t, second.id, 2, 0, second.slot_a.player().unwrap())
            .unwrap();
        let drop_in = find(&t, Segment::Losers, -2, 1);
        assert_eq!(drop_in.slot_b, Slot::Player(second_loser));
        assert!(drop_in.is_ready());

        // The winners final's loser now has nowhere to go: rejected without any change.
        let before = t.clone();
        let final_match = find(&t, Segment::Winners, 2, 1).clone();
        let err = engine
            .record_result(&mut t, final_match.id, 3, 1, final_match.slot_a.player().unwrap())
            .unwrap_err();
        assert!(matches!(err, BracketError::PropagationInvariantViolation { .. }));
        assert_eq!(t, before);
    }
}
