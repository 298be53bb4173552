//! Recording results and routing outcomes into downstream matches.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    error::BracketError,
    model::{Match, MatchState, Segment, Side, Slot},
    routing::{LoserRouting, SlotRef},
    topology::BracketShape,
};

/// Explicit lookups into the match arena.
struct BracketIndex {
    by_id: HashMap<Uuid, usize>,
    by_position: HashMap<(Segment, i32, u32), usize>,
}

impl BracketIndex {
    fn new(matches: &[Match]) -> Self {
        let mut by_id = HashMap::with_capacity(matches.len());
        let mut by_position = HashMap::with_capacity(matches.len());
        for (position, item) in matches.iter().enumerate() {
            by_id.insert(item.id, position);
            by_position.insert((item.segment, item.round, item.match_number), position);
        }
        Self { by_id, by_position }
    }

    fn locate(&self, slot: &SlotRef) -> Option<usize> {
        self.by_position
            .get(&(slot.segment, slot.round, slot.match_number))
            .copied()
    }
}

/// Worklist-driven propagation of outcomes through one bracket.
struct Propagation<'a> {
    routing: &'a dyn LoserRouting,
    shape: &'a BracketShape,
    index: BracketIndex,
    queue: VecDeque<usize>,
}

impl<'a> Propagation<'a> {
    fn new(routing: &'a dyn LoserRouting, shape: &'a BracketShape, matches: &[Match]) -> Self {
        Self {
            routing,
            shape,
            index: BracketIndex::new(matches),
            queue: VecDeque::new(),
        }
    }

    /// Mark slots nothing routes into as byes, then resolve every walkover and void match.
    fn settle_new_bracket(&mut self, matches: &mut [Match]) -> Result<(), BracketError> {
        let fed = self.fed_slots(matches);
        for item in matches.iter_mut() {
            if item.segment == Segment::Winners {
                continue;
            }
            for side in [Side::A, Side::B] {
                let slot = SlotRef {
                    segment: item.segment,
                    round: item.round,
                    match_number: item.match_number,
                    side,
                };
                if !fed.contains(&slot) && item.slot(side).is_open() {
                    *item.slot_mut(side) = Slot::Bye;
                }
            }
        }

        self.queue
            .extend((0..matches.len()).filter(|&position| matches[position].is_filled()));
        self.drain(matches)
    }

    fn fed_slots(&self, matches: &[Match]) -> HashSet<SlotRef> {
        let mut fed = HashSet::new();
        for item in matches {
            fed.extend(self.winner_destination(item));
            fed.extend(self.loser_destination(item));
        }
        fed
    }

    /// Route the outcome of the completed or void match at `position` and everything it unlocks.
    fn forward_all(&mut self, matches: &mut [Match], position: usize) -> Result<(), BracketError> {
        self.forward(matches, position)?;
        self.drain(matches)
    }

    fn drain(&mut self, matches: &mut [Match]) -> Result<(), BracketError> {
        while let Some(position) = self.queue.pop_front() {
            self.settle(matches, position)?;
        }
        Ok(())
    }

    /// Resolve a match whose two slots have just become known.
    fn settle(&mut self, matches: &mut [Match], position: usize) -> Result<(), BracketError> {
        let item = &mut matches[position];
        if item.state == MatchState::Completed {
            return Ok(());
        }

        let present = match (&item.slot_a, &item.slot_b) {
            (Slot::Player(_), Slot::Player(_)) => {
                debug!(
                    match_id = %item.id,
                    segment = ?item.segment,
                    round = item.round,
                    match_number = item.match_number,
                    "match ready to be played"
                );
                return Ok(());
            }
            (Slot::Player(name), Slot::Bye) => Some((name.clone(), Side::A)),
            (Slot::Bye, Slot::Player(name)) => Some((name.clone(), Side::B)),
            (Slot::Bye, Slot::Bye) => None,
            _ => return Ok(()),
        };

        match present {
            Some((name, side)) => {
                let (score_a, score_b) = match side {
                    Side::A => (1, 0),
                    Side::B => (0, 1),
                };
                item.score_a = Some(score_a);
                item.score_b = Some(score_b);
                item.winner = Some(name);
                item.state = MatchState::Completed;
                debug!(match_id = %item.id, winner = ?item.winner, "bye resolved");
            }
            None => debug!(match_id = %item.id, "match voided by byes on both sides"),
        }

        self.forward(matches, position)
    }

    fn forward(&mut self, matches: &mut [Match], position: usize) -> Result<(), BracketError> {
        let item = &matches[position];
        let (winner, loser) = match (&item.winner, item.state) {
            (Some(name), MatchState::Completed) => {
                let winner_side = item.side_of(name).ok_or_else(|| {
                    BracketError::violation(format!(
                        "winner `{name}` of match `{}` is not seated in it",
                        item.id
                    ))
                })?;
                (
                    Slot::Player(name.clone()),
                    item.slot(winner_side.opposite()).clone(),
                )
            }
            _ if item.is_void() => (Slot::Bye, Slot::Bye),
            _ => {
                return Err(BracketError::violation(format!(
                    "match `{}` has no outcome to forward",
                    item.id
                )));
            }
        };

        let source = item.id;
        let winner_target = self.winner_destination(item);
        let loser_target = self.loser_destination(item);
        let needs_loser_slot = item.segment == Segment::Winners && self.shape.has_losers_segment();

        match winner_target {
            Some(target) => self.deliver(matches, source, target, winner)?,
            None => {
                if let Slot::Player(name) = &winner {
                    info!(match_id = %source, champion = %name, "bracket champion decided");
                }
            }
        }

        if needs_loser_slot {
            self.deliver_loser(matches, source, loser_target, loser)?;
        }

        Ok(())
    }

    fn winner_destination(&self, item: &Match) -> Option<SlotRef> {
        self.shape
            .winner_destination(item.segment, item.round, item.match_number)
    }

    fn loser_destination(&self, item: &Match) -> Option<SlotRef> {
        if item.segment != Segment::Winners || !self.shape.has_losers_segment() {
            return None;
        }
        self.routing
            .loser_destination(self.shape, item.round as u32, item.match_number)
    }

    fn deliver(
        &mut self,
        matches: &mut [Match],
        source: Uuid,
        target: SlotRef,
        value: Slot,
    ) -> Result<(), BracketError> {
        let position = self.index.locate(&target).ok_or_else(|| {
            BracketError::violation(format!(
                "match `{source}` routes into {target:?}, which does not exist"
            ))
        })?;

        if !matches[position].slot(target.side).is_open() {
            return Err(BracketError::violation(format!(
                "match `{source}` routes into {target:?}, which is already occupied"
            )));
        }

        self.place(matches, position, target.side, value);
        Ok(())
    }

    fn deliver_loser(
        &mut self,
        matches: &mut [Match],
        source: Uuid,
        target: Option<SlotRef>,
        value: Slot,
    ) -> Result<(), BracketError> {
        let exact = target.and_then(|target| {
            self.index
                .locate(&target)
                .filter(|&position| matches[position].slot(target.side).is_open())
                .map(|position| (position, target.side))
        });

        let (position, side) = match exact {
            Some(found) => found,
            None => {
                let fallback = first_open_losers_slot(matches).ok_or_else(|| {
                    BracketError::violation(format!(
                        "no open losers slot left for the loser of match `{source}`"
                    ))
                })?;
                warn!(
                    match_id = %source,
                    requested = ?target,
                    fallback_match = %matches[fallback.0].id,
                    "loser routed to first open losers slot"
                );
                fallback
            }
        };

        self.place(matches, position, side, value);
        Ok(())
    }

    fn place(&mut self, matches: &mut [Match], position: usize, side: Side, value: Slot) {
        let item = &mut matches[position];
        debug!(
            match_id = %item.id,
            side = ?side,
            slot = ?value,
            "slot filled"
        );
        *item.slot_mut(side) = value;
        if item.is_filled() {
            self.queue.push_back(position);
        }
    }
}

fn first_open_losers_slot(matches: &[Match]) -> Option<(usize, Side)> {
    matches
        .iter()
        .enumerate()
        .filter(|(_, item)| item.segment == Segment::Losers)
        .find_map(|(position, item)| {
            [Side::A, Side::B]
                .into_iter()
                .find(|&side| item.slot(side).is_open())
                .map(|side| (position, side))
        })
}

/// Resolve byes in a freshly laid out bracket.
pub(crate) fn settle_new_bracket(
    routing: &dyn LoserRouting,
    shape: &BracketShape,
    matches: &mut [Match],
) -> Result<(), BracketError> {
    Propagation::new(routing, shape, matches).settle_new_bracket(matches)
}

/// Validate and apply a final result on `matches`, propagating it downstream.
///
/// `matches` must be a staging copy: on error it may be partially updated.
pub(crate) fn apply_result(
    routing: &dyn LoserRouting,
    shape: &BracketShape,
    matches: &mut [Match],
    match_id: Uuid,
    score_a: u32,
    score_b: u32,
    winner: &str,
) -> Result<(), BracketError> {
    let mut propagation = Propagation::new(routing, shape, matches);
    let position = reportable(&propagation.index, matches, match_id)?;

    if score_a == score_b {
        return Err(BracketError::TiedScore {
            id: match_id,
            score: score_a,
        });
    }

    let item = &mut matches[position];
    if item.side_of(winner).is_none() {
        return Err(BracketError::InvalidWinner {
            id: match_id,
            winner: winner.to_owned(),
        });
    }

    item.score_a = Some(score_a);
    item.score_b = Some(score_b);
    item.winner = Some(winner.to_owned());
    item.state = MatchState::Completed;

    propagation.forward_all(matches, position)
}

/// Store interim scores and mark the match live.
pub(crate) fn apply_progress(
    matches: &mut [Match],
    match_id: Uuid,
    score_a: u32,
    score_b: u32,
) -> Result<(), BracketError> {
    let index = BracketIndex::new(matches);
    let position = reportable(&index, matches, match_id)?;

    let item = &mut matches[position];
    item.score_a = Some(score_a);
    item.score_b = Some(score_b);
    item.state = MatchState::Live;
    Ok(())
}

fn reportable(
    index: &BracketIndex,
    matches: &[Match],
    match_id: Uuid,
) -> Result<usize, BracketError> {
    let position = *index
        .by_id
        .get(&match_id)
        .ok_or(BracketError::MatchNotFound { id: match_id })?;

    let item = &matches[position];
    if item.state == MatchState::Completed {
        return Err(BracketError::MatchAlreadyCompleted { id: match_id });
    }
    if !item.is_ready() {
        return Err(BracketError::UndeterminedMatch { id: match_id });
    }
    Ok(position)
}
