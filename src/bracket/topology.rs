//! Layout of every match of a bracket before any result is known.

use super::{
    error::BracketError,
    model::{BracketStyle, Match, Segment, Side, Slot},
    routing::SlotRef,
};

/// Round structure of a bracket, derived from its slot count and style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketShape {
    slot_count: u32,
    winners_rounds: u32,
    /// Size of losers round `-(i + 1)` at index `i`. Empty for single elimination.
    losers_sizes: Vec<u32>,
}

impl BracketShape {
    /// Shape for `slot_count` slots, which must be a power of two of at least 2.
    pub fn new(slot_count: u32, style: BracketStyle) -> Result<Self, BracketError> {
        if slot_count < 2 || !slot_count.is_power_of_two() {
            return Err(BracketError::InvalidRoster {
                count: slot_count as usize,
            });
        }

        let losers_sizes = match style {
            BracketStyle::SingleElimination => Vec::new(),
            BracketStyle::DoubleElimination => losers_round_sizes(slot_count),
            BracketStyle::RoundRobin => return Err(BracketError::UnsupportedStyle { style }),
        };

        Ok(Self {
            slot_count,
            winners_rounds: slot_count.trailing_zeros(),
            losers_sizes,
        })
    }

    /// Recover the shape of an already generated bracket.
    pub fn from_matches(matches: &[Match], style: BracketStyle) -> Result<Self, BracketError> {
        let first_round = matches
            .iter()
            .filter(|candidate| candidate.segment == Segment::Winners && candidate.round == 1)
            .count() as u32;
        Self::new(first_round * 2, style).map_err(|_| {
            BracketError::violation(format!(
                "stored bracket has {first_round} opening matches, which is not a valid layout"
            ))
        })
    }

    /// Seeded slots, a power of two.
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Rounds in the winners segment.
    pub fn winners_rounds(&self) -> u32 {
        self.winners_rounds
    }

    /// Rounds in the losers segment; zero for single elimination.
    pub fn losers_rounds(&self) -> u32 {
        self.losers_sizes.len() as u32
    }

    /// Whether the bracket has a losers segment at all.
    pub fn has_losers_segment(&self) -> bool {
        !self.losers_sizes.is_empty()
    }

    /// Number of matches in winners round `round` (1-based).
    pub fn winners_round_size(&self, round: u32) -> Option<u32> {
        (1..=self.winners_rounds)
            .contains(&round)
            .then(|| self.slot_count >> round)
    }

    /// Number of matches in losers round `-depth` (`depth` is 1-based).
    pub fn losers_round_size(&self, depth: u32) -> Option<u32> {
        let index = depth.checked_sub(1)? as usize;
        self.losers_sizes.get(index).copied()
    }

    /// Round number carried by the grand-finals match.
    pub fn grand_finals_round(&self) -> i32 {
        -(self.losers_rounds() as i32) - 1
    }

    /// Slot that receives the winner of the match at `(segment, round, match_number)`.
    ///
    /// `None` means the winner is the champion.
    pub fn winner_destination(
        &self,
        segment: Segment,
        round: i32,
        match_number: u32,
    ) -> Option<SlotRef> {
        match segment {
            Segment::Winners if (round as u32) < self.winners_rounds => Some(SlotRef {
                segment: Segment::Winners,
                round: round + 1,
                match_number: match_number.div_ceil(2),
                side: Side::from_match_number(match_number),
            }),
            Segment::Winners if self.has_losers_segment() => Some(self.grand_finals(Side::A)),
            Segment::Winners => None,
            Segment::Losers => {
                let depth = round.unsigned_abs();
                if depth >= self.losers_rounds() {
                    return Some(self.grand_finals(Side::B));
                }

                let current = self.losers_round_size(depth)?;
                let next = self.losers_round_size(depth + 1)?;
                let slot = if next == current {
                    SlotRef {
                        segment: Segment::Losers,
                        round: round - 1,
                        match_number,
                        side: Side::A,
                    }
                } else {
                    SlotRef {
                        segment: Segment::Losers,
                        round: round - 1,
                        match_number: match_number.div_ceil(2),
                        side: Side::from_match_number(match_number),
                    }
                };
                Some(slot)
            }
            Segment::GrandFinals => None,
        }
    }

    fn grand_finals(&self, side: Side) -> SlotRef {
        SlotRef {
            segment: Segment::GrandFinals,
            round: self.grand_finals_round(),
            match_number: 1,
            side,
        }
    }
}

/// Losers rounds start at a quarter of the slot count (at least one match) and keep each size
/// for two consecutive rounds before halving.
fn losers_round_sizes(slot_count: u32) -> Vec<u32> {
    let mut sizes = Vec::new();
    let mut size = (slot_count / 4).max(1);
    while size > 0 {
        sizes.push(size);
        sizes.push(size);
        size /= 2;
    }
    sizes
}

/// Emit every match of the bracket described by `shape`, seating `slots` in round 1.
pub fn layout(shape: &BracketShape, slots: Vec<Slot>) -> Vec<Match> {
    let mut matches = winners_segment(shape, slots);

    if shape.has_losers_segment() {
        for depth in 1..=shape.losers_rounds() {
            let size = shape.losers_round_size(depth).unwrap_or_default();
            let round = -(depth as i32);
            matches.extend(
                (1..=size).map(|number| {
                    Match::new(Segment::Losers, round, number, Slot::Open, Slot::Open)
                }),
            );
        }

        matches.push(Match::new(
            Segment::GrandFinals,
            shape.grand_finals_round(),
            1,
            Slot::Open,
            Slot::Open,
        ));
    }

    matches
}

fn winners_segment(shape: &BracketShape, slots: Vec<Slot>) -> Vec<Match> {
    let mut matches = Vec::with_capacity(shape.slot_count() as usize);

    let mut seats = slots.into_iter();
    let mut number = 1;
    while let (Some(slot_a), Some(slot_b)) = (seats.next(), seats.next()) {
        matches.push(Match::new(Segment::Winners, 1, number, slot_a, slot_b));
        number += 1;
    }

    for round in 2..=shape.winners_rounds() {
        let size = shape.winners_round_size(round).unwrap_or_default();
        matches.extend((1..=size).map(|number| {
            Match::new(
                Segment::Winners,
                round as i32,
                number,
                Slot::Open,
                Slot::Open,
            )
        }));
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(count: u32) -> Vec<Slot> {
        (1..=count).map(|i| Slot::Player(format!("P{i}"))).collect()
    }

    fn count(matches: &[Match], segment: Segment, round: i32) -> usize {
        matches
            .iter()
            .filter(|candidate| candidate.segment == segment && candidate.round == round)
            .count()
    }

    #[test]
    fn losers_sizes_repeat_before_halving() {
        assert_eq!(losers_round_sizes(2), vec![1, 1]);
        assert_eq!(losers_round_sizes(4), vec![1, 1]);
        assert_eq!(losers_round_sizes(8), vec![2, 2, 1, 1]);
        assert_eq!(losers_round_sizes(16), vec![4, 4, 2, 2, 1, 1]);
    }

    #[test]
    fn single_elimination_of_eight() {
        let shape = BracketShape::new(8, BracketStyle::SingleElimination).unwrap();
        let matches = layout(&shape, players(8));

        assert_eq!(matches.len(), 7);
        assert_eq!(count(&matches, Segment::Winners, 1), 4);
        assert_eq!(count(&matches, Segment::Winners, 2), 2);
        assert_eq!(count(&matches, Segment::Winners, 3), 1);

        let numbers = matches
            .iter()
            .filter(|candidate| candidate.round == 2)
            .map(|candidate| candidate.match_number)
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn adjacent_slots_share_a_match() {
        let shape = BracketShape::new(4, BracketStyle::SingleElimination).unwrap();
        let matches = layout(&shape, players(4));

        assert_eq!(matches[0].slot_a, Slot::Player("P1".into()));
        assert_eq!(matches[0].slot_b, Slot::Player("P2".into()));
        assert_eq!(matches[1].slot_a, Slot::Player("P3".into()));
        assert_eq!(matches[2].slot_a, Slot::Open);
        assert_eq!(matches[2].slot_b, Slot::Open);
    }

    #[test]
    fn double_elimination_of_eight() {
        let shape = BracketShape::new(8, BracketStyle::DoubleElimination).unwrap();
        let matches = layout(&shape, players(8));

        assert_eq!(matches.len(), 7 + 6 + 1);
        assert_eq!(count(&matches, Segment::Losers, -1), 2);
        assert_eq!(count(&matches, Segment::Losers, -2), 2);
        assert_eq!(count(&matches, Segment::Losers, -3), 1);
        assert_eq!(count(&matches, Segment::Losers, -4), 1);
        assert_eq!(count(&matches, Segment::GrandFinals, -5), 1);
    }

    #[test]
    fn winner_destinations_follow_the_tree() {
        let shape = BracketShape::new(8, BracketStyle::DoubleElimination).unwrap();

        let next = shape.winner_destination(Segment::Winners, 1, 3).unwrap();
        assert_eq!((next.round, next.match_number, next.side), (2, 2, Side::A));

        let final_winner = shape.winner_destination(Segment::Winners, 3, 1).unwrap();
        assert_eq!(final_winner.segment, Segment::GrandFinals);
        assert_eq!(final_winner.side, Side::A);

        // Losers round -1 feeds the drop-in round -2 position for position.
        let drop_in = shape.winner_destination(Segment::Losers, -1, 2).unwrap();
        assert_eq!((drop_in.round, drop_in.match_number, drop_in.side), (-2, 2, Side::A));

        let halving = shape.winner_destination(Segment::Losers, -2, 2).unwrap();
        assert_eq!((halving.round, halving.match_number, halving.side), (-3, 1, Side::B));

        let losers_final = shape.winner_destination(Segment::Losers, -4, 1).unwrap();
        assert_eq!(losers_final.segment, Segment::GrandFinals);
        assert_eq!(losers_final.side, Side::B);

        assert!(shape.winner_destination(Segment::GrandFinals, -5, 1).is_none());
    }

    #[test]
    fn single_elimination_final_crowns_champion() {
        let shape = BracketShape::new(4, BracketStyle::SingleElimination).unwrap();
        assert!(shape.winner_destination(Segment::Winners, 2, 1).is_none());
    }

    #[test]
    fn round_robin_has_no_shape() {
        let err = BracketShape::new(4, BracketStyle::RoundRobin).unwrap_err();
        assert!(matches!(err, BracketError::UnsupportedStyle { .. }));
    }
}
