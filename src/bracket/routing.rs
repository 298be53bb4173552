//! Where winners-segment losers land in the losers segment.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{
    model::{Segment, Side},
    topology::BracketShape,
};

/// Address of one side of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Segment of the target match.
    pub segment: Segment,
    /// Round of the target match.
    pub round: i32,
    /// Number of the target match within its round.
    pub match_number: u32,
    /// Side receiving the participant.
    pub side: Side,
}

/// Strategy deciding the losers-segment slot for the loser of a winners-segment match.
///
/// Returning `None`, or a slot that is already occupied, makes the engine fall back to the first
/// open losers slot.
pub trait LoserRouting: Debug + Send + Sync {
    fn loser_destination(
        &self,
        shape: &BracketShape,
        round: u32,
        match_number: u32,
    ) -> Option<SlotRef>;
}

/// Order in which a winners round's losers are laid into their drop-in losers round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoserDropOrder {
    /// Match `m` drops into losers match `m`.
    Straight,
    /// Even winners rounds drop in reverse order, which delays rematches.
    #[default]
    Alternating,
}

/// Standard double-elimination seeding table.
///
/// Losers of winners round 1 pair up in losers round -1. The loser of winners round `r >= 2`
/// takes side B of losers round `-2(r - 1)`, whose side A is held by a losers-segment survivor.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLoserRouting {
    order: LoserDropOrder,
}

impl StandardLoserRouting {
    /// Standard table with the given drop order.
    pub fn new(order: LoserDropOrder) -> Self {
        Self { order }
    }
}

impl LoserRouting for StandardLoserRouting {
    fn loser_destination(
        &self,
        shape: &BracketShape,
        round: u32,
        match_number: u32,
    ) -> Option<SlotRef> {
        if round == 0 || round > shape.winners_rounds() {
            return None;
        }

        if round == 1 {
            shape.losers_round_size(1)?;
            return Some(SlotRef {
                segment: Segment::Losers,
                round: -1,
                match_number: match_number.div_ceil(2),
                side: Side::from_match_number(match_number),
            });
        }

        let depth = 2 * (round - 1);
        let size = shape.losers_round_size(depth)?;
        if match_number > size {
            return None;
        }

        let position = match self.order {
            LoserDropOrder::Alternating if round % 2 == 0 => size + 1 - match_number,
            _ => match_number,
        };

        Some(SlotRef {
            segment: Segment::Losers,
            round: -(depth as i32),
            match_number: position,
            side: Side::B,
        })
    }
}
