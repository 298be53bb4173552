use rand::{Rng, seq::SliceRandom};

use super::{error::BracketError, model::Slot};

/// Smallest power of two greater than or equal to `count` (at least 2).
pub fn next_power_of_two(count: usize) -> usize {
    count.max(2).next_power_of_two()
}

/// Shuffle the entrants into bracket slots and pad the tail with byes.
///
/// The result always has `next_power_of_two(participants.len())` entries. Every entrant, generated
/// placeholder names included, occupies a real slot.
pub fn assign_slots<R>(participants: &[String], rng: &mut R) -> Result<Vec<Slot>, BracketError>
where
    R: Rng + ?Sized,
{
    let count = participants.len();
    if count < 2 {
        return Err(BracketError::InvalidRoster { count });
    }

    let mut seeded = participants.to_vec();
    seeded.shuffle(rng);

    let capacity = next_power_of_two(count);
    let mut slots = Vec::with_capacity(capacity);
    slots.extend(seeded.into_iter().map(Slot::Player));
    slots.resize(capacity, Slot::Bye);
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn names(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("P{i}")).collect()
    }

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(8), 8);
        assert_eq!(next_power_of_two(9), 16);
    }

    #[test]
    fn pads_with_byes_after_real_entrants() {
        let mut rng = StdRng::seed_from_u64(7);
        let slots = assign_slots(&names(5), &mut rng).unwrap();

        assert_eq!(slots.len(), 8);
        assert!(slots[..5].iter().all(|slot| slot.player().is_some()));
        assert!(slots[5..].iter().all(Slot::is_bye));
    }

    #[test]
    fn keeps_every_entrant_including_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let roster = vec!["Sam".to_string(), "Sam".to_string(), "Ana".to_string()];
        let slots = assign_slots(&roster, &mut rng).unwrap();

        let mut seated = slots
            .iter()
            .filter_map(|slot| slot.player().map(str::to_owned))
            .collect::<Vec<_>>();
        seated.sort();
        assert_eq!(seated, vec!["Ana", "Sam", "Sam"]);
    }

    #[test]
    fn rejects_degenerate_roster() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = assign_slots(&names(1), &mut rng).unwrap_err();
        assert_eq!(err, BracketError::InvalidRoster { count: 1 });
    }
}
