use rand::seq::SliceRandom;
use rand::Rng;

use super::room::{Assignment, Participant};

/// Upper bound on rejection-sampling rounds before falling back to a rotation.
/// The expected number of rounds is about e, so this is never reached in practice.
const MAX_SHUFFLE_ATTEMPTS: usize = 1000;

/// Shuffle `items` until no element is left at its original index.
///
/// `same` decides whether two elements are the same identity. Fewer than two
/// items cannot be deranged, in which case an empty vector is returned.
pub fn derange<T, R, F>(items: &[T], rng: &mut R, same: F) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
    F: Fn(&T, &T) -> bool,
{
    if items.len() < 2 {
        return Vec::new();
    }

    let mut shuffled = items.to_vec();
    for attempt in 1..=MAX_SHUFFLE_ATTEMPTS {
        shuffled.shuffle(rng);
        if !has_fixed_point(items, &shuffled, &same) {
            tracing::trace!(attempt, size = items.len(), "Derangement accepted");
            return shuffled;
        }
    }

    tracing::warn!(
        size = items.len(),
        attempts = MAX_SHUFFLE_ATTEMPTS,
        "Rejection sampling exhausted, rotating instead"
    );
    rotate_by_one(items)
}

fn has_fixed_point<T, F>(original: &[T], shuffled: &[T], same: &F) -> bool
where
    F: Fn(&T, &T) -> bool,
{
    original
        .iter()
        .zip(shuffled)
        .any(|(before, after)| same(before, after))
}

/// Every element moves one slot to the left, which is a derangement for
/// any sequence of two or more distinct elements.
fn rotate_by_one<T: Clone>(items: &[T]) -> Vec<T> {
    let mut rotated = items.to_vec();
    rotated.rotate_left(1);
    rotated
}

/// Pair every participant with the participant they will gift.
///
/// The result keeps the order of `participants` on the giving side.
pub fn draw<R: Rng + ?Sized>(participants: &[Participant], rng: &mut R) -> Vec<Assignment> {
    let receivers = derange(participants, rng, |a, b| a.connection_id == b.connection_id);

    participants
        .iter()
        .cloned()
        .zip(receivers)
        .map(|(from, to)| Assignment { from, to })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::room::ConnectionId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn participants(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant {
                connection_id: ConnectionId::from(format!("conn_{}", i)),
                display_name: format!("Person {}", i),
            })
            .collect()
    }

    fn assert_is_derangement(input: &[Participant], assignments: &[Assignment]) {
        assert_eq!(assignments.len(), input.len());

        let mut receivers = HashSet::new();
        for (original, assignment) in input.iter().zip(assignments) {
            assert_eq!(assignment.from.connection_id, original.connection_id);
            assert_ne!(
                assignment.from.connection_id, assignment.to.connection_id,
                "{} was assigned to themselves",
                assignment.from.display_name
            );
            assert!(receivers.insert(assignment.to.connection_id.clone()));
        }

        let givers: HashSet<_> = input.iter().map(|p| p.connection_id.clone()).collect();
        assert_eq!(receivers, givers, "receivers must be a permutation of givers");
    }

    #[test]
    fn test_no_fixed_points_across_sizes() {
        for &n in &[2usize, 3, 5, 50, 100] {
            let input = participants(n);
            for seed in 0..200u64 {
                let mut rng = StdRng::seed_from_u64(seed * 31 + n as u64);
                let assignments = draw(&input, &mut rng);
                assert_is_derangement(&input, &assignments);
            }
        }
    }

    #[test]
    fn test_thread_rng_produces_derangements() {
        let input = participants(7);
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            assert_is_derangement(&input, &draw(&input, &mut rng));
        }
    }

    #[test]
    fn test_two_participants_always_swap() {
        let input = participants(2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let assignments = draw(&input, &mut rng);
            assert_eq!(assignments[0].to.display_name, "Person 1");
            assert_eq!(assignments[1].to.display_name, "Person 0");
        }
    }

    #[test]
    fn test_fewer_than_two_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw(&participants(0), &mut rng).is_empty());
        assert!(draw(&participants(1), &mut rng).is_empty());
    }

    #[test]
    fn test_rotate_fallback_has_no_fixed_points() {
        for n in 2..10 {
            let input: Vec<usize> = (0..n).collect();
            let rotated = rotate_by_one(&input);
            assert!(!has_fixed_point(&input, &rotated, &|a: &usize, b: &usize| a == b));
        }
    }

    #[test]
    fn test_derange_generic_items() {
        let input = vec!['a', 'b', 'c', 'd'];
        let mut rng = StdRng::seed_from_u64(99);
        let output = derange(&input, &mut rng, |a, b| a == b);
        assert_eq!(output.len(), 4);
        for (a, b) in input.iter().zip(&output) {
            assert_ne!(a, b);
        }
    }
}
