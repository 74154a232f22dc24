use crate::maze::manhattan;
use crate::rng::RandomSource;
use crate::types::Vec2;

pub(super) fn biased_index(
    candidates: &[Vec2],
    reference: Vec2,
    rng: &mut impl RandomSource,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let total: u64 = candidates
        .iter()
        .map(|cell| u64::from(manhattan(*cell, reference)) + 1)
        .sum();
    let mut roll = rng.next_f64() * total as f64;
    for (idx, cell) in candidates.iter().enumerate() {
        let weight = (u64::from(manhattan(*cell, reference)) + 1) as f64;
        if roll < weight {
            return Some(idx);
        }
        roll -= weight;
    }
    Some(candidates.len() - 1)
}

pub(super) fn pick_cell_index(
    candidates: &[Vec2],
    reference: Vec2,
    biased: bool,
    rng: &mut impl RandomSource,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    if biased {
        biased_index(candidates, reference, rng)
    } else {
        Some(rng.pick_index(candidates.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Rng, SequenceRng};

    #[test]
    fn weights_grow_with_distance() {
        // weights 1, 2, 3 -> total 6
        let cells = [Vec2::new(0, 0), Vec2::new(1, 0), Vec2::new(2, 0)];
        let origin = Vec2::new(0, 0);
        let mut rng = SequenceRng::new(vec![0.1, 0.2, 0.45, 0.9]);
        assert_eq!(biased_index(&cells, origin, &mut rng), Some(0));
        assert_eq!(biased_index(&cells, origin, &mut rng), Some(1));
        assert_eq!(biased_index(&cells, origin, &mut rng), Some(1));
        assert_eq!(biased_index(&cells, origin, &mut rng), Some(2));
    }

    #[test]
    fn far_cells_win_more_often() {
        let cells = [Vec2::new(0, 0), Vec2::new(6, 6)];
        let mut rng = Rng::new(3);
        let far = (0..2_000)
            .filter(|_| biased_index(&cells, Vec2::new(0, 0), &mut rng) == Some(1))
            .count();
        assert!(far > 1_600, "far cell picked {far} times");
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let mut rng = Rng::new(1);
        assert_eq!(pick_cell_index(&[], Vec2::new(0, 0), true, &mut rng), None);
        assert_eq!(pick_cell_index(&[], Vec2::new(0, 0), false, &mut rng), None);
    }
}
