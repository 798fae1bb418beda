//! Shuffling for random mode.

use rand::Rng;

/// Shuffles `items` in place with the Fisher-Yates algorithm.
///
/// Every permutation is equally likely given a uniform `rng`.
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where R: Rng + ?Sized {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Keeps a freshly loaded batch from starting with the item shown last.
///
/// If the first element of `batch` equals `last`, it is moved to the end of
/// the batch. A batch of one element is left alone: with a single wallpaper
/// the repeat is unavoidable.
pub fn avoid_repeat<T: PartialEq>(batch: &mut [T], last: Option<&T>) {
    let Some(last) = last else {
        return;
    };

    if batch.len() > 1 && batch.first() == Some(last) {
        batch.rotate_left(1);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_handles_tiny_inputs() {
        let mut rng = StdRng::seed_from_u64(1);

        let mut empty: Vec<u32> = Vec::new();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec!["a"];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec!["a"]);
    }

    #[test]
    fn test_shuffle_first_position_is_uniform() {
        const ROUNDS: usize = 40_000;
        const ITEMS: usize = 4;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [0usize; ITEMS];

        for _ in 0..ROUNDS {
            let mut items: Vec<usize> = (0..ITEMS).collect();
            shuffle(&mut items, &mut rng);
            counts[items[0]] += 1;
        }

        // Each item should lead about a quarter of the time
        let expected = ROUNDS / ITEMS;
        for (item, count) in counts.iter().enumerate() {
            let deviation = count.abs_diff(expected);
            assert!(
                deviation < expected / 10,
                "item {item} led {count} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn test_avoid_repeat_rotates_collision_to_end() {
        let mut batch = vec!["c", "a", "b"];
        avoid_repeat(&mut batch, Some(&"c"));
        assert_eq!(batch, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_avoid_repeat_leaves_other_batches_alone() {
        let mut batch = vec!["a", "b", "c"];
        avoid_repeat(&mut batch, Some(&"c"));
        assert_eq!(batch, vec!["a", "b", "c"]);

        avoid_repeat(&mut batch, None);
        assert_eq!(batch, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_avoid_repeat_single_item_repeats() {
        let mut batch = vec!["a"];
        avoid_repeat(&mut batch, Some(&"a"));
        assert_eq!(batch, vec!["a"]);
    }
}
