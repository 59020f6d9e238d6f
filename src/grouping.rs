use std::hash::Hash;

use ahash::AHashSet;

/// Merges overlapping groups into the coarsest partition in which any two groups that
/// share an element end up in the same part.
///
/// The merge is transitively closed: if `A` meets `B` and `B` meets `C`, all three are merged
/// even when `A` and `C` are disjoint. Each returned group is sorted ascending without
/// duplicates, and groups are returned in the order of their first representative in the input.
/// Empty input groups carry no element and are dropped.
///
/// ```
/// # use tenet_ir::grouping::merge_overlapping;
/// let merged = merge_overlapping([vec![1, 2], vec![2, 3], vec![4, 5]]);
/// assert_eq!(merged, vec![vec![1, 2, 3], vec![4, 5]]);
/// ```
pub fn merge_overlapping<T, G, I>(groups: I) -> Vec<Vec<T>>
where
    T: Ord + Hash + Copy,
    G: IntoIterator<Item = T>,
    I: IntoIterator<Item = G>,
{
    let mut remaining: Vec<AHashSet<T>> = groups
        .into_iter()
        .map(|g| g.into_iter().collect::<AHashSet<_>>())
        .filter(|g| !g.is_empty())
        .collect();
    remaining.reverse();

    let mut merged = vec![];
    while let Some(mut union) = remaining.pop() {
        // an absorbed group can intersect groups skipped earlier, so scan again until stable
        loop {
            let before = remaining.len();
            remaining.retain(|g| {
                if g.is_disjoint(&union) {
                    true
                } else {
                    union.extend(g.iter().copied());
                    false
                }
            });
            if remaining.len() == before {
                break;
            }
        }

        let mut group: Vec<T> = union.into_iter().collect();
        group.sort_unstable();
        merged.push(group);
    }

    merged
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro64Star;

    use super::*;

    #[test]
    fn chain_merges_transitively() {
        let merged = merge_overlapping([vec![1, 2], vec![2, 3], vec![4, 5]]);
        assert_eq!(merged, vec![vec![1, 2, 3], vec![4, 5]]);

        // 1-5 only meets 3-4 through the late group 5-3
        let merged = merge_overlapping([vec![1, 5], vec![3, 4], vec![7], vec![5, 3]]);
        assert_eq!(merged, vec![vec![1, 3, 4, 5], vec![7]]);
    }

    #[test]
    fn rescans_after_absorbing() {
        // 2-3 only meets the running union once 1-2 has been absorbed
        let merged = merge_overlapping([vec![0, 1], vec![1, 2], vec![2, 3], vec![9]]);
        assert_eq!(merged, vec![vec![0, 1, 2, 3], vec![9]]);
    }

    #[test]
    fn trivial_inputs() {
        let empty: Vec<Vec<usize>> = vec![];
        assert!(merge_overlapping(empty).is_empty());
        assert_eq!(merge_overlapping([vec![4, 1, 3, 1]]), vec![vec![1, 3, 4]]);
        assert_eq!(
            merge_overlapping([vec![], vec![2], vec![]]),
            vec![vec![2usize]]
        );
    }

    #[test]
    fn first_representative_order() {
        let merged = merge_overlapping([vec![8, 9], vec![1, 2], vec![9, 0]]);
        assert_eq!(merged, vec![vec![0, 8, 9], vec![1, 2]]);
    }

    #[test]
    fn random_partitions_are_disjoint_and_stable() {
        let mut rng = Xoroshiro64Star::seed_from_u64(48);

        for _ in 0..200 {
            let ngroups = rng.random_range(0..8);
            let groups: Vec<Vec<u8>> = (0..ngroups)
                .map(|_| {
                    let len = rng.random_range(1..4);
                    (0..len).map(|_| rng.random_range(0..16)).collect()
                })
                .collect();

            let merged = merge_overlapping(groups.clone());

            for (i, a) in merged.iter().enumerate() {
                assert!(a.windows(2).all(|w| w[0] < w[1]), "{a:?} not sorted");
                for b in &merged[i + 1..] {
                    assert!(a.iter().all(|x| !b.contains(x)), "{a:?} meets {b:?}");
                }
            }

            for g in &groups {
                let hits = merged
                    .iter()
                    .filter(|m| g.iter().any(|x| m.contains(x)))
                    .count();
                assert_eq!(hits, 1, "{g:?} split over {merged:?}");
            }

            assert_eq!(merge_overlapping(merged.clone()), merged);
        }
    }
}
