//! Payout multiplier per bin
//!
//! Values are symmetric about the center: the center bin (or center pair)
//! gets the smallest tier and each step outward takes the next tier. Bins
//! past the end of the tier list repeat the largest tier, and the rim bins
//! always carry the largest tier so the extreme payouts sit at the edges.

use serde::{Deserialize, Serialize};

use crate::consts::FALLBACK_CURVE_K;

/// Tier list used to fill a board's bins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinValueTable {
    /// Payout tiers, smallest first
    pub tiers: Vec<u32>,
}

impl BinValueTable {
    pub fn new(tiers: Vec<u32>) -> Self {
        Self { tiers }
    }

    /// Multipliers for `bin_count` bins (pure in `(bin_count, tiers)`)
    pub fn values(&self, bin_count: usize) -> Vec<u32> {
        if self.tiers.is_empty() {
            return (0..bin_count)
                .map(|i| fallback_multiplier(i, bin_count))
                .collect();
        }

        let rim = center_distance(0, bin_count);
        let largest = self.tiers[self.tiers.len() - 1];
        (0..bin_count)
            .map(|i| {
                let distance = center_distance(i, bin_count);
                if distance > 0 && distance == rim {
                    largest
                } else {
                    self.tiers[distance.min(self.tiers.len() - 1)]
                }
            })
            .collect()
    }
}

/// Steps between bin `index` and the center bin (or nearest of the center pair)
fn center_distance(index: usize, bin_count: usize) -> usize {
    let half = bin_count / 2;
    if bin_count % 2 == 1 {
        index.abs_diff(half)
    } else if index < half {
        half - 1 - index
    } else {
        index - half
    }
}

/// Closed-form curve used when no tiers are configured: `max(1, 1 + floor(K * d^2))`
/// with `d` the distance from the center bin (or center pair) normalized to [0, 1]
pub fn fallback_multiplier(index: usize, bin_count: usize) -> u32 {
    let rim = center_distance(0, bin_count);
    if rim == 0 {
        return 1;
    }
    let d = center_distance(index, bin_count) as f32 / rim as f32;
    (1.0 + (FALLBACK_CURVE_K * d * d).floor()).max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn standard() -> BinValueTable {
        BinValueTable::new(vec![0, 1, 2, 5, 20, 50, 100, 500, 1000])
    }

    #[test]
    fn test_nine_bins_rim_gets_largest_tier() {
        let values = standard().values(9);
        assert_eq!(values, vec![1000, 5, 2, 1, 0, 1, 2, 5, 1000]);
        assert_eq!(values[4], 0);
    }

    #[test]
    fn test_seventeen_bins_uses_every_tier() {
        let values = standard().values(17);
        assert_eq!(
            values,
            vec![1000, 500, 100, 50, 20, 5, 2, 1, 0, 1, 2, 5, 20, 50, 100, 500, 1000]
        );
    }

    #[test]
    fn test_even_count_has_center_pair() {
        let values = standard().values(6);
        assert_eq!(values, vec![1000, 1, 0, 0, 1, 1000]);
    }

    #[test]
    fn test_exhausted_tiers_repeat_largest() {
        let table = BinValueTable::new(vec![1, 3, 9]);
        let values = table.values(11);
        assert_eq!(values, vec![9, 9, 9, 9, 3, 1, 3, 9, 9, 9, 9]);
    }

    #[test]
    fn test_tiny_boards() {
        assert!(standard().values(0).is_empty());
        assert_eq!(standard().values(1), vec![0]);
        assert_eq!(standard().values(2), vec![0, 0]);
        assert_eq!(standard().values(3), vec![1000, 0, 1000]);
    }

    #[test]
    fn test_fallback_curve() {
        let table = BinValueTable::default();
        let values = table.values(9);
        // d = |i - 4| / 4 -> 1 + floor(15 d^2)
        assert_eq!(values, vec![16, 9, 4, 1, 1, 1, 4, 9, 16]);
        assert_eq!(fallback_multiplier(0, 1), 1);
        assert_eq!(BinValueTable::default().values(4), vec![16, 1, 1, 16]);
    }

    #[test]
    fn test_values_are_idempotent() {
        let table = standard();
        assert_eq!(table.values(13), table.values(13));
        assert_eq!(BinValueTable::default().values(8), BinValueTable::default().values(8));
    }

    proptest! {
        #[test]
        fn prop_values_symmetric(n in 1usize..64, tiers in proptest::collection::vec(0u32..2000, 0..12)) {
            let mut tiers = tiers;
            tiers.sort_unstable();
            let values = BinValueTable::new(tiers).values(n);
            prop_assert_eq!(values.len(), n);
            for i in 0..n {
                prop_assert_eq!(values[i], values[n - 1 - i]);
            }
        }

        #[test]
        fn prop_center_is_smallest_tier(n in 1usize..64, tiers in proptest::collection::vec(0u32..2000, 1..12)) {
            let mut tiers = tiers;
            tiers.sort_unstable();
            let values = BinValueTable::new(tiers.clone()).values(n);
            prop_assert_eq!(values[n / 2], tiers[0]);
            prop_assert_eq!(*values.iter().min().unwrap(), tiers[0]);
        }

        #[test]
        fn prop_fallback_center_is_one(n in 1usize..64) {
            let values = BinValueTable::default().values(n);
            prop_assert_eq!(values[n / 2], 1);
        }
    }
}
