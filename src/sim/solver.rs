//! Payout distribution search
//!
//! Picks one bin per ball so the multiplier sum lands on (or as close as
//! possible to) a target, preferring batches that spread over many distinct
//! bins. Small batches are searched exhaustively over value tiers; larger
//! batches use a greedy fill, single-slot swaps and, when still inexact, a
//! bounded closest-sum table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::BinId;
use crate::consts::{DP_CELL_BUDGET, EXHAUSTIVE_BALL_LIMIT, USAGE_PENALTY};

/// Bins chosen for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResult {
    /// One bin per ball
    pub bins: Vec<BinId>,
    pub achieved_sum: u64,
    /// `achieved_sum` equals the requested target
    pub exact: bool,
}

impl DistributionResult {
    /// Number of different bins used
    pub fn distinct_count(&self) -> usize {
        let mut seen = self.bins.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

/// One distinct multiplier and every bin carrying it
#[derive(Debug, Clone)]
struct Tier {
    value: u64,
    bins: Vec<BinId>,
}

fn group_tiers(values: &[u32]) -> Vec<Tier> {
    let mut grouped: BTreeMap<u32, Vec<BinId>> = BTreeMap::new();
    for (i, &value) in values.iter().enumerate() {
        grouped.entry(value).or_default().push(BinId(i));
    }
    grouped
        .into_iter()
        .map(|(value, bins)| Tier {
            value: u64::from(value),
            bins,
        })
        .collect()
}

/// Bins for `counts[t]` balls per tier, same-value bins taken round-robin
fn materialize(tiers: &[Tier], counts: &[usize]) -> Vec<BinId> {
    tiers
        .iter()
        .zip(counts)
        .flat_map(|(tier, &count)| (0..count).map(move |k| tier.bins[k % tier.bins.len()]))
        .collect()
}

fn distinct_for(tiers: &[Tier], counts: &[usize]) -> usize {
    tiers
        .iter()
        .zip(counts)
        .map(|(tier, &count)| count.min(tier.bins.len()))
        .sum()
}

/// Choose `ball_count` bins whose multipliers sum closest to `target_sum`
///
/// Ties on the difference go to the batch using more distinct bins. Never
/// fails: an unreachable target yields the closest sum with `exact = false`.
pub fn solve_distribution(ball_count: usize, target_sum: u64, values: &[u32]) -> DistributionResult {
    if ball_count == 0 || values.is_empty() {
        if ball_count > 0 {
            log::warn!("No bin values to distribute {ball_count} balls over");
        }
        return DistributionResult {
            bins: Vec::new(),
            achieved_sum: 0,
            exact: ball_count == 0 && target_sum == 0,
        };
    }

    let tiers = group_tiers(values);
    let min = tiers[0].value;
    let max = tiers[tiers.len() - 1].value;
    let n = ball_count as u64;
    let (lowest, highest) = (min.saturating_mul(n), max.saturating_mul(n));
    if target_sum < lowest || target_sum > highest {
        log::warn!(
            "Target {target_sum} outside attainable range {lowest}..={highest} for {ball_count} balls"
        );
    }

    let bins = if ball_count <= EXHAUSTIVE_BALL_LIMIT {
        exhaustive(&tiers, ball_count, target_sum)
    } else {
        let mut bins = greedy(values, ball_count, target_sum);
        improve_by_swaps(&mut bins, values, &tiers, target_sum);
        if sum_of(&bins, values) != target_sum {
            if let Some(counts) = closest_sum_counts(&tiers, ball_count, target_sum) {
                let candidate = materialize(&tiers, &counts);
                if diff(sum_of(&candidate, values), target_sum) < diff(sum_of(&bins, values), target_sum) {
                    bins = candidate;
                }
            }
        }
        bins
    };

    let achieved_sum = sum_of(&bins, values);
    let result = DistributionResult {
        exact: achieved_sum == target_sum,
        bins,
        achieved_sum,
    };
    log::debug!(
        "Distribution for {ball_count} balls: sum {} (target {target_sum}, exact {}, {} distinct)",
        result.achieved_sum,
        result.exact,
        result.distinct_count()
    );
    result
}

fn sum_of(bins: &[BinId], values: &[u32]) -> u64 {
    bins.iter().map(|b| u64::from(values[b.index()])).sum()
}

#[inline]
fn diff(sum: u64, target: u64) -> u64 {
    sum.abs_diff(target)
}

/// Backtracking over tier multisets (tier indices non-decreasing)
fn exhaustive(tiers: &[Tier], ball_count: usize, target: u64) -> Vec<BinId> {
    struct Search<'a> {
        tiers: &'a [Tier],
        target: u64,
        counts: Vec<usize>,
        best_counts: Vec<usize>,
        best: Option<(u64, usize)>,
    }

    impl Search<'_> {
        fn run(&mut self, from: usize, left: usize, sum: u64) {
            if let Some((best_diff, _)) = self.best {
                if sum > self.target && sum - self.target > best_diff {
                    return;
                }
            }
            if left == 0 {
                let d = diff(sum, self.target);
                let distinct = distinct_for(self.tiers, &self.counts);
                let better = match self.best {
                    None => true,
                    Some((best_diff, best_distinct)) => {
                        d < best_diff || (d == best_diff && distinct > best_distinct)
                    }
                };
                if better {
                    self.best = Some((d, distinct));
                    self.best_counts.clone_from(&self.counts);
                }
                return;
            }
            for t in from..self.tiers.len() {
                self.counts[t] += 1;
                self.run(t, left - 1, sum + self.tiers[t].value);
                self.counts[t] -= 1;
            }
        }
    }

    let mut search = Search {
        tiers,
        target,
        counts: vec![0; tiers.len()],
        best_counts: vec![0; tiers.len()],
        best: None,
    };
    search.run(0, ball_count, 0);
    materialize(tiers, &search.best_counts)
}

/// Per-slot pick closest to the remaining average, penalising reused bins
fn greedy(values: &[u32], ball_count: usize, target: u64) -> Vec<BinId> {
    let mut usage = vec![0usize; values.len()];
    let mut remaining = target as f64;
    let mut bins = Vec::with_capacity(ball_count);

    for slot in 0..ball_count {
        let ideal = remaining / (ball_count - slot) as f64;
        let mut best = 0;
        let mut best_score = f64::INFINITY;
        for (i, &value) in values.iter().enumerate() {
            let score = (f64::from(value) - ideal).abs() + usage[i] as f64 * USAGE_PENALTY;
            if score < best_score {
                best = i;
                best_score = score;
            }
        }
        usage[best] += 1;
        remaining -= f64::from(values[best]);
        bins.push(BinId(best));
    }
    bins
}

/// Replace single slots while that strictly shrinks the difference
fn improve_by_swaps(bins: &mut [BinId], values: &[u32], tiers: &[Tier], target: u64) {
    let mut sum = sum_of(bins, values);
    let mut usage = vec![0usize; values.len()];
    for bin in bins.iter() {
        usage[bin.index()] += 1;
    }

    'outer: while sum != target {
        let current = diff(sum, target);
        for slot in 0..bins.len() {
            let old = u64::from(values[bins[slot].index()]);
            for tier in tiers {
                let candidate = sum - old + tier.value;
                if diff(candidate, target) >= current {
                    continue;
                }
                let Some(&bin) = tier.bins.iter().min_by_key(|b| usage[b.index()]) else {
                    continue;
                };
                usage[bins[slot].index()] -= 1;
                usage[bin.index()] += 1;
                bins[slot] = bin;
                sum = candidate;
                continue 'outer;
            }
        }
        break;
    }
}

/// Per-tier counts reaching the closest attainable sum with exactly
/// `ball_count` balls, or `None` when the table would be too large
fn closest_sum_counts(tiers: &[Tier], ball_count: usize, target: u64) -> Option<Vec<usize>> {
    const EMPTY: u32 = u32::MAX;
    const ROOT: u32 = u32::MAX - 1;

    let min = tiers[0].value;
    let max = tiers[tiers.len() - 1].value;
    let bound = (target.checked_add(max)?).max(min.checked_mul(ball_count as u64)?);
    let width = usize::try_from(bound).ok()?.checked_add(1)?;
    let cells = width.checked_mul(ball_count + 1)?;
    if cells > DP_CELL_BUDGET {
        log::debug!("Closest-sum table of {cells} cells over budget, skipping");
        return None;
    }

    // reach[k * width + s]: tier of the last ball in some k-ball batch summing to s
    let mut reach = vec![EMPTY; cells];
    reach[0] = ROOT;
    for k in 1..=ball_count {
        let (done, layer) = reach.split_at_mut(k * width);
        let previous = &done[(k - 1) * width..];
        for s in 0..width {
            for (t, tier) in tiers.iter().enumerate() {
                let v = tier.value as usize;
                if v <= s && previous[s - v] != EMPTY {
                    layer[s] = t as u32;
                    break;
                }
            }
        }
    }

    let last = &reach[ball_count * width..(ball_count + 1) * width];
    let best = (0..width)
        .filter(|&s| last[s] != EMPTY)
        .min_by_key(|&s| diff(s as u64, target))?;

    let mut counts = vec![0; tiers.len()];
    let mut s = best;
    for k in (1..=ball_count).rev() {
        let t = reach[k * width + s] as usize;
        counts[t] += 1;
        s -= tiers[t].value as usize;
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BinValueTable;
    use proptest::prelude::*;

    fn standard(bins: usize) -> Vec<u32> {
        BinValueTable::new(vec![0, 1, 2, 5, 20, 50, 100, 500, 1000]).values(bins)
    }

    fn check(result: &DistributionResult, ball_count: usize, values: &[u32]) {
        assert_eq!(result.bins.len(), ball_count);
        assert_eq!(result.achieved_sum, sum_of(&result.bins, values));
        assert!(result.bins.iter().all(|b| b.index() < values.len()));
    }

    #[test]
    fn test_three_equal_tiers_exact() {
        let values = [500, 500, 500, 0, 1];
        let result = solve_distribution(3, 1500, &values);
        check(&result, 3, &values);
        assert!(result.exact);
        assert!(result.bins.iter().all(|b| values[b.index()] == 500));
        // Same-value bins are spread round-robin
        assert_eq!(result.distinct_count(), 3);
    }

    #[test]
    fn test_standard_board_small_batch() {
        let values = standard(17);
        let result = solve_distribution(3, 1000, &values);
        check(&result, 3, &values);
        assert!(result.exact);
        assert_eq!(result.achieved_sum, 1000);
    }

    #[test]
    fn test_small_batch_prefers_distinct_bins() {
        // 2 + 2 and 1 + 3 both hit 4, but the lone 2 bin would repeat
        let values = [1, 2, 3];
        let result = solve_distribution(2, 4, &values);
        assert!(result.exact);
        assert_eq!(result.distinct_count(), 2);
        let mut picked: Vec<u32> = result.bins.iter().map(|b| values[b.index()]).collect();
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 3]);
    }

    #[test]
    fn test_unreachable_target_is_best_effort() {
        let values = standard(9);
        let high = solve_distribution(2, 5000, &values);
        check(&high, 2, &values);
        assert!(!high.exact);
        assert_eq!(high.achieved_sum, 2000);

        let low = solve_distribution(4, 0, &[3, 7, 3]);
        assert!(!low.exact);
        assert_eq!(low.achieved_sum, 12);
        assert_eq!(low.distinct_count(), 2);
    }

    #[test]
    fn test_large_batch_exact() {
        let values = standard(17);
        let result = solve_distribution(10, 1000, &values);
        check(&result, 10, &values);
        assert!(result.exact, "achieved {}", result.achieved_sum);
        assert!(result.distinct_count() > 1);
    }

    #[test]
    fn test_large_batch_needs_table() {
        // Three 10s and three 1s
        let values = [10, 1, 10, 1];
        let result = solve_distribution(6, 33, &values);
        check(&result, 6, &values);
        assert!(result.exact);
    }

    #[test]
    fn test_large_batch_out_of_range() {
        let values = [4, 8, 4];
        let result = solve_distribution(8, 1000, &values);
        check(&result, 8, &values);
        assert!(!result.exact);
        assert_eq!(result.achieved_sum, 64);
    }

    #[test]
    fn test_degenerate_inputs() {
        let none = solve_distribution(0, 100, &standard(9));
        assert!(none.bins.is_empty());
        assert!(!none.exact);

        let zero = solve_distribution(0, 0, &standard(9));
        assert!(zero.exact);

        let empty = solve_distribution(4, 100, &[]);
        assert!(empty.bins.is_empty());
        assert_eq!(empty.achieved_sum, 0);
        assert!(!empty.exact);
    }

    #[test]
    fn test_table_skipped_over_budget() {
        let tiers = group_tiers(&[1, u32::MAX]);
        assert!(closest_sum_counts(&tiers, 6, u64::from(u32::MAX) * 3).is_none());
    }

    /// Closest attainable sum by brute force over value multisets
    fn brute_force(ball_count: usize, target: u64, values: &[u32]) -> u64 {
        fn walk(values: &[u32], from: usize, left: usize, sum: u64, target: u64, best: &mut u64) {
            if left == 0 {
                if diff(sum, target) < diff(*best, target) {
                    *best = sum;
                }
                return;
            }
            for i in from..values.len() {
                walk(values, i, left - 1, sum + u64::from(values[i]), target, best);
            }
        }
        let mut best = u64::MAX;
        walk(values, 0, ball_count, 0, target, &mut best);
        best
    }

    proptest! {
        #[test]
        fn prop_solver_finds_closest_sum(
            ball_count in 1usize..=8,
            target in 0u64..600,
            values in proptest::collection::vec(0u32..120, 1..6),
        ) {
            let result = solve_distribution(ball_count, target, &values);
            prop_assert_eq!(result.bins.len(), ball_count);
            prop_assert_eq!(result.achieved_sum, sum_of(&result.bins, &values));
            let best = brute_force(ball_count, target, &values);
            prop_assert_eq!(diff(result.achieved_sum, target), diff(best, target));
            prop_assert_eq!(result.exact, best == target);
        }
    }
}
