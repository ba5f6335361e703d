//! Ranking engine.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ranked group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Group label.
    pub label: String,
    /// Ranked value.
    pub value: Decimal,
    /// 1-based position in the ranking.
    pub rank: u32,
}

/// Orders grouped values. Ties always keep first-seen order.
pub struct RankingEngine;

impl RankingEngine {
    /// Counts occurrences of each key, in first-seen order.
    pub fn tally<I>(keys: I) -> Vec<(String, Decimal)>
    where
        I: IntoIterator<Item = String>,
    {
        Self::accumulate(keys.into_iter().map(|key| (key, Decimal::ONE)))
    }

    /// Sums values per key, in first-seen order. A value that would overflow
    /// its group total is skipped.
    pub fn accumulate<I>(pairs: I) -> Vec<(String, Decimal)>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut groups: Vec<(String, Decimal)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (key, value) in pairs {
            if let Some(&position) = index.get(&key) {
                let total = &mut groups[position].1;
                *total = total.checked_add(value).unwrap_or(*total);
            } else {
                index.insert(key.clone(), groups.len());
                groups.push((key, value));
            }
        }
        groups
    }

    /// The `n` largest groups, descending.
    #[must_use]
    pub fn top_n(groups: &[(String, Decimal)], n: usize) -> Vec<RankingEntry> {
        Self::ranked(groups, n, |a, b| b.cmp(a))
    }

    /// The `n` smallest groups, ascending.
    ///
    /// Sorted on its own rather than read off the tail of [`Self::top_n`],
    /// so short lists and ties come out the same way as the top ranking.
    #[must_use]
    pub fn bottom_n(groups: &[(String, Decimal)], n: usize) -> Vec<RankingEntry> {
        Self::ranked(groups, n, Decimal::cmp)
    }

    fn ranked<F>(groups: &[(String, Decimal)], n: usize, order: F) -> Vec<RankingEntry>
    where
        F: Fn(&Decimal, &Decimal) -> Ordering,
    {
        let mut sorted: Vec<&(String, Decimal)> = groups.iter().collect();
        sorted.sort_by(|a, b| order(&a.1, &b.1));

        sorted
            .into_iter()
            .take(n)
            .zip(1..)
            .map(|((label, value), rank)| RankingEntry {
                label: label.clone(),
                value: *value,
                rank,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn groups(pairs: &[(&str, i64)]) -> Vec<(String, Decimal)> {
        pairs
            .iter()
            .map(|(label, value)| ((*label).to_string(), Decimal::from(*value)))
            .collect()
    }

    fn labels(entries: &[RankingEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    #[test]
    fn test_bottom_and_top_example() {
        let input = groups(&[("A", 5), ("B", 1), ("C", 3)]);

        let bottom = RankingEngine::bottom_n(&input, 2);
        assert_eq!(labels(&bottom), ["B", "C"]);
        assert_eq!(bottom[0].value, dec!(1));
        assert_eq!(bottom[1].rank, 2);

        let top = RankingEngine::top_n(&input, 2);
        assert_eq!(labels(&top), ["A", "C"]);
        assert_eq!(top[0].rank, 1);

        // input untouched
        assert_eq!(input, groups(&[("A", 5), ("B", 1), ("C", 3)]));
    }

    #[test]
    fn test_ties_keep_first_seen_order_both_ways() {
        let input = groups(&[("x", 2), ("y", 2), ("z", 1), ("w", 2)]);

        assert_eq!(labels(&RankingEngine::top_n(&input, 3)), ["x", "y", "w"]);
        assert_eq!(labels(&RankingEngine::bottom_n(&input, 3)), ["z", "x", "y"]);
    }

    #[test]
    fn test_tally_and_accumulate() {
        let counted = RankingEngine::tally(["9-A", "9-B", "9-A"].map(String::from));
        assert_eq!(counted, groups(&[("9-A", 2), ("9-B", 1)]));

        let summed = RankingEngine::accumulate(vec![
            ("Kalem".to_string(), dec!(50)),
            ("Defter".to_string(), dec!(20)),
            ("Kalem".to_string(), dec!(25)),
        ]);
        assert_eq!(summed, groups(&[("Kalem", 75), ("Defter", 20)]));
    }

    #[test]
    fn test_accumulate_skips_values_that_would_overflow() {
        let summed = RankingEngine::accumulate(vec![
            ("a".to_string(), Decimal::MAX),
            ("a".to_string(), dec!(1)),
            ("b".to_string(), dec!(2)),
        ]);
        assert_eq!(
            summed,
            vec![("a".to_string(), Decimal::MAX), ("b".to_string(), dec!(2))]
        );
    }

    #[test]
    fn test_zero_n_and_empty_input() {
        assert!(RankingEngine::top_n(&groups(&[("A", 1)]), 0).is_empty());
        assert!(RankingEngine::bottom_n(&[], 5).is_empty());
    }

    proptest! {
        /// At most n entries, ordered consistently, with ranks 1..=len.
        #[test]
        fn prop_rankings_are_ordered(values in prop::collection::vec(0i64..50, 0..20), n in 0usize..25) {
            let input: Vec<(String, Decimal)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("g{i}"), Decimal::from(*v)))
                .collect();

            let top = RankingEngine::top_n(&input, n);
            let bottom = RankingEngine::bottom_n(&input, n);

            prop_assert!(top.len() <= n && bottom.len() <= n);
            prop_assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
            prop_assert!(bottom.windows(2).all(|w| w[0].value <= w[1].value));
            prop_assert!(top.iter().zip(1u32..).all(|(entry, rank)| entry.rank == rank));

            if input.len() <= n {
                let mut top_labels: Vec<String> = top.into_iter().map(|e| e.label).collect();
                let mut bottom_labels: Vec<String> = bottom.into_iter().map(|e| e.label).collect();
                top_labels.sort();
                bottom_labels.sort();
                prop_assert_eq!(top_labels.len(), input.len());
                prop_assert_eq!(top_labels, bottom_labels);
            }
        }
    }
}
