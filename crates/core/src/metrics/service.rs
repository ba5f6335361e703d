//! Per-bucket and per-group aggregation.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use shelfwise_shared::AnalyticsConfig;

use super::types::{
    Advisory, AdvisoryKind, Aggregation, DistributionEntry, Metric, PerformanceSummary,
    SeriesAnalytics, TagShare, TrendDirection, TrendResult,
};
use crate::events::Event;
use crate::period::{Bucket, TimeBucketer};

/// Number of trailing points treated as "recent" by trend and prediction.
const RECENT_WINDOW: usize = 3;

/// Computes counts, sums, shares, trends and advisories.
#[derive(Debug, Clone, Copy)]
pub struct MetricComputer {
    bucketer: TimeBucketer,
    trend_threshold: Decimal,
    imbalance_ratio: Decimal,
    imbalance_min_groups: usize,
    low_stock_ratio: Decimal,
}

impl MetricComputer {
    /// Creates a computer from the analytics configuration.
    #[must_use]
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            bucketer: TimeBucketer::new(config.timezone),
            trend_threshold: config.trend_threshold,
            imbalance_ratio: config.imbalance_ratio,
            imbalance_min_groups: config.imbalance_min_groups,
            low_stock_ratio: config.low_stock_ratio,
        }
    }

    /// Returns the bucketer this computer assigns events with.
    #[must_use]
    pub const fn bucketer(&self) -> &TimeBucketer {
        &self.bucketer
    }

    /// One value per bucket, in bucket order.
    ///
    /// Events outside every bucket are ignored; each event lands in at most one bucket.
    /// An event that would overflow its bucket is skipped.
    pub fn per_bucket<P>(
        &self,
        events: &[Event],
        buckets: &[Bucket],
        predicate: P,
        aggregation: Aggregation,
    ) -> Vec<Decimal>
    where
        P: Fn(&Event) -> bool,
    {
        let mut values = vec![Decimal::ZERO; buckets.len()];
        for event in events.iter().filter(|event| predicate(event)) {
            let Some(index) = self.bucketer.locate(buckets, event.timestamp) else {
                continue;
            };
            let step = match aggregation {
                Aggregation::Count => Decimal::ONE,
                Aggregation::Sum => event.amount,
            };
            if let Some(sum) = values[index].checked_add(step) {
                values[index] = sum;
            }
        }
        values
    }

    /// Pairs bucket labels with their values.
    #[must_use]
    pub fn series(buckets: &[Bucket], values: &[Decimal], unit: &str) -> Vec<Metric> {
        buckets
            .iter()
            .zip(values)
            .map(|(bucket, value)| Metric::new(bucket.label.clone(), *value).with_unit(unit))
            .collect()
    }

    /// Classifies a series by comparing the last three points with the rest.
    #[must_use]
    pub fn trend(&self, series: &[Decimal]) -> TrendResult {
        if series.len() < 2 {
            return TrendResult::stable();
        }

        let split = series.len().saturating_sub(RECENT_WINDOW);
        let (older, recent) = series.split_at(split);
        let recent_avg = mean(recent, recent.len());
        let older_avg = mean(older, older.len().max(1));

        let change = if older_avg > Decimal::ZERO {
            growth(recent_avg, older_avg)
        } else {
            Decimal::ZERO
        };

        let direction = if change > self.trend_threshold {
            TrendDirection::Up
        } else if change < -self.trend_threshold {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        TrendResult {
            direction,
            percentage: change.abs().round_dp(1),
        }
    }

    /// Naive next value: mean of the last three points plus their slope.
    #[must_use]
    pub fn predict(series: &[Decimal]) -> Decimal {
        if series.len() < 2 {
            return series.last().copied().unwrap_or(Decimal::ZERO);
        }

        let recent = &series[series.len().saturating_sub(RECENT_WINDOW)..];
        let avg = mean(recent, recent.len());
        let slope = match (recent.first(), recent.last()) {
            (Some(first), Some(last)) if recent.len() > 1 => {
                last.saturating_sub(*first) / Decimal::from(recent.len() - 1)
            }
            _ => Decimal::ZERO,
        };

        avg.saturating_add(slope).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Total, mean, max, min and count of a series.
    #[must_use]
    pub fn performance(series: &[Decimal]) -> Option<PerformanceSummary> {
        let max = series.iter().max().copied()?;
        let min = series.iter().min().copied()?;
        let total = saturating_sum(series);

        Some(PerformanceSummary {
            total,
            average: (total / Decimal::from(series.len())).round_dp(1),
            max,
            min,
            count: series.len(),
        })
    }

    /// Trend, prediction and summary in one go.
    #[must_use]
    pub fn analyze(&self, series: &[Decimal]) -> SeriesAnalytics {
        SeriesAnalytics {
            performance: Self::performance(series),
            trend: self.trend(series),
            prediction: Self::predict(series),
        }
    }

    /// Percent growth from `previous` to `current`, 0 when there is no baseline.
    #[must_use]
    pub fn growth_rate(current: Decimal, previous: Decimal) -> Decimal {
        if previous.is_zero() {
            return Decimal::ZERO;
        }
        growth(current, previous).round_dp(1)
    }

    /// Groups items by one key each, weighting every item by `weight`.
    ///
    /// Entries are sorted by descending count; ties keep first-seen order.
    pub fn distribution<T, K, W>(items: &[T], key: K, weight: W) -> Vec<DistributionEntry>
    where
        K: Fn(&T) -> String,
        W: Fn(&T) -> Decimal,
    {
        let mut groups = Groups::default();
        for item in items {
            groups.add(key(item), weight(item));
        }
        let total = groups.total();
        groups.into_entries(total)
    }

    /// Groups items by each of their tags. An item counts once per distinct tag.
    pub fn tag_distribution<T, G>(items: &[T], tags: G, share: TagShare) -> Vec<DistributionEntry>
    where
        G: Fn(&T) -> &[String],
    {
        let mut groups = Groups::default();
        let mut tagged_items = 0_u64;
        for item in items {
            let mut seen: Vec<&str> = Vec::new();
            for tag in tags(item).iter().map(|tag| tag.trim()) {
                if tag.is_empty() || seen.contains(&tag) {
                    continue;
                }
                seen.push(tag);
                groups.add(tag.to_string(), Decimal::ONE);
            }
            if !seen.is_empty() {
                tagged_items += 1;
            }
        }

        let total = match share {
            TagShare::OfOccurrences => groups.total(),
            TagShare::OfItems => Decimal::from(tagged_items),
        };
        groups.into_entries(total)
    }

    /// Flags a distribution whose largest group dwarfs its smallest.
    #[must_use]
    pub fn imbalance(&self, entries: &[DistributionEntry]) -> Option<Advisory> {
        if entries.len() <= self.imbalance_min_groups {
            return None;
        }

        let largest = entries.iter().max_by(|a, b| a.count.cmp(&b.count))?;
        let smallest = entries.iter().min_by(|a, b| a.count.cmp(&b.count))?;
        let ratio = largest.count / smallest.count.max(Decimal::ONE);

        (ratio > self.imbalance_ratio).then(|| Advisory {
            kind: AdvisoryKind::Imbalance,
            groups: vec![largest.name.clone(), smallest.name.clone()],
            ratio: ratio.round_dp(2),
        })
    }

    /// Groups whose count is below `low_stock_ratio` times the average.
    #[must_use]
    pub fn low_stock(&self, entries: &[DistributionEntry]) -> Option<Advisory> {
        if entries.is_empty() {
            return None;
        }

        let total = saturating_sum(entries.iter().map(|entry| &entry.count));
        let threshold = total / Decimal::from(entries.len()) * self.low_stock_ratio;
        let groups: Vec<String> = entries
            .iter()
            .filter(|entry| entry.count < threshold)
            .map(|entry| entry.name.clone())
            .collect();

        (!groups.is_empty()).then(|| Advisory {
            kind: AdvisoryKind::LowStock,
            groups,
            ratio: self.low_stock_ratio,
        })
    }

    /// Advisories worth showing next to a distribution.
    #[must_use]
    pub fn advisories(&self, entries: &[DistributionEntry], check_stock: bool) -> Vec<Advisory> {
        let stock = if check_stock {
            self.low_stock(entries)
        } else {
            None
        };
        self.imbalance(entries).into_iter().chain(stock).collect()
    }
}

/// Percentages of `whole` for every part, at 2 dp, rounded by largest
/// remainder: the rounded values add up to the rounded sum of the exact
/// shares (100 when the parts make up the whole). Ties in the remainder go to
/// the earlier part.
#[must_use]
pub fn shares(parts: &[Decimal], whole: Decimal) -> Vec<Decimal> {
    let exact: Vec<Decimal> = parts
        .iter()
        .map(|part| {
            part.checked_div(whole)
                .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::ZERO)
        })
        .collect();
    let mut rounded: Vec<Decimal> = exact
        .iter()
        .map(|share| share.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity))
        .collect();

    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&a, &b| (exact[b] - rounded[b]).cmp(&(exact[a] - rounded[a])));

    let step = Decimal::new(1, 2);
    let mut shortfall = saturating_sum(&exact).round_dp(2) - saturating_sum(&rounded);
    for index in by_remainder {
        if shortfall < step {
            break;
        }
        rounded[index] += step;
        shortfall -= step;
    }
    rounded
}

/// `(current - previous) / previous * 100`, 0 when it does not fit a `Decimal`.
fn growth(current: Decimal, previous: Decimal) -> Decimal {
    current
        .checked_sub(previous)
        .and_then(|delta| delta.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

fn mean(values: &[Decimal], divisor: usize) -> Decimal {
    if divisor == 0 {
        return Decimal::ZERO;
    }
    saturating_sum(values) / Decimal::from(divisor)
}

fn saturating_sum<'a, I>(values: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(*value))
}

/// Insertion-ordered accumulator.
#[derive(Default)]
struct Groups {
    order: Vec<(String, Decimal)>,
    index: HashMap<String, usize>,
}

impl Groups {
    fn add(&mut self, name: String, amount: Decimal) {
        if let Some(&position) = self.index.get(&name) {
            let group = &mut self.order[position].1;
            *group = group.checked_add(amount).unwrap_or(*group);
        } else {
            self.index.insert(name.clone(), self.order.len());
            self.order.push((name, amount));
        }
    }

    fn total(&self) -> Decimal {
        saturating_sum(self.order.iter().map(|(_, amount)| amount))
    }

    fn into_entries(self, total: Decimal) -> Vec<DistributionEntry> {
        let counts: Vec<Decimal> = self.order.iter().map(|(_, count)| *count).collect();
        let mut entries: Vec<DistributionEntry> = self
            .order
            .into_iter()
            .zip(shares(&counts, total))
            .map(|((name, count), percentage)| DistributionEntry {
                name,
                count,
                percentage,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }
}
