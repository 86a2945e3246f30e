use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::error::{AggregateError, DeriveError};
use super::model::{weather_label, DayPeriod, DerivedRecord, RentalTable, Season};

// ---------------------------------------------------------------------------
// Grouping dimensions
// ---------------------------------------------------------------------------

/// Dimension a chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Hour,
    DayPeriod,
    Month,
    Season,
    Weather,
}

impl Dimension {
    /// Group key for one row.
    ///
    /// The season dimension is the only fallible one: a row whose season
    /// code decoded to nothing has no key, and the whole season aggregation
    /// reports it instead of guessing.
    fn key_for(&self, row: &DerivedRecord) -> Result<GroupKey, DeriveError> {
        match self {
            Dimension::Hour => Ok(GroupKey::Hour(row.hour)),
            Dimension::DayPeriod => Ok(GroupKey::Period(row.day_period)),
            Dimension::Month => Ok(GroupKey::Month(row.month)),
            Dimension::Season => row
                .season_name
                .map(GroupKey::Season)
                .ok_or(DeriveError::SeasonCode(row.record.season)),
            Dimension::Weather => Ok(GroupKey::Weather(row.record.weather)),
        }
    }
}

/// Key of one group within a dimension.
///
/// `Ord` is the display order: hours, months and weather codes ascend
/// numerically, day periods run night → evening, seasons spring → winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum GroupKey {
    Hour(u32),
    Period(DayPeriod),
    Month(u32),
    Season(Season),
    Weather(u8),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Hour(hour) => write!(f, "{hour:02}:00"),
            GroupKey::Period(period) => write!(f, "{period}"),
            GroupKey::Month(month) => write!(f, "{month}"),
            GroupKey::Season(season) => write!(f, "{season}"),
            GroupKey::Weather(code) => match weather_label(*code) {
                Some(label) => f.write_str(label),
                None => write!(f, "code {code}"),
            },
        }
    }
}

/// Statistic computed per group over the total rental count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stat {
    Mean,
    Sum,
    Count,
}

// ---------------------------------------------------------------------------
// Aggregation results
// ---------------------------------------------------------------------------

/// Grouped statistic values in display order. Groups absent from the data
/// are omitted, never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub dimension: Dimension,
    pub stat: Stat,
    pub groups: Vec<(GroupKey, f64)>,
}

impl AggregationResult {
    /// Value for one group key, if that group had any rows.
    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }
}

/// Table-wide summary figures with no grouping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyMetrics {
    /// Sum of the total count over the selection.
    pub total_rentals: u64,
    /// Mean of the total count per row (rows are hourly observations).
    pub avg_hourly: f64,
    pub casual_total: u64,
    pub registered_total: u64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group the selected rows by `dimension` and compute `stat` over each
/// group's total counts.
///
/// `indices` is the view produced by
/// [`filtered_indices`](super::filter::filtered_indices). An empty view
/// yields [`AggregateError::EmptySelection`] rather than a zero or NaN
/// statistic.
pub fn group_stat(
    table: &RentalTable,
    indices: &[usize],
    dimension: Dimension,
    stat: Stat,
) -> Result<AggregationResult, AggregateError> {
    let series = group_series(table, indices, dimension)?;
    let groups = series
        .into_iter()
        .map(|(key, values)| {
            let value = match stat {
                Stat::Mean => mean(&values),
                Stat::Sum => values.iter().sum(),
                Stat::Count => values.len() as f64,
            };
            (key, value)
        })
        .collect();

    Ok(AggregationResult {
        dimension,
        stat,
        groups,
    })
}

/// Key of the group with the highest mean count.
///
/// Groups are scanned in display order and a later group must be strictly
/// greater to displace the current best, so ties resolve to the first key
/// in display order regardless of row input order.
pub fn argmax_mean(
    table: &RentalTable,
    indices: &[usize],
    dimension: Dimension,
) -> Result<GroupKey, AggregateError> {
    let result = group_stat(table, indices, dimension, Stat::Mean)?;

    let mut best: Option<(GroupKey, f64)> = None;
    for (key, value) in result.groups {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((key, value)),
        }
    }
    // A non-empty selection always produces at least one group.
    best.map(|(key, _)| key)
        .ok_or(AggregateError::EmptySelection)
}

/// Compute the key-metric figures over the selected rows.
pub fn key_metrics(table: &RentalTable, indices: &[usize]) -> Result<KeyMetrics, AggregateError> {
    if indices.is_empty() {
        return Err(AggregateError::EmptySelection);
    }

    let mut total = 0u64;
    let mut casual = 0u64;
    let mut registered = 0u64;
    for &i in indices {
        let record = &table.rows[i].record;
        total += u64::from(record.count);
        casual += u64::from(record.casual);
        registered += u64::from(record.registered);
    }

    Ok(KeyMetrics {
        total_rentals: total,
        avg_hourly: total as f64 / indices.len() as f64,
        casual_total: casual,
        registered_total: registered,
    })
}

/// Partition the selected rows into per-key series of total counts. The
/// `BTreeMap` carries the display-order contract.
fn group_series(
    table: &RentalTable,
    indices: &[usize],
    dimension: Dimension,
) -> Result<BTreeMap<GroupKey, Vec<f64>>, AggregateError> {
    if indices.is_empty() {
        return Err(AggregateError::EmptySelection);
    }

    let mut series: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for &i in indices {
        let row = &table.rows[i];
        let key = dimension.key_for(row)?;
        series.entry(key).or_default().push(f64::from(row.record.count));
    }
    Ok(series)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::derive::derive_features;
    use crate::data::model::Record;

    fn row(hour: u32, season: u8, weather: u8, count: u32) -> Record {
        Record {
            timestamp: NaiveDate::from_ymd_opt(2011, 1, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            season,
            weather,
            temp: 9.84,
            workingday: 1,
            casual: count / 3,
            registered: count - count / 3,
            count,
        }
    }

    fn table(records: Vec<Record>) -> RentalTable {
        RentalTable::new(derive_features(records))
    }

    fn all_indices(table: &RentalTable) -> Vec<usize> {
        (0..table.len()).collect()
    }

    #[test]
    fn mean_by_hour_matches_worked_example() {
        let table = table(vec![
            row(8, 1, 1, 50),
            row(8, 1, 1, 150),
            row(17, 1, 1, 300),
        ]);
        let indices = all_indices(&table);

        let result = group_stat(&table, &indices, Dimension::Hour, Stat::Mean).unwrap();
        assert_eq!(
            result.groups,
            vec![(GroupKey::Hour(8), 100.0), (GroupKey::Hour(17), 300.0)]
        );

        let peak = argmax_mean(&table, &indices, Dimension::Hour).unwrap();
        assert_eq!(peak, GroupKey::Hour(17));
    }

    #[test]
    fn group_order_is_independent_of_row_order() {
        let forward = table(vec![row(3, 1, 1, 10), row(13, 2, 2, 20), row(22, 3, 3, 30)]);
        let backward = table(vec![row(22, 3, 3, 30), row(13, 2, 2, 20), row(3, 1, 1, 10)]);

        for dimension in [
            Dimension::Hour,
            Dimension::DayPeriod,
            Dimension::Season,
            Dimension::Weather,
        ] {
            let a = group_stat(&forward, &all_indices(&forward), dimension, Stat::Mean).unwrap();
            let b = group_stat(&backward, &all_indices(&backward), dimension, Stat::Mean).unwrap();
            assert_eq!(a.groups, b.groups, "{dimension:?}");
        }
    }

    #[test]
    fn day_periods_come_out_in_display_order() {
        let table = table(vec![
            row(20, 1, 1, 4),
            row(14, 1, 1, 3),
            row(7, 1, 1, 2),
            row(2, 1, 1, 1),
        ]);
        let result =
            group_stat(&table, &all_indices(&table), Dimension::DayPeriod, Stat::Mean).unwrap();
        let keys: Vec<GroupKey> = result.groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Period(DayPeriod::Night),
                GroupKey::Period(DayPeriod::Morning),
                GroupKey::Period(DayPeriod::Afternoon),
                GroupKey::Period(DayPeriod::Evening),
            ]
        );
    }

    #[test]
    fn absent_groups_are_omitted_not_zero() {
        let table = table(vec![row(8, 2, 1, 10)]);
        let result =
            group_stat(&table, &all_indices(&table), Dimension::Season, Stat::Mean).unwrap();
        assert_eq!(result.groups, vec![(GroupKey::Season(Season::Summer), 10.0)]);
        assert_eq!(result.get(&GroupKey::Season(Season::Winter)), None);
    }

    #[test]
    fn empty_selection_is_an_explicit_error() {
        let table = table(vec![row(8, 1, 1, 10)]);
        let empty: Vec<usize> = Vec::new();

        for dimension in [Dimension::Hour, Dimension::Month, Dimension::Weather] {
            assert_eq!(
                group_stat(&table, &empty, dimension, Stat::Mean).unwrap_err(),
                AggregateError::EmptySelection
            );
        }
        assert_eq!(
            argmax_mean(&table, &empty, Dimension::Hour).unwrap_err(),
            AggregateError::EmptySelection
        );
        assert_eq!(
            key_metrics(&table, &empty).unwrap_err(),
            AggregateError::EmptySelection
        );
    }

    #[test]
    fn argmax_ties_break_to_first_in_display_order() {
        // Morning and evening tie on the mean; morning comes first.
        let table = table(vec![row(7, 1, 1, 100), row(20, 1, 1, 100), row(2, 1, 1, 50)]);
        let best = argmax_mean(&table, &all_indices(&table), Dimension::DayPeriod).unwrap();
        assert_eq!(best, GroupKey::Period(DayPeriod::Morning));
    }

    #[test]
    fn undefined_season_degrades_the_season_dimension_only() {
        let table = table(vec![row(8, 1, 1, 10), row(9, 6, 1, 20)]);
        let indices = all_indices(&table);

        let err = group_stat(&table, &indices, Dimension::Season, Stat::Mean).unwrap_err();
        assert_eq!(err, AggregateError::Derive(DeriveError::SeasonCode(6)));

        // Every other dimension still aggregates.
        assert!(group_stat(&table, &indices, Dimension::Hour, Stat::Mean).is_ok());
        assert!(group_stat(&table, &indices, Dimension::Weather, Stat::Mean).is_ok());
    }

    #[test]
    fn sum_and_count_statistics() {
        let table = table(vec![row(8, 1, 1, 50), row(8, 1, 1, 150), row(17, 1, 1, 300)]);
        let indices = all_indices(&table);

        let sums = group_stat(&table, &indices, Dimension::Hour, Stat::Sum).unwrap();
        assert_eq!(
            sums.groups,
            vec![(GroupKey::Hour(8), 200.0), (GroupKey::Hour(17), 300.0)]
        );

        let counts = group_stat(&table, &indices, Dimension::Hour, Stat::Count).unwrap();
        assert_eq!(
            counts.groups,
            vec![(GroupKey::Hour(8), 2.0), (GroupKey::Hour(17), 1.0)]
        );
    }

    #[test]
    fn key_metrics_sum_and_average_the_selection() {
        let table = table(vec![row(8, 1, 1, 60), row(9, 1, 1, 120)]);
        let metrics = key_metrics(&table, &all_indices(&table)).unwrap();
        assert_eq!(metrics.total_rentals, 180);
        assert_eq!(metrics.avg_hourly, 90.0);
        assert_eq!(metrics.casual_total, 60);
        assert_eq!(metrics.registered_total, 120);
    }
}
