use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{DerivedRecord, RentalTable, Season};

// ---------------------------------------------------------------------------
// Filter predicates: the user's selection over the derived table
// ---------------------------------------------------------------------------

/// Year selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

/// Working-day selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DayType {
    #[default]
    All,
    Working,
    NonWorking,
}

/// The complete filter selection applied before aggregation.
///
/// An empty `seasons` set means "no season filter": deselecting every
/// season in the dashboard multiselect falls back to showing all rows.
/// The default selection passes every row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    pub year: YearFilter,
    pub seasons: BTreeSet<Season>,
    pub day_type: DayType,
}

impl FilterSpec {
    /// True when `row` passes all three predicates.
    ///
    /// The predicates are independent and AND-combined, so the order they
    /// are checked in never changes the outcome.
    pub fn matches(&self, row: &DerivedRecord) -> bool {
        self.matches_year(row) && self.matches_season(row) && self.matches_day_type(row)
    }

    pub fn matches_year(&self, row: &DerivedRecord) -> bool {
        match self.year {
            YearFilter::All => true,
            YearFilter::Year(year) => row.year == year,
        }
    }

    /// An empty selection is "no filter applied", not "exclude all". A row
    /// whose season code decoded to nothing can only pass when no season
    /// filter is active.
    pub fn matches_season(&self, row: &DerivedRecord) -> bool {
        if self.seasons.is_empty() {
            return true;
        }
        row.season_name
            .map_or(false, |season| self.seasons.contains(&season))
    }

    pub fn matches_day_type(&self, row: &DerivedRecord) -> bool {
        match self.day_type {
            DayType::All => true,
            DayType::Working => row.record.workingday == 1,
            DayType::NonWorking => row.record.workingday == 0,
        }
    }
}

/// Return indices of rows passing the current filter selection.
///
/// The table itself is never touched; each call allocates a fresh view.
pub fn filtered_indices(table: &RentalTable, spec: &FilterSpec) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| spec.matches(row))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::derive::derive_features;
    use crate::data::model::Record;

    fn table() -> RentalTable {
        // Two years, all four seasons, working and non-working rows.
        let mut records = Vec::new();
        for (i, &(y, m, season, workingday)) in [
            (2011, 1, 1u8, 1u8),
            (2011, 4, 2, 0),
            (2011, 7, 3, 1),
            (2011, 10, 4, 0),
            (2012, 2, 1, 0),
            (2012, 5, 2, 1),
            (2012, 8, 3, 0),
            (2012, 11, 4, 1),
        ]
        .iter()
        .enumerate()
        {
            records.push(Record {
                timestamp: NaiveDate::from_ymd_opt(y, m, 1)
                    .unwrap()
                    .and_hms_opt(i as u32, 0, 0)
                    .unwrap(),
                season,
                weather: 1,
                temp: 20.0,
                workingday,
                casual: 1,
                registered: 2,
                count: 3,
            });
        }
        RentalTable::new(derive_features(records))
    }

    #[test]
    fn default_spec_passes_everything() {
        let table = table();
        let spec = FilterSpec::default();
        assert_eq!(filtered_indices(&table, &spec), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn year_filter_keeps_matching_rows_only() {
        let table = table();
        let spec = FilterSpec {
            year: YearFilter::Year(2012),
            ..FilterSpec::default()
        };
        let indices = filtered_indices(&table, &spec);
        assert_eq!(indices, vec![4, 5, 6, 7]);
        assert!(indices.iter().all(|&i| table.rows[i].year == 2012));
    }

    #[test]
    fn day_type_filters_on_workingday_flag() {
        let table = table();
        let working = FilterSpec {
            day_type: DayType::Working,
            ..FilterSpec::default()
        };
        assert_eq!(filtered_indices(&table, &working), vec![0, 2, 5, 7]);

        let nonworking = FilterSpec {
            day_type: DayType::NonWorking,
            ..FilterSpec::default()
        };
        assert_eq!(filtered_indices(&table, &nonworking), vec![1, 3, 4, 6]);
    }

    #[test]
    fn empty_season_set_equals_full_set() {
        let table = table();
        let empty = FilterSpec::default();
        let full = FilterSpec {
            seasons: Season::ALL.into_iter().collect(),
            ..FilterSpec::default()
        };
        assert_eq!(
            filtered_indices(&table, &empty),
            filtered_indices(&table, &full)
        );
        assert_eq!(filtered_indices(&table, &empty).len(), table.len());
    }

    #[test]
    fn season_subset_keeps_members_only() {
        let table = table();
        let spec = FilterSpec {
            seasons: [Season::Summer, Season::Winter].into_iter().collect(),
            ..FilterSpec::default()
        };
        let indices = filtered_indices(&table, &spec);
        assert_eq!(indices, vec![1, 3, 5, 7]);
    }

    #[test]
    fn predicates_commute() {
        let table = table();
        let specs = [
            FilterSpec {
                year: YearFilter::Year(2011),
                seasons: [Season::Spring, Season::Fall].into_iter().collect(),
                day_type: DayType::Working,
            },
            FilterSpec {
                year: YearFilter::Year(2012),
                seasons: BTreeSet::new(),
                day_type: DayType::NonWorking,
            },
            FilterSpec {
                year: YearFilter::All,
                seasons: [Season::Winter].into_iter().collect(),
                day_type: DayType::All,
            },
        ];

        for spec in &specs {
            let combined = filtered_indices(&table, spec);

            // Apply the three predicates one at a time, in every order.
            type Predicate = fn(&FilterSpec, &DerivedRecord) -> bool;
            let predicates: [Predicate; 3] = [
                FilterSpec::matches_year,
                FilterSpec::matches_season,
                FilterSpec::matches_day_type,
            ];
            let orders = [
                [0, 1, 2],
                [0, 2, 1],
                [1, 0, 2],
                [1, 2, 0],
                [2, 0, 1],
                [2, 1, 0],
            ];
            for order in orders {
                let mut indices: Vec<usize> = (0..table.len()).collect();
                for &p in &order {
                    indices.retain(|&i| predicates[p](spec, &table.rows[i]));
                }
                assert_eq!(indices, combined, "order {order:?} diverged");
            }
        }
    }

    #[test]
    fn rows_without_a_season_fail_named_season_filters() {
        let records = vec![Record {
            timestamp: NaiveDate::from_ymd_opt(2011, 3, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            season: 9,
            weather: 1,
            temp: 12.0,
            workingday: 1,
            casual: 0,
            registered: 5,
            count: 5,
        }];
        let table = RentalTable::new(derive_features(records));

        let named = FilterSpec {
            seasons: Season::ALL.into_iter().collect(),
            ..FilterSpec::default()
        };
        assert!(filtered_indices(&table, &named).is_empty());

        // With no season filter active the row still shows up.
        assert_eq!(filtered_indices(&table, &FilterSpec::default()), vec![0]);
    }
}
