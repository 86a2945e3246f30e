use std::fmt;

use log::warn;
use serde::Serialize;

use crate::data::aggregate::{
    argmax_mean, group_stat, key_metrics, AggregationResult, Dimension, GroupKey, KeyMetrics, Stat,
};
use crate::data::filter::{filtered_indices, FilterSpec};
use crate::data::model::{RentalTable, Season};

// ---------------------------------------------------------------------------
// Dashboard summary: everything the presentation layer needs, as data
// ---------------------------------------------------------------------------

/// "Key Insights" scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Hour of day with the highest mean rentals in the current view.
    pub peak_hour: Option<u32>,
    /// Season with the highest mean rentals in the current view.
    pub best_season: Option<Season>,
    /// Mean rentals on working days. This comparison is defined over the
    /// full table, not the filtered view.
    pub working_mean: Option<f64>,
    /// Mean rentals on non-working days, over the full table.
    pub nonworking_mean: Option<f64>,
}

/// All figures for one render of the dashboard, computed from the current
/// filter selection.
///
/// Every section degrades independently: a chart or metric is `None` when
/// the selection gives it nothing to show, and the rest of the summary is
/// still populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub metrics: Option<KeyMetrics>,
    /// Mean rentals grouped by hour of day.
    pub rentals_by_hour: Option<AggregationResult>,
    /// Mean rentals grouped by period of day.
    pub rentals_by_period: Option<AggregationResult>,
    /// Mean rentals grouped by month.
    pub rentals_by_month: Option<AggregationResult>,
    /// Mean rentals grouped by season.
    pub rentals_by_season: Option<AggregationResult>,
    /// Mean rentals grouped by weather code.
    pub rentals_by_weather: Option<AggregationResult>,
    /// (temperature °C, rentals) per visible row, for the scatter chart.
    pub temp_vs_count: Vec<(f64, u32)>,
    pub insights: Insights,
}

impl DashboardSummary {
    /// Compute every dashboard figure for the given selection.
    pub fn compute(table: &RentalTable, spec: &FilterSpec) -> DashboardSummary {
        let visible = filtered_indices(table, spec);
        DashboardSummary::from_view(table, &visible)
    }

    /// Compute from an already-filtered view, as cached by
    /// [`DashboardState`](crate::state::DashboardState).
    pub fn from_view(table: &RentalTable, visible: &[usize]) -> DashboardSummary {
        let chart = |dimension: Dimension| -> Option<AggregationResult> {
            match group_stat(table, visible, dimension, Stat::Mean) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!("{dimension:?} chart degraded to no data: {err}");
                    None
                }
            }
        };

        let metrics = match key_metrics(table, visible) {
            Ok(metrics) => Some(metrics),
            Err(err) => {
                warn!("key metrics degraded to no data: {err}");
                None
            }
        };

        let peak_hour = argmax_mean(table, visible, Dimension::Hour)
            .ok()
            .and_then(|key| match key {
                GroupKey::Hour(hour) => Some(hour),
                _ => None,
            });
        let best_season = argmax_mean(table, visible, Dimension::Season)
            .ok()
            .and_then(|key| match key {
                GroupKey::Season(season) => Some(season),
                _ => None,
            });

        let temp_vs_count = visible
            .iter()
            .map(|&i| {
                let record = &table.rows[i].record;
                (record.temp, record.count)
            })
            .collect();

        DashboardSummary {
            metrics,
            rentals_by_hour: chart(Dimension::Hour),
            rentals_by_period: chart(Dimension::DayPeriod),
            rentals_by_month: chart(Dimension::Month),
            rentals_by_season: chart(Dimension::Season),
            rentals_by_weather: chart(Dimension::Weather),
            temp_vs_count,
            insights: Insights {
                peak_hour,
                best_season,
                working_mean: day_type_mean(table, 1),
                nonworking_mean: day_type_mean(table, 0),
            },
        }
    }
}

/// Mean rental count over all rows with the given workingday flag, or
/// `None` when no row carries it.
fn day_type_mean(table: &RentalTable, workingday: u8) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for row in &table.rows {
        if row.record.workingday == workingday {
            sum += f64::from(row.record.count);
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

const NO_DATA: &str = "  (no data)";

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Washington D.C. Bike Rental Analysis")?;
        writeln!(f, "=====================================")?;

        writeln!(f, "\nKey Metrics")?;
        match &self.metrics {
            Some(m) => {
                writeln!(f, "  Total rentals:      {}", m.total_rentals)?;
                writeln!(f, "  Avg hourly rentals: {:.0}", m.avg_hourly)?;
                writeln!(f, "  Casual users:       {}", m.casual_total)?;
                writeln!(f, "  Registered users:   {}", m.registered_total)?;
            }
            None => writeln!(f, "{NO_DATA}")?,
        }

        let sections = [
            ("Mean Rentals by Hour of Day", &self.rentals_by_hour),
            ("Mean Rentals by Period of Day", &self.rentals_by_period),
            ("Mean Rentals by Month", &self.rentals_by_month),
            ("Mean Rentals by Season", &self.rentals_by_season),
            ("Mean Rentals by Weather Condition", &self.rentals_by_weather),
        ];
        for (title, chart) in sections {
            writeln!(f, "\n{title}")?;
            match chart {
                Some(result) => {
                    for (key, value) in &result.groups {
                        writeln!(f, "  {:<16} {value:8.1}", key.to_string())?;
                    }
                }
                None => writeln!(f, "{NO_DATA}")?,
            }
        }

        writeln!(
            f,
            "\nRentals vs Temperature: {} points in the current view",
            self.temp_vs_count.len()
        )?;

        writeln!(f, "\nKey Insights")?;
        match self.insights.peak_hour {
            Some(hour) => writeln!(f, "  Highest rentals at {hour}:00")?,
            None => writeln!(f, "  Peak hour: no data")?,
        }
        match self.insights.best_season {
            Some(season) => writeln!(f, "  {season} has the highest average rentals")?,
            None => writeln!(f, "  Best season: no data")?,
        }
        match (self.insights.working_mean, self.insights.nonworking_mean) {
            (Some(working), Some(nonworking)) => {
                writeln!(f, "  Working days:     {working:.0} avg rentals")?;
                writeln!(f, "  Non-working days: {nonworking:.0} avg rentals")?;
            }
            _ => writeln!(f, "  Working vs non-working days: no data")?,
        }

        Ok(())
    }
}
