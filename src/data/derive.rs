use chrono::{Datelike, Timelike};
use log::warn;

use super::model::{DayPeriod, DerivedRecord, Record, Season};

// ---------------------------------------------------------------------------
// Feature derivation
// ---------------------------------------------------------------------------

/// Derive calendar and time-of-day features for every record.
///
/// 1:1 and order-preserving: exactly one output row per input row, in input
/// order. Timestamps are naive local time on the Gregorian calendar; no
/// timezone conversion happens here.
pub fn derive_features(records: Vec<Record>) -> Vec<DerivedRecord> {
    records.into_iter().map(derive_one).collect()
}

fn derive_one(record: Record) -> DerivedRecord {
    let ts = record.timestamp;
    let hour = ts.hour();

    let season_name = Season::from_code(record.season);
    if season_name.is_none() {
        warn!(
            "season code {} at {} is outside 1-4; season figures will report no data",
            record.season, ts
        );
    }

    DerivedRecord {
        year: ts.year(),
        month: ts.month(),
        day_of_week: ts.weekday().num_days_from_monday(),
        hour,
        season_name,
        day_period: DayPeriod::from_hour(hour),
        record,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(y: i32, m: u32, d: u32, hour: u32, season: u8) -> Record {
        Record {
            timestamp: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            season,
            weather: 1,
            temp: 15.0,
            workingday: 1,
            casual: 3,
            registered: 7,
            count: 10,
        }
    }

    #[test]
    fn extracts_calendar_features() {
        // 2011-01-03 was a Monday.
        let derived = derive_features(vec![record(2011, 1, 3, 8, 1)]);
        assert_eq!(derived.len(), 1);
        let row = &derived[0];
        assert_eq!(row.year, 2011);
        assert_eq!(row.month, 1);
        assert_eq!(row.day_of_week, 0);
        assert_eq!(row.hour, 8);
        assert_eq!(row.season_name, Some(Season::Spring));
        assert_eq!(row.day_period, DayPeriod::Morning);
    }

    #[test]
    fn sunday_is_day_six() {
        // 2012-12-30 was a Sunday.
        let derived = derive_features(vec![record(2012, 12, 30, 23, 4)]);
        assert_eq!(derived[0].day_of_week, 6);
        assert_eq!(derived[0].day_period, DayPeriod::Evening);
    }

    #[test]
    fn preserves_length_and_order() {
        let input: Vec<Record> = (0..24).map(|h| record(2011, 6, 15, h, 2)).collect();
        let derived = derive_features(input.clone());
        assert_eq!(derived.len(), input.len());
        for (i, row) in derived.iter().enumerate() {
            assert_eq!(row.record.timestamp, input[i].timestamp);
            assert_eq!(row.hour, i as u32);
        }
    }

    #[test]
    fn derivation_is_pure() {
        let input: Vec<Record> = (1..=4).map(|s| record(2011, s, 1, 12, s as u8)).collect();
        let once = derive_features(input.clone());
        let twice = derive_features(input);
        assert_eq!(once, twice);
    }

    #[test]
    fn out_of_range_season_becomes_sentinel() {
        let derived = derive_features(vec![record(2011, 5, 1, 10, 7)]);
        assert_eq!(derived[0].season_name, None);
        assert_eq!(derived[0].record.season, 7);
    }
}
