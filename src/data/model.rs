use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Season – fixed lookup from the dataset's coded values
// ---------------------------------------------------------------------------

/// Season as coded in the source data: 1→spring, 2→summer, 3→fall, 4→winter.
///
/// The mapping is a fixed property of the dataset and does not follow the
/// calendar convention, so it is a lookup, never recomputed from the month.
/// `Ord` follows the display order spring → winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// All seasons in display order.
    pub const ALL: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Fall,
        Season::Winter,
    ];

    /// Decode a 1–4 season code. Codes outside the range have no season;
    /// they are never defaulted to a valid one.
    pub fn from_code(code: u8) -> Option<Season> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// DayPeriod – time-of-day bucket
// ---------------------------------------------------------------------------

/// Period of day. `Ord` follows the display order night → evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    /// All periods in display order.
    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Night,
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
    ];

    /// Bucket an hour (0–23) into its period of day.
    ///
    /// Half-open intervals: [0,6) night, [6,12) morning, [12,18) afternoon,
    /// [18,24) evening.
    pub fn from_hour(hour: u32) -> DayPeriod {
        match hour {
            0..=5 => DayPeriod::Night,
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayPeriod::Night => "night",
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Weather labels
// ---------------------------------------------------------------------------

/// Display label for a 1–4 weather code. Codes outside the range have no
/// label and render as their raw number.
pub fn weather_label(code: u8) -> Option<&'static str> {
    match code {
        1 => Some("Clear"),
        2 => Some("Mist"),
        3 => Some("Light Rain/Snow"),
        4 => Some("Heavy Rain"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Record – one raw observation row
// ---------------------------------------------------------------------------

/// One raw observation from the rental dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Observation time, naive local, second precision.
    pub timestamp: NaiveDateTime,
    /// Season code, 1–4 in well-formed input. Out-of-range codes are kept
    /// as-is by the loader (see [`Season::from_code`]).
    pub season: u8,
    /// Weather code, 1–4 in well-formed input.
    pub weather: u8,
    /// Temperature in °C.
    pub temp: f64,
    /// 1 on working days, 0 otherwise.
    pub workingday: u8,
    /// Rentals by casual users this hour.
    pub casual: u32,
    /// Rentals by registered users this hour.
    pub registered: u32,
    /// Total rentals this hour. Equals casual + registered in well-formed
    /// input; not enforced here.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// DerivedRecord – a Record plus calendar / time-of-day features
// ---------------------------------------------------------------------------

/// A [`Record`] augmented with the calendar and time-of-day features the
/// filters and charts work on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub record: Record,
    pub year: i32,
    /// 1–12.
    pub month: u32,
    /// 0–6, Monday = 0.
    pub day_of_week: u32,
    /// 0–23.
    pub hour: u32,
    /// Decoded season, or `None` for an out-of-range code.
    pub season_name: Option<Season>,
    pub day_period: DayPeriod,
}

// ---------------------------------------------------------------------------
// RentalTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded, feature-derived table. Immutable after construction; every
/// filter selection produces a fresh index view over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RentalTable {
    pub rows: Vec<DerivedRecord>,
}

impl RentalTable {
    pub fn new(rows: Vec<DerivedRecord>) -> Self {
        RentalTable { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
