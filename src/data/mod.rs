/// Data layer: core types, loading, derivation, filtering, aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<Record>, cached per source path
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  calendar + time-of-day features → RentalTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / season / day-type predicates → visible indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by dimension → per-group statistics
///   └───────────┘
/// ```
pub mod aggregate;
pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
