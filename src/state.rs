use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::error::LoadError;
use crate::data::filter::{filtered_indices, DayType, FilterSpec, YearFilter};
use crate::data::loader::DatasetCache;
use crate::data::model::{RentalTable, Season};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The dashboard's pull-model state, independent of any rendering.
///
/// The base table is loaded once per source and kept immutable; every change
/// to the filter selection recomputes the visible view in full. There is no
/// event stream: a consumer reads `visible` (or recomputes a summary from
/// it) whenever it needs fresh output.
#[derive(Debug, Default)]
pub struct DashboardState {
    cache: DatasetCache,

    /// Source path of the current table.
    pub source: Option<PathBuf>,

    /// Loaded dataset (None until a source is loaded).
    pub table: Option<Arc<RentalTable>>,

    /// Current filter selection.
    pub spec: FilterSpec,

    /// Indices of rows passing the current selection (cached).
    pub visible: Vec<usize>,
}

impl DashboardState {
    pub fn new() -> Self {
        DashboardState::default()
    }

    /// Load (or re-use) the dataset at `path`, reset the selection to
    /// all-pass and return the table.
    ///
    /// A load failure leaves the previous state untouched and is surfaced
    /// once; nothing is retried.
    pub fn load_source(&mut self, path: &Path) -> Result<Arc<RentalTable>, LoadError> {
        let table = self.cache.get_or_load(path)?;
        self.visible = (0..table.len()).collect();
        self.spec = FilterSpec::default();
        self.source = Some(path.to_path_buf());
        self.table = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Recompute `visible` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.visible = filtered_indices(table, &self.spec);
        }
    }

    pub fn set_year(&mut self, year: YearFilter) {
        self.spec.year = year;
        self.refilter();
    }

    pub fn set_day_type(&mut self, day_type: DayType) {
        self.spec.day_type = day_type;
        self.refilter();
    }

    /// Toggle a single season in the selection.
    pub fn toggle_season(&mut self, season: Season) {
        if !self.spec.seasons.remove(&season) {
            self.spec.seasons.insert(season);
        }
        self.refilter();
    }

    /// Select all four seasons.
    pub fn select_all_seasons(&mut self) {
        self.spec.seasons = Season::ALL.into_iter().collect();
        self.refilter();
    }

    /// Clear the season selection. An empty selection shows every season
    /// rather than nothing.
    pub fn clear_seasons(&mut self) {
        self.spec.seasons.clear();
        self.refilter();
    }
}
