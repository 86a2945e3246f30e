use std::path::Path;

use anyhow::Context;

use bikeshare_dash::report::DashboardSummary;
use bikeshare_dash::state::DashboardState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // The only command-line input is the dataset path.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "train.csv".to_string());

    let mut state = DashboardState::new();
    let table = state
        .load_source(Path::new(&path))
        .with_context(|| format!("loading dataset from {path}"))?;

    let summary = DashboardSummary::from_view(&table, &state.visible);
    print!("{summary}");

    Ok(())
}
