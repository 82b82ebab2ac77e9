//! One end-to-end timetable run over the data directory.

use crate::calendar::CalendarGrid;
use crate::config::SchedulerConfig;
use crate::data::TimetableEntry;
use crate::error::Result;
use crate::resources::ResourcePool;
use crate::solver::Scheduler;
use crate::store::DataDir;
use crate::timetable::to_entries;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Loads everything, fills a fresh grid, writes `timetable.json` and returns
/// the display entries.
pub fn generate_timetable(data: &DataDir, config: &SchedulerConfig) -> Result<Vec<TimetableEntry>> {
    config.validate()?;

    let dataset = data.load_dataset()?;
    let workdays = data.load_workdays()?;
    let holidays = data.load_holidays()?;
    let resources = ResourcePool::from_dataset(&dataset);

    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Generating timetable with seed {}", seed);

    let grid = CalendarGrid::build(&workdays, config, &holidays)?;
    let solution = Scheduler::new(
        config,
        &resources,
        grid,
        dataset.subjects.clone(),
        ChaCha8Rng::seed_from_u64(seed),
    )
    .run()?;

    data.save_timetable(&solution.grid)?;
    Ok(to_entries(&solution.grid, &dataset.lecturers, &config.session_labels))
}
