//! Configuration for the scheduler and the HTTP service.
//!
//! `SchedulerConfig` carries the weight tables, decay constants and policy
//! flags of one scheduling run. It can be loaded from JSON; missing fields
//! fall back to the defaults below. `ServerConfig` is read from the
//! environment at startup.

use crate::calendar::SLOTS_PER_DAY;
use crate::data::SessionType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Number of entries in the weekday weight table (Monday..Saturday).
pub const WEEKDAYS_IN_TABLE: usize = 6;

/// Tables and policy for one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Desirability per weekday, Monday first.
    pub weekday_weights: Vec<f64>,
    /// Desirability per time-of-day index.
    pub time_of_day_weights: Vec<f64>,
    /// Start of each time-of-day band in minutes from midnight.
    pub time_of_day_minutes: Vec<u32>,
    pub session_labels: SessionLabels,
    pub decay: DecayConfig,
    pub recurrence: RecurrencePolicy,
    /// Upper bound on driver loop iterations. `None` runs until every
    /// subject is exhausted.
    pub max_iterations: Option<u64>,
    /// Fixed seed for the random source. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

/// Display labels for the three session types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLabels {
    pub lecture: String,
    pub seminar: String,
    pub lab: String,
}

/// Same-day suppression applied around a filled slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Factor applied to the direct neighbour. Lower means fewer sessions per day.
    pub base: f64,
    /// Factor reduction per additional slot of distance. Lower means more gaps.
    pub falloff: f64,
    /// Smallest factor and smallest weight the decay will produce.
    pub floor: f64,
}

/// Which remaining count the weekly recurrence thresholds are compared to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RecurrenceBasis {
    /// The count as it stood before the current placement.
    #[default]
    Prior,
    /// The count left after the current placement was taken off.
    Remaining,
}

/// Weekly-recurrence duplication of placements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecurrencePolicy {
    pub enabled: bool,
    /// Grid days that make up one week; the jump is this many day blocks.
    pub days_per_week: usize,
    pub basis: RecurrenceBasis,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weekday_weights: vec![1.0, 2.25, 3.0, 2.25, 1.0, 0.1],
            time_of_day_weights: vec![0.25, 0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0],
            time_of_day_minutes: vec![
                8 * 60 + 30,  // 08:30
                10 * 60 + 20, // 10:20
                12 * 60 + 20, // 12:20
                14 * 60 + 10, // 14:10
                16 * 60,      // 16:00
                18 * 60,      // 18:00
                19 * 60 + 40, // 19:40
                21 * 60 + 20, // 21:20
            ],
            session_labels: SessionLabels::default(),
            decay: DecayConfig::default(),
            recurrence: RecurrencePolicy::default(),
            max_iterations: None,
            seed: None,
        }
    }
}

impl Default for SessionLabels {
    fn default() -> Self {
        Self {
            lecture: "Лекция".to_string(),
            seminar: "Семинар".to_string(),
            lab: "Лабораторное занятие".to_string(),
        }
    }
}

impl SessionLabels {
    pub fn label(&self, session: SessionType) -> &str {
        match session {
            SessionType::Lecture => &self.lecture,
            SessionType::Seminar => &self.seminar,
            SessionType::Lab => &self.lab,
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            base: 0.4,
            falloff: 0.1,
            floor: 0.0001,
        }
    }
}

impl DecayConfig {
    /// Factor applied to a neighbour `distance` slots away (distance >= 1).
    pub fn factor(&self, distance: usize) -> f64 {
        let factor = self.base - self.falloff * (distance.saturating_sub(1)) as f64;
        factor.max(self.floor)
    }
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            days_per_week: 7,
            basis: RecurrenceBasis::default(),
        }
    }
}

impl RecurrencePolicy {
    /// Distance in slots between the same time of day one week apart.
    pub fn week_offset(&self, slots_per_day: usize) -> usize {
        self.days_per_week * slots_per_day
    }
}

impl SchedulerConfig {
    /// Reads a config from a JSON file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SchedulerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_table("weekdayWeights", &self.weekday_weights, WEEKDAYS_IN_TABLE)?;
        check_table("timeOfDayWeights", &self.time_of_day_weights, SLOTS_PER_DAY)?;

        if self.time_of_day_minutes.len() != SLOTS_PER_DAY {
            return Err(Error::InvalidConfig(format!(
                "timeOfDayMinutes must have {} entries, got {}",
                SLOTS_PER_DAY,
                self.time_of_day_minutes.len()
            )));
        }
        if self.time_of_day_minutes.iter().any(|&m| m >= 24 * 60) {
            return Err(Error::InvalidConfig(
                "timeOfDayMinutes entries must fall within one day".to_string(),
            ));
        }
        if !self.time_of_day_minutes.is_sorted_by(|a, b| a < b) {
            return Err(Error::InvalidConfig(
                "timeOfDayMinutes must be strictly ascending".to_string(),
            ));
        }

        let decay = &self.decay;
        if !(decay.floor > 0.0 && decay.floor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "decay floor must be in (0, 1], got {}",
                decay.floor
            )));
        }
        if !(decay.base >= decay.floor && decay.base <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "decay base must be in [floor, 1], got {}",
                decay.base
            )));
        }
        if !(decay.falloff >= 0.0 && decay.falloff.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "decay falloff must be a non-negative number, got {}",
                decay.falloff
            )));
        }

        if self.recurrence.days_per_week == 0 {
            return Err(Error::InvalidConfig(
                "recurrence daysPerWeek must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_table(name: &str, table: &[f64], expected: usize) -> Result<()> {
    if table.len() != expected {
        return Err(Error::InvalidConfig(format!(
            "{} must have {} entries, got {}",
            name,
            expected,
            table.len()
        )));
    }
    if let Some(bad) = table.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvalidConfig(format!(
            "{} entries must be finite and non-negative, got {}",
            name, bad
        )));
    }
    Ok(())
}

/// Service settings, read from `TIMETABLE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub scheduler_config: Option<PathBuf>,
    pub holiday_api: String,
    pub country: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("server/db"),
            scheduler_config: None,
            holiday_api: "https://date.nager.at/api/v3".to_string(),
            country: "RU".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("TIMETABLE_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("TIMETABLE_BIND '{}': {}", bind, e)))?;
        }
        if let Ok(dir) = std::env::var("TIMETABLE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("TIMETABLE_CONFIG") {
            config.scheduler_config = Some(PathBuf::from(path));
        }
        if let Ok(url) = std::env::var("TIMETABLE_HOLIDAY_API") {
            config.holiday_api = url.trim_end_matches('/').to_string();
        }
        if let Ok(country) = std::env::var("TIMETABLE_COUNTRY") {
            config.country = country;
        }
        Ok(config)
    }

    /// Scheduler config from the configured file, or the defaults.
    pub fn load_scheduler_config(&self) -> Result<SchedulerConfig> {
        match &self.scheduler_config {
            Some(path) => SchedulerConfig::from_file(path),
            None => Ok(SchedulerConfig::default()),
        }
    }
}
