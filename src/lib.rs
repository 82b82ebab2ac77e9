//! Stochastic semester timetable generator.
//!
//! Sessions (lectures, seminars, labs) are placed one at a time onto a grid of
//! eight slots per working day. Slots are drawn with probability proportional
//! to a weight derived from weekday and time of day; each placement lowers the
//! weights of the rest of that day and may repeat itself one week later.

pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod generate;
pub mod holidays;
pub mod priority;
pub mod resources;
pub mod sampler;
pub mod server;
pub mod solver;
pub mod store;
pub mod suppression;
pub mod timetable;

pub use calendar::{CalendarGrid, HolidaySet};
pub use config::{SchedulerConfig, ServerConfig};
pub use error::{Error, Result};
pub use solver::{Scheduler, Solution};
