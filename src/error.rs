use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Holiday API request failed: {0}")]
    HolidayApi(#[from] reqwest::Error),

    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Gave up after {iterations} iterations with {outstanding} subject(s) still unscheduled")]
    IterationBudgetExhausted { iterations: u64, outstanding: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
