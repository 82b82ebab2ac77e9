use crate::calendar::{format_date, parse_date, workdays_between};
use crate::config::{SchedulerConfig, ServerConfig};
use crate::data::{Lecturer, TimetableEntry};
use crate::error::{Error, Result};
use crate::generate::generate_timetable;
use crate::holidays::{HolidayClient, PublicHoliday};
use crate::store::DataDir;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Iteration cap applied to HTTP runs when the config leaves it open.
pub const SERVICE_ITERATION_BUDGET: u64 = 1_000_000;

const DEFAULT_SEMESTER_START: &str = "2024-02-12";
const DEFAULT_SEMESTER_END: &str = "2024-06-16";

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    data: DataDir,
    scheduler: Arc<SchedulerConfig>,
    holidays: HolidayClient,
}

impl AppState {
    pub fn new(data: DataDir, mut scheduler: SchedulerConfig, holidays: HolidayClient) -> Self {
        if scheduler.max_iterations.is_none() {
            scheduler.max_iterations = Some(SERVICE_ITERATION_BUDGET);
        }
        Self {
            data,
            scheduler: Arc::new(scheduler),
            holidays,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkdaysRequest {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkdaysResponse {
    pub message: String,
    pub workdays: Vec<String>,
}

fn error_response(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::InvalidDate(_) | Error::InvalidDateRange { .. } => StatusCode::BAD_REQUEST,
        Error::HolidayApi(_) => StatusCode::BAD_GATEWAY,
        Error::IterationBudgetExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Io(_) | Error::Json(_) | Error::Database(_) | Error::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error!("Request failed: {}", e);
    (status, e.to_string())
}

/// Runs file and database work off the async runtime.
async fn blocking<T, F>(task: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Background task failed: {}", e)))?
        .map(Json)
        .map_err(error_response)
}

async fn generate_handler(State(state): State<AppState>) -> ApiResult<Vec<TimetableEntry>> {
    let data = state.data.clone();
    let config = Arc::clone(&state.scheduler);
    blocking(move || generate_timetable(&data, &config)).await
}

async fn lecturers_handler(State(state): State<AppState>) -> ApiResult<Vec<Lecturer>> {
    let data = state.data.clone();
    blocking(move || data.load_lecturers()).await
}

async fn workdays_handler(
    State(state): State<AppState>,
    Json(request): Json<WorkdaysRequest>,
) -> ApiResult<WorkdaysResponse> {
    let data = state.data.clone();
    blocking(move || {
        let start = parse_or(request.start.as_deref(), DEFAULT_SEMESTER_START)?;
        let end = parse_or(request.end.as_deref(), DEFAULT_SEMESTER_END)?;
        let workdays = workdays_between(start, end)?;
        let path = data.save_workdays(&workdays)?;
        Ok(WorkdaysResponse {
            message: format!("Working days saved to {}", path.display()),
            workdays: workdays.into_iter().map(format_date).collect(),
        })
    })
    .await
}

fn parse_or(raw: Option<&str>, default: &str) -> Result<NaiveDate> {
    parse_date(raw.unwrap_or(default))
}

async fn holidays_handler(State(state): State<AppState>, Path(year): Path<i32>) -> ApiResult<Vec<PublicHoliday>> {
    state.holidays.fetch(year).await.map(Json).map_err(error_response)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/lecturers", get(lecturers_handler))
        .route("/v1/workdays", post(workdays_handler))
        .route("/v1/holidays/:year", get(holidays_handler))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let state = AppState::new(
        DataDir::new(&config.data_dir),
        config.load_scheduler_config()?,
        HolidayClient::new(&config.holiday_api, &config.country),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
