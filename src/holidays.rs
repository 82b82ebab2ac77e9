//! Public holiday lookup against a Nager.Date compatible API.

use crate::calendar::HolidaySet;
use crate::error::Result;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of `GET /PublicHolidays/{year}/{country}`.
///
/// Fields the service does not model are kept in `extra` so the entry is
/// passed on unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicHoliday {
    pub date: NaiveDate,
    #[serde(default)]
    pub local_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub counties: Option<Vec<String>>,
    #[serde(default)]
    pub launch_year: Option<i32>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct HolidayClient {
    http: reqwest::Client,
    base_url: String,
    country: String,
}

impl HolidayClient {
    pub fn new(base_url: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            country: country.into(),
        }
    }

    pub fn url(&self, year: i32) -> String {
        format!("{}/PublicHolidays/{}/{}", self.base_url, year, self.country)
    }

    pub async fn fetch(&self, year: i32) -> Result<Vec<PublicHoliday>> {
        let url = self.url(year);
        info!("Fetching public holidays from {}", url);
        let holidays = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<PublicHoliday>>()
            .await?;
        info!("Received {} public holiday(s) for {}", holidays.len(), year);
        Ok(holidays)
    }
}

pub fn holiday_dates(holidays: &[PublicHoliday]) -> HolidaySet {
    holidays.iter().map(|h| h.date).collect()
}
