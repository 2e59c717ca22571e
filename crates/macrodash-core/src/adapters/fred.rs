//! FRED indicator adapter.
//!
//! Retrieval chain per indicator: the credentialed JSON API when a key is
//! configured, otherwise (or when that call fails) the public bulk CSV export
//! of the same series.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::data_source::{IndicatorSource, SourceFuture};
use crate::domain::{CalendarDate, Observation, Series};
use crate::fetch::{fetch_json, fetch_text};
use crate::http_client::HttpClient;
use crate::source::IndicatorId;
use crate::EngineError;

const API_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const CSV_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

pub const DEFAULT_API_TIMEOUT_MS: u64 = 12_000;
pub const DEFAULT_CSV_TIMEOUT_MS: u64 = 14_000;

#[derive(Clone)]
pub struct FredAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    observation_start: CalendarDate,
    api_timeout_ms: u64,
    csv_timeout_ms: u64,
}

impl FredAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        observation_start: CalendarDate,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            observation_start,
            api_timeout_ms: DEFAULT_API_TIMEOUT_MS,
            csv_timeout_ms: DEFAULT_CSV_TIMEOUT_MS,
        }
    }

    pub fn with_timeouts(mut self, api_timeout_ms: u64, csv_timeout_ms: u64) -> Self {
        self.api_timeout_ms = api_timeout_ms;
        self.csv_timeout_ms = csv_timeout_ms;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self, id: IndicatorId) -> Result<&str, EngineError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EngineError::MissingCredential {
                series: id.fred_series_id().to_owned(),
            })
    }

    async fn fetch_api(&self, id: IndicatorId, api_key: &str) -> Result<Series, EngineError> {
        let url = format!(
            "{API_URL}?series_id={}&api_key={}&file_type=json&observation_start={}",
            urlencoding::encode(id.fred_series_id()),
            urlencoding::encode(api_key),
            self.observation_start,
        );
        let body: ObservationsResponse =
            fetch_json(self.http_client.as_ref(), &url, self.api_timeout_ms).await?;

        let mut points = Vec::with_capacity(body.observations.len());
        for raw in body.observations {
            let Some(value) = parse_value(&raw.value) else {
                continue;
            };
            let date = CalendarDate::parse(&raw.date)?;
            points.extend(Observation::new(date, value));
        }
        non_empty(id, points)
    }

    async fn fetch_csv(&self, id: IndicatorId) -> Result<Series, EngineError> {
        let url = format!(
            "{CSV_URL}?id={}&cosd={}",
            urlencoding::encode(id.fred_series_id()),
            self.observation_start,
        );
        let body = fetch_text(self.http_client.as_ref(), &url, self.csv_timeout_ms).await?;
        let points = parse_csv(&body)?
            .into_iter()
            .filter(|point| point.date >= self.observation_start)
            .collect();
        non_empty(id, points)
    }

    async fn fetch_with_fallback(&self, id: IndicatorId) -> Result<Series, EngineError> {
        match self.credential(id) {
            Ok(api_key) => match self.fetch_api(id, api_key).await {
                Ok(series) => return Ok(series),
                Err(error) => {
                    warn!(indicator = %id, %error, "FRED API failed, falling back to CSV export");
                }
            },
            Err(error) => debug!(indicator = %id, %error, "using CSV export"),
        }
        self.fetch_csv(id).await
    }
}

impl IndicatorSource for FredAdapter {
    fn fetch_series<'a>(&'a self, id: IndicatorId) -> SourceFuture<'a, Series> {
        Box::pin(self.fetch_with_fallback(id))
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

/// FRED marks missing observations with ".".
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a two-column `date,value` export.
fn parse_csv(body: &str) -> Result<Vec<Observation>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EngineError::transport(format!("unreadable FRED CSV header: {e}")))?;
    let date_column = headers.get(0).unwrap_or_default();
    if headers.len() != 2 || !matches!(date_column, "observation_date" | "DATE") {
        return Err(EngineError::transport(format!(
            "unexpected FRED CSV header '{}'",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut points = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| EngineError::transport(format!("malformed FRED CSV row: {e}")))?;
        let (Some(raw_date), Some(raw_value)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let Some(value) = parse_value(raw_value) else {
            continue;
        };
        let date = CalendarDate::parse(raw_date)?;
        points.extend(Observation::new(date, value));
    }
    Ok(points)
}

fn non_empty(id: IndicatorId, points: Vec<Observation>) -> Result<Series, EngineError> {
    if points.is_empty() {
        return Err(EngineError::transport(format!(
            "no observations returned for {}",
            id.fred_series_id()
        )));
    }
    Ok(Series::new(id.as_str(), points))
}
