use std::time::Duration;

use chrono::{Local, NaiveDate, TimeZone};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::DailyPrayerTimes;
use crate::prayer_times::schedule::clean_time;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered HTTP {0}")]
    Status(u16),
    #[error("provider returned code {code} ({status})")]
    Code { code: u16, status: String },
    #[error("could not decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no local noon for {0}")]
    BadDate(NaiveDate),
}

/// Where a day's schedule comes from. The HTTP client is the real one.
pub trait TimingsSource {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        method: &str,
        date: NaiveDate,
    ) -> Result<DailyPrayerTimes, ProviderError>;
}

/// Just the status part of a response; `data` varies in shape on errors.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: u16,
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct TimingsResponse {
    pub code: u16,
    pub status: String,
    pub data: Option<TimingsData>,
}

#[derive(Debug, Deserialize)]
pub struct TimingsData {
    pub timings: Timings,
    pub date: ResponseDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timings {
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseDate {
    pub readable: String,
    pub timestamp: String,
}

/// Blocking client for an Aladhan-compatible `timings` endpoint.
pub struct AladhanClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl AladhanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("waqt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// `{base}/timings/{unix seconds of local noon}` plus the query pairs.
    pub fn timings_request(
        &self,
        latitude: f64,
        longitude: f64,
        method: &str,
        date: NaiveDate,
    ) -> Result<reqwest::blocking::Request, ProviderError> {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .and_then(|dt| Local.from_local_datetime(&dt).earliest())
            .ok_or(ProviderError::BadDate(date))?;
        let request = self
            .http
            .get(format!("{}/timings/{}", self.base_url, noon.timestamp()))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("method", method.to_string()),
            ])
            .build()?;
        Ok(request)
    }
}

impl TimingsSource for AladhanClient {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        method: &str,
        date: NaiveDate,
    ) -> Result<DailyPrayerTimes, ProviderError> {
        let request = self.timings_request(latitude, longitude, method, date)?;
        log::debug!("GET {}", request.url());

        let response = self.http.execute(request)?;
        let status = response.status();
        let body = response.text()?;
        check_response(status, &body, date)
    }
}

/// Map an HTTP reply to a schedule or an error. A failing status is always an
/// error; the body's own code is reported when it carries one.
pub fn check_response(
    status: StatusCode,
    body: &str,
    date: NaiveDate,
) -> Result<DailyPrayerTimes, ProviderError> {
    if status.is_success() {
        return parse_timings(body, date);
    }
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.code != 200 => Err(ProviderError::Code {
            code: envelope.code,
            status: envelope.status,
        }),
        _ => Err(ProviderError::Status(status.as_u16())),
    }
}

/// Decode a `timings` payload into the schedule for `date`.
pub fn parse_timings(body: &str, date: NaiveDate) -> Result<DailyPrayerTimes, ProviderError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.code != 200 {
        return Err(ProviderError::Code {
            code: envelope.code,
            status: envelope.status,
        });
    }

    let response: TimingsResponse = serde_json::from_str(body)?;
    let data = response.data.ok_or(ProviderError::Code {
        code: response.code,
        status: response.status,
    })?;

    log::debug!("provider date: {} ({})", data.date.readable, data.date.timestamp);
    let t = data.timings;
    Ok(DailyPrayerTimes {
        date: date.format("%Y-%m-%d").to_string(),
        fajr: clean_time(&t.fajr).to_string(),
        dhuhr: clean_time(&t.dhuhr).to_string(),
        asr: clean_time(&t.asr).to_string(),
        maghrib: clean_time(&t.maghrib).to_string(),
        isha: clean_time(&t.isha).to_string(),
        sunrise: t.sunrise.as_deref().map(|s| clean_time(s).to_string()),
        sunset: t.sunset.as_deref().map(|s| clean_time(s).to_string()),
    })
}
