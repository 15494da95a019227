use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Time};

use super::repo::{Event, NewEvent};
use crate::error::ApiError;

/// Create/update body. Fields are optional at the serde layer; `validate`
/// enforces the required ones so the failure is a 400 from the taxonomy
/// rather than a decode rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub notes: Option<String>,
}

impl EventPayload {
    pub fn validate(self) -> Result<NewEvent, ApiError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let date_raw = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let (Some(title), Some(date_raw)) = (title, date_raw) else {
            return Err(ApiError::validation("title and date are required"));
        };

        let date = Date::parse(date_raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| ApiError::validation("date must be formatted YYYY-MM-DD"))?;

        let time = match self.time.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => Some(parse_time(raw)?),
            None => None,
        };

        Ok(NewEvent {
            title,
            description: self.description,
            date,
            time,
            kind: self.kind,
            location: self.location,
            organizer: self.organizer,
            notes: self.notes,
        })
    }
}

fn parse_time(raw: &str) -> Result<Time, ApiError> {
    Time::parse(raw, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]")))
        .map_err(|_| ApiError::validation("time must be formatted HH:MM or HH:MM:SS"))
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub changes: u64,
}
