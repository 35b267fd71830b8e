use crate::domain::error::CalendarError;
use crate::domain::models::{ClockTime, TimeBlock, TimeBlockPayload};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DEFAULT_FORM_HOUR: u8 = 9;

/// Raw field values of the time block form, as typed by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBlockDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub date: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TimeBlockDraft {
    /// Empty form for a new one-hour block; `hour` defaults to 09:00.
    pub fn blank(date: NaiveDate, hour: Option<u8>) -> Self {
        let start = hour.filter(|hour| *hour < 24).unwrap_or(DEFAULT_FORM_HOUR);
        let end = ClockTime::on_the_hour(start + 1).unwrap_or(ClockTime::END_OF_DAY);
        Self {
            title: String::new(),
            description: None,
            start_time: ClockTime::on_the_hour(start)
                .unwrap_or(ClockTime::MIDNIGHT)
                .to_string(),
            end_time: end.to_string(),
            date: date.to_string(),
            category: None,
            completed: None,
        }
    }

    pub fn from_block(block: &TimeBlock) -> Self {
        Self {
            title: block.title.clone(),
            description: block.description.clone(),
            start_time: block.start_time.to_string(),
            end_time: block.end_time.to_string(),
            date: block.date.to_string(),
            category: block.category.clone(),
            completed: Some(block.completed),
        }
    }

    pub fn into_payload(self) -> Result<TimeBlockPayload, CalendarError> {
        let start_time = ClockTime::parse(&self.start_time)
            .map_err(|error| CalendarError::Validation(format!("start_time {error}")))?;
        let end_time = ClockTime::parse(&self.end_time)
            .map_err(|error| CalendarError::Validation(format!("end_time {error}")))?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            CalendarError::Validation("date must be YYYY-MM-DD".to_string())
        })?;

        let payload = TimeBlockPayload {
            title: self.title,
            description: self.description,
            start_time,
            end_time,
            date,
            category: self.category,
            completed: self.completed,
        };
        payload.validate()?;
        Ok(payload)
    }
}
