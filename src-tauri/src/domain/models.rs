use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const MINUTES_PER_HOUR: u16 = 60;
const END_OF_DAY_MINUTES: u16 = 24 * MINUTES_PER_HOUR;

/// Wall-clock time of day with minute precision, written as `HH:MM`.
///
/// `24:00` is accepted so a block can end exactly at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { minutes: 0 };
    pub const END_OF_DAY: ClockTime = ClockTime {
        minutes: END_OF_DAY_MINUTES,
    };

    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
            return None;
        }
        Some(Self {
            minutes: u16::from(hour) * MINUTES_PER_HOUR + u16::from(minute),
        })
    }

    pub fn on_the_hour(hour: u8) -> Option<Self> {
        Self::from_hm(hour, 0)
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        let mut split = value.trim().split(':');
        let (Some(hour_str), Some(minute_str), None) = (split.next(), split.next(), split.next())
        else {
            return Err(format!("'{value}' must be HH:MM"));
        };
        if hour_str.is_empty() || hour_str.len() > 2 || minute_str.len() != 2 {
            return Err(format!("'{value}' must be HH:MM"));
        }
        let hour = hour_str
            .parse::<u8>()
            .map_err(|_| format!("'{value}' must be HH:MM"))?;
        let minute = minute_str
            .parse::<u8>()
            .map_err(|_| format!("'{value}' must be HH:MM"))?;
        Self::from_hm(hour, minute).ok_or_else(|| format!("'{value}' is not a valid time of day"))
    }

    pub fn hour(self) -> u8 {
        (self.minutes / MINUTES_PER_HOUR) as u8
    }

    pub fn minute(self) -> u8 {
        (self.minutes % MINUTES_PER_HOUR) as u8
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.minutes
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Day,
    #[default]
    Week,
    Month,
}

impl CalendarView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// Colour family a block card is drawn with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTone {
    Purple,
    Emerald,
    Blue,
    Amber,
    Gray,
}

impl CategoryTone {
    pub fn for_category(category: Option<&str>) -> Self {
        match category.map(str::trim) {
            Some("Mindfulness") => Self::Purple,
            Some("Fitness") => Self::Emerald,
            Some("Work") => Self::Blue,
            Some("Learning") => Self::Amber,
            _ => Self::Gray,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBlock {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub date: NaiveDate,
    pub category: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl TimeBlock {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "time_block.id")?;
        validate_non_empty(&self.title, "time_block.title")?;
        validate_time_range(self.start_time, self.end_time, "time_block")
    }

    /// Whole hours between the start hour and the end hour; minutes are ignored.
    pub fn whole_hour_span(&self) -> u8 {
        self.end_time.hour().saturating_sub(self.start_time.hour())
    }

    pub fn start_hour(&self) -> u8 {
        self.start_time.hour()
    }
}

/// What the time block form hands back on submit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBlockPayload {
    pub title: String,
    pub description: Option<String>,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl TimeBlockPayload {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "time_block.title")?;
        validate_time_range(self.start_time, self.end_time, "time_block")
    }

    pub fn into_block(self, id: String, completed_fallback: bool) -> TimeBlock {
        TimeBlock {
            id,
            title: self.title.trim().to_string(),
            description: normalize_optional(self.description),
            start_time: self.start_time,
            end_time: self.end_time,
            date: self.date,
            category: normalize_optional(self.category),
            completed: self.completed.unwrap_or(completed_fallback),
        }
    }
}

pub const MIN_ENERGY_LEVEL: u8 = 1;
pub const MAX_ENERGY_LEVEL: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyLevel {
    pub date: NaiveDate,
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
}

impl EnergyLevel {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_ENERGY_LEVEL..=MAX_ENERGY_LEVEL).contains(&self.level) {
            return Err(format!(
                "energy.level must be between {MIN_ENERGY_LEVEL} and {MAX_ENERGY_LEVEL}"
            ));
        }
        if let Some(hour) = self.hour {
            if hour > 23 {
                return Err("energy.hour must be between 0 and 23".to_string());
            }
        }
        Ok(())
    }

    pub fn key(&self) -> (NaiveDate, Option<u8>) {
        (self.date, self.hour)
    }
}

pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_time_range(start: ClockTime, end: ClockTime, prefix: &str) -> Result<(), String> {
    if start >= ClockTime::END_OF_DAY {
        return Err(format!("{prefix}.start_time must be before 24:00"));
    }
    if end <= start {
        return Err(format!("{prefix}.end_time must be after {prefix}.start_time"));
    }
    Ok(())
}
