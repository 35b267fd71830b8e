use crate::domain::models::{CalendarView, EnergyLevel};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Replaced,
    Appended,
}

/// Replaces the level stored under `(date, hour)` or appends a new entry.
pub fn upsert_energy_level(levels: &mut Vec<EnergyLevel>, entry: EnergyLevel) -> UpsertOutcome {
    match levels
        .iter_mut()
        .find(|existing| existing.key() == entry.key())
    {
        Some(existing) => {
            existing.level = entry.level;
            UpsertOutcome::Replaced
        }
        None => {
            levels.push(entry);
            UpsertOutcome::Appended
        }
    }
}

pub fn hourly_key(date: NaiveDate, hour: u8) -> String {
    format!("{date}-{hour}")
}

/// Lookup tables for per-hour energy indicators in the day and week grids.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EnergyOverlay {
    pub hourly: BTreeMap<String, u8>,
    pub daily: BTreeMap<String, u8>,
}

impl EnergyOverlay {
    pub fn level_at(&self, date: NaiveDate, hour: u8) -> Option<u8> {
        self.hourly
            .get(&hourly_key(date, hour))
            .or_else(|| self.daily.get(&date.to_string()))
            .copied()
    }
}

/// Month view has no energy overlay.
pub fn energy_overlay(view: CalendarView, levels: &[EnergyLevel]) -> Option<EnergyOverlay> {
    if view == CalendarView::Month {
        return None;
    }

    let mut overlay = EnergyOverlay::default();
    for entry in levels {
        match entry.hour {
            Some(hour) => {
                overlay.hourly.insert(hourly_key(entry.date, hour), entry.level);
            }
            None => {
                overlay.daily.insert(entry.date.to_string(), entry.level);
            }
        }
    }
    Some(overlay)
}
