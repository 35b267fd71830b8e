use crate::domain::energy::upsert_energy_level;
use crate::domain::models::{ClockTime, EnergyLevel, TimeBlock};
use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const WHOLE_DAY_HOUR: i64 = -1;

/// Local storage the calendar reads at startup and writes through to.
pub trait CalendarStore: Send + Sync {
    fn load_time_blocks(&self) -> Result<Vec<TimeBlock>, InfraError>;
    fn save_time_block(&self, block: &TimeBlock) -> Result<(), InfraError>;
    fn delete_time_block(&self, block_id: &str) -> Result<bool, InfraError>;
    fn load_energy_levels(&self) -> Result<Vec<EnergyLevel>, InfraError>;
    fn save_energy_level(&self, entry: &EnergyLevel) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteCalendarStore {
    db_path: PathBuf,
}

impl SqliteCalendarStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn initialize(&self) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

type TimeBlockRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    Option<String>,
    bool,
);

fn decode_time_block(row: TimeBlockRow) -> Result<TimeBlock, InfraError> {
    let (id, title, description, start_time, end_time, date, category, completed) = row;
    let invalid = |field: &str, message: String| {
        InfraError::CorruptRecord(format!("time_blocks.{field} for '{id}': {message}"))
    };
    Ok(TimeBlock {
        start_time: ClockTime::parse(&start_time).map_err(|error| invalid("start_time", error))?,
        end_time: ClockTime::parse(&end_time).map_err(|error| invalid("end_time", error))?,
        date: parse_stored_date(&date).map_err(|error| invalid("date", error))?,
        id: id.clone(),
        title,
        description,
        category,
        completed,
    })
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|error| format!("'{value}': {error}"))
}

impl CalendarStore for SqliteCalendarStore {
    fn load_time_blocks(&self) -> Result<Vec<TimeBlock>, InfraError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, title, description, start_time, end_time, date, category, completed
             FROM time_blocks ORDER BY position",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<Result<Vec<TimeBlockRow>, _>>()?;
        rows.into_iter().map(decode_time_block).collect()
    }

    fn save_time_block(&self, block: &TimeBlock) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO time_blocks
               (id, title, description, start_time, end_time, date, category, completed, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
               (SELECT COALESCE(MAX(position), -1) + 1 FROM time_blocks))
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               description = excluded.description,
               start_time = excluded.start_time,
               end_time = excluded.end_time,
               date = excluded.date,
               category = excluded.category,
               completed = excluded.completed",
            params![
                block.id,
                block.title,
                block.description,
                block.start_time.to_string(),
                block.end_time.to_string(),
                block.date.to_string(),
                block.category,
                block.completed,
            ],
        )?;
        Ok(())
    }

    fn delete_time_block(&self, block_id: &str) -> Result<bool, InfraError> {
        let connection = self.connect()?;
        let removed = connection.execute("DELETE FROM time_blocks WHERE id = ?1", params![block_id])?;
        Ok(removed > 0)
    }

    fn load_energy_levels(&self) -> Result<Vec<EnergyLevel>, InfraError> {
        let connection = self.connect()?;
        let mut statement =
            connection.prepare("SELECT date, hour, level FROM energy_levels ORDER BY position")?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, hour, level)| {
                let date = parse_stored_date(&date)
                    .map_err(|error| InfraError::CorruptRecord(format!("energy_levels.date {error}")))?;
                let hour = if hour == WHOLE_DAY_HOUR {
                    None
                } else {
                    Some(u8::try_from(hour).map_err(|_| {
                        InfraError::CorruptRecord(format!("energy_levels.hour out of range: {hour}"))
                    })?)
                };
                let level = u8::try_from(level).map_err(|_| {
                    InfraError::CorruptRecord(format!("energy_levels.level out of range: {level}"))
                })?;
                Ok(EnergyLevel { date, level, hour })
            })
            .collect()
    }

    fn save_energy_level(&self, entry: &EnergyLevel) -> Result<(), InfraError> {
        let connection = self.connect()?;
        let hour = entry.hour.map(i64::from).unwrap_or(WHOLE_DAY_HOUR);
        connection.execute(
            "INSERT INTO energy_levels (date, hour, level, position)
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(position), -1) + 1 FROM energy_levels))
             ON CONFLICT(date, hour) DO UPDATE SET level = excluded.level",
            params![entry.date.to_string(), hour, i64::from(entry.level)],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCalendarStore {
    time_blocks: Mutex<Vec<TimeBlock>>,
    energy_levels: Mutex<Vec<EnergyLevel>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, InfraError> {
    mutex
        .lock()
        .map_err(|error| InfraError::StateUnavailable(format!("{name} lock poisoned: {error}")))
}

impl CalendarStore for InMemoryCalendarStore {
    fn load_time_blocks(&self) -> Result<Vec<TimeBlock>, InfraError> {
        Ok(lock(&self.time_blocks, "time block store")?.clone())
    }

    fn save_time_block(&self, block: &TimeBlock) -> Result<(), InfraError> {
        let mut blocks = lock(&self.time_blocks, "time block store")?;
        match blocks.iter_mut().find(|existing| existing.id == block.id) {
            Some(existing) => *existing = block.clone(),
            None => blocks.push(block.clone()),
        }
        Ok(())
    }

    fn delete_time_block(&self, block_id: &str) -> Result<bool, InfraError> {
        let mut blocks = lock(&self.time_blocks, "time block store")?;
        let before = blocks.len();
        blocks.retain(|block| block.id != block_id);
        Ok(blocks.len() != before)
    }

    fn load_energy_levels(&self) -> Result<Vec<EnergyLevel>, InfraError> {
        Ok(lock(&self.energy_levels, "energy store")?.clone())
    }

    fn save_energy_level(&self, entry: &EnergyLevel) -> Result<(), InfraError> {
        let mut levels = lock(&self.energy_levels, "energy store")?;
        upsert_energy_level(&mut levels, entry.clone());
        Ok(())
    }
}
