use crate::domain::models::{ClockTime, TimeBlock};
use crate::infrastructure::calendar_store::SqliteCalendarStore;
use crate::infrastructure::config::{ensure_default_configs, load_app_config, AppConfig};
use crate::infrastructure::error::InfraError;
use chrono::{Days, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub config: AppConfig,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join("timegrid.sqlite");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_app_config(&config_dir)?;
    SqliteCalendarStore::new(&database_path).initialize()?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
        config,
    })
}

/// Starter blocks shown on first launch, spread over today and the next two days.
pub fn sample_time_blocks(today: NaiveDate) -> Vec<TimeBlock> {
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let day_after = today.checked_add_days(Days::new(2)).unwrap_or(today);
    let samples = [
        ("1", "Morning Meditation", (7, 0), (7, 30), today, "Mindfulness", true),
        ("2", "Workout Session", (8, 30), (9, 30), today, "Fitness", false),
        ("3", "Project Planning", (10, 0), (11, 30), today, "Work", false),
        ("4", "Team Meeting", (14, 0), (15, 0), tomorrow, "Work", false),
        ("5", "Evening Run", (18, 0), (19, 0), day_after, "Fitness", false),
    ];

    samples
        .into_iter()
        .filter_map(|(id, title, (start_h, start_m), (end_h, end_m), date, category, completed)| {
            Some(TimeBlock {
                id: format!("sample-{id}"),
                title: title.to_string(),
                description: None,
                start_time: ClockTime::from_hm(start_h, start_m)?,
                end_time: ClockTime::from_hm(end_h, end_m)?,
                date,
                category: Some(category.to_string()),
                completed,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_ROOT: AtomicUsize = AtomicUsize::new(0);

    struct TempRoot {
        path: PathBuf,
    }

    impl TempRoot {
        fn new() -> Self {
            let sequence = NEXT_TEMP_ROOT.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "timegrid-bootstrap-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            Self { path }
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn bootstrap_creates_layout_and_database() {
        let root = TempRoot::new();
        let result = bootstrap_workspace(&root.path).expect("bootstrap");
        assert!(result.config_dir.join("app.json").exists());
        assert!(result.logs_dir.is_dir());
        assert!(result.database_path.exists());
        assert_eq!(result.config, AppConfig::default());
    }

    #[test]
    fn sample_blocks_are_valid_and_unique() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 18).expect("date");
        let blocks = sample_time_blocks(today);
        assert_eq!(blocks.len(), 5);
        assert!(blocks.iter().all(|block| block.validate().is_ok()));
        assert_eq!(blocks[3].date, NaiveDate::from_ymd_opt(2026, 2, 19).expect("date"));

        let ids = blocks
            .iter()
            .map(|block| block.id.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), blocks.len());
    }
}
