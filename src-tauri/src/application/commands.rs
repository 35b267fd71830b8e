use crate::application::bootstrap::{bootstrap_workspace, sample_time_blocks};
use crate::application::calendar_state::{
    ActionContext, CalendarAction, CalendarState, Effect, Notice, PendingDrag, PopupPosition,
    UiOverlay,
};
use crate::application::routes::{resolve_route, ResolvedRoute};
use crate::domain::form::TimeBlockDraft;
use crate::domain::grid::CalendarGrid;
use crate::domain::models::{CalendarView, EnergyLevel, TimeBlock};
use crate::infrastructure::calendar_store::{CalendarStore, SqliteCalendarStore};
use crate::infrastructure::error::InfraError;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

pub struct AppState {
    config_dir: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    time_zone: Tz,
    store: Box<dyn CalendarStore>,
    runtime: Mutex<CalendarState>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let store = SqliteCalendarStore::new(&bootstrap.database_path);
        let time_zone = bootstrap.config.time_zone()?;
        let today = today_in(time_zone);

        let mut time_blocks = store.load_time_blocks()?;
        if time_blocks.is_empty() && bootstrap.config.seed_sample_data {
            time_blocks = sample_time_blocks(today);
            for block in &time_blocks {
                store.save_time_block(block)?;
            }
            tracing::info!(count = time_blocks.len(), "seeded sample time blocks");
        }

        let mut calendar = CalendarState::new(today);
        calendar.time_blocks = time_blocks;
        calendar.energy_levels = store.load_energy_levels()?;
        calendar.view = bootstrap.config.default_view;
        calendar.show_completed = bootstrap.config.show_completed;
        calendar.quick_add_category = bootstrap.config.quick_add_category.clone();
        tracing::info!(
            app = %bootstrap.config.app_name,
            timezone = %time_zone,
            blocks = calendar.time_blocks.len(),
            "loaded calendar"
        );

        Ok(Self {
            config_dir: bootstrap.config_dir,
            database_path: bootstrap.database_path,
            logs_dir: bootstrap.logs_dir,
            time_zone,
            store: Box::new(store),
            runtime: Mutex::new(calendar),
        })
    }

    pub fn with_store(calendar: CalendarState, store: Box<dyn CalendarStore>) -> Self {
        Self {
            config_dir: PathBuf::new(),
            database_path: PathBuf::new(),
            logs_dir: PathBuf::new(),
            time_zone: Tz::UTC,
            store,
            runtime: Mutex::new(calendar),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.time_zone)
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        tracing::error!(command, error = %error, "command failed");
        error.to_string()
    }
}

fn today_in(time_zone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&time_zone).date_naive()
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSnapshotResponse {
    pub view: CalendarView,
    pub anchor_date: NaiveDate,
    pub show_completed: bool,
    pub overlay: UiOverlay,
    pub form_draft: Option<TimeBlockDraft>,
    pub pending_drag: Option<PendingDrag>,
    pub notice: Option<Notice>,
    pub time_blocks: Vec<TimeBlock>,
    pub energy_levels: Vec<EnergyLevel>,
    pub grid: CalendarGrid,
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, CalendarState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::StateUnavailable(format!("runtime lock poisoned: {error}")))
}

fn to_snapshot(calendar: &CalendarState, today: NaiveDate) -> CalendarSnapshotResponse {
    let form_draft = match &calendar.overlay {
        UiOverlay::FormOpen {
            editing: Some(block_id),
        } => calendar.block(block_id).map(TimeBlockDraft::from_block),
        UiOverlay::FormOpen { editing: None } => {
            Some(TimeBlockDraft::blank(calendar.anchor_date, None))
        }
        _ => None,
    };

    CalendarSnapshotResponse {
        view: calendar.view,
        anchor_date: calendar.anchor_date,
        show_completed: calendar.show_completed,
        overlay: calendar.overlay.clone(),
        form_draft,
        pending_drag: calendar.pending_drag.clone(),
        notice: calendar.notice.clone(),
        time_blocks: calendar.time_blocks.clone(),
        energy_levels: calendar.energy_levels.clone(),
        grid: calendar.grid(today),
    }
}

fn persist(state: &AppState, effect: &Effect) -> Result<(), InfraError> {
    match effect {
        Effect::BlockSaved(block) => state.store.save_time_block(block),
        Effect::BlockRemoved(block_id) => state.store.delete_time_block(block_id).map(|_| ()),
        Effect::EnergySaved(entry) => state.store.save_energy_level(entry),
    }
}

fn dispatch(state: &AppState, action: CalendarAction) -> Result<CalendarSnapshotResponse, InfraError> {
    let command = action.name();
    let today = state.today();
    let mut calendar = lock_runtime(state)?;

    let mut fresh_id = || next_id("blk");
    let mut context = ActionContext {
        today,
        next_id: &mut fresh_id,
    };
    let before = calendar.clone();
    let effect = calendar.dispatch(action, &mut context)?;

    if let Some(effect) = &effect {
        if let Err(error) = persist(state, effect) {
            // Memory must not run ahead of storage.
            *calendar = before;
            calendar.notice = Some(Notice::error(format!("could not save changes: {error}")));
            return Err(error);
        }
        match effect {
            Effect::BlockSaved(block) => {
                tracing::info!(command, block_id = %block.id, date = %block.date, "saved time block")
            }
            Effect::BlockRemoved(block_id) => {
                tracing::info!(command, block_id = %block_id, "removed time block")
            }
            Effect::EnergySaved(entry) => tracing::info!(
                command,
                date = %entry.date,
                hour = ?entry.hour,
                level = entry.level,
                "saved energy level"
            ),
        }
    } else {
        tracing::debug!(command, anchor = %calendar.anchor_date, view = calendar.view.as_str(), "applied");
    }

    Ok(to_snapshot(&calendar, today))
}

fn parse_date_input(value: &str, field_name: &str) -> Result<NaiveDate, InfraError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| InfraError::InvalidInput(format!("{field_name} must be YYYY-MM-DD: {error}")))
}

fn required_id(value: &str, field_name: &str) -> Result<String, InfraError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(InfraError::InvalidInput(format!("{field_name} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional_id(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

pub fn get_calendar_snapshot_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    let calendar = lock_runtime(state)?;
    Ok(to_snapshot(&calendar, state.today()))
}

pub fn navigate_previous_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::NavigatePrevious)
}

pub fn navigate_next_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::NavigateNext)
}

pub fn go_to_today_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::GoToToday)
}

pub fn set_anchor_date_impl(
    state: &AppState,
    date: String,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let date = parse_date_input(&date, "date")?;
    dispatch(state, CalendarAction::SetAnchorDate(date))
}

pub fn set_view_impl(state: &AppState, view: String) -> Result<CalendarSnapshotResponse, InfraError> {
    let view = CalendarView::parse(&view)
        .ok_or_else(|| InfraError::InvalidInput(format!("unsupported view: {}", view.trim())))?;
    dispatch(state, CalendarAction::SetView(view))
}

pub fn toggle_show_completed_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::ToggleShowCompleted)
}

pub fn upsert_energy_level_impl(
    state: &AppState,
    date: String,
    level: u8,
    hour: Option<u8>,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let date = parse_date_input(&date, "date")?;
    dispatch(state, CalendarAction::UpsertEnergyLevel { date, level, hour })
}

pub fn open_form_impl(
    state: &AppState,
    block_id: Option<String>,
) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::OpenForm(optional_id(block_id)))
}

pub fn open_quick_add_impl(
    state: &AppState,
    date: String,
    hour: u8,
    x: f64,
    y: f64,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let date = parse_date_input(&date, "date")?;
    dispatch(
        state,
        CalendarAction::OpenQuickAdd {
            position: PopupPosition { x, y },
            date,
            hour,
        },
    )
}

pub fn close_overlay_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::CloseOverlay)
}

pub fn save_time_block_impl(
    state: &AppState,
    draft: TimeBlockDraft,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let payload = match draft.into_payload() {
        Ok(payload) => payload,
        Err(error) => {
            let mut calendar = lock_runtime(state)?;
            calendar.notice = Some(Notice::error(error.to_string()));
            return Err(error.into());
        }
    };
    dispatch(state, CalendarAction::SaveTimeBlock(payload))
}

pub fn delete_time_block_impl(
    state: &AppState,
    block_id: String,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let block_id = required_id(&block_id, "block_id")?;
    dispatch(state, CalendarAction::DeleteTimeBlock(block_id))
}

pub fn toggle_completed_impl(
    state: &AppState,
    block_id: String,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let block_id = required_id(&block_id, "block_id")?;
    dispatch(state, CalendarAction::ToggleCompleted(block_id))
}

pub fn quick_add_impl(
    state: &AppState,
    date: String,
    hour: u8,
    title: String,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let date = parse_date_input(&date, "date")?;
    dispatch(state, CalendarAction::QuickAdd { date, hour, title })
}

pub fn begin_drag_impl(
    state: &AppState,
    block_id: String,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let block_id = required_id(&block_id, "block_id")?;
    dispatch(state, CalendarAction::BeginDrag(block_id))
}

pub fn drag_over_impl(
    state: &AppState,
    date: String,
    hour: u8,
) -> Result<CalendarSnapshotResponse, InfraError> {
    let date = parse_date_input(&date, "date")?;
    dispatch(state, CalendarAction::DragOver { date, hour })
}

pub fn drop_drag_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::Drop)
}

pub fn cancel_drag_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::CancelDrag)
}

pub fn dismiss_notice_impl(state: &AppState) -> Result<CalendarSnapshotResponse, InfraError> {
    dispatch(state, CalendarAction::DismissNotice)
}

pub fn resolve_route_impl(path: String) -> ResolvedRoute {
    resolve_route(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::routes::Page;
    use crate::domain::grid::GridLayout;
    use crate::domain::models::ClockTime;
    use crate::infrastructure::calendar_store::InMemoryCalendarStore;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "timegrid-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        fn app_state(&self) -> AppState {
            AppState::new(self.path.clone()).expect("initialize app state")
        }

        fn write_config(&self, raw: &str) {
            let config_dir = self.path.join("config");
            fs::create_dir_all(&config_dir).expect("create config dir");
            fs::write(config_dir.join("app.json"), raw).expect("write app.json");
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn empty_state() -> AppState {
        AppState::with_store(
            CalendarState::new(NaiveDate::from_ymd_opt(2026, 2, 18).expect("date")),
            Box::new(InMemoryCalendarStore::default()),
        )
    }

    struct RejectingStore;

    impl CalendarStore for RejectingStore {
        fn load_time_blocks(&self) -> Result<Vec<TimeBlock>, InfraError> {
            Ok(Vec::new())
        }

        fn save_time_block(&self, _block: &TimeBlock) -> Result<(), InfraError> {
            Err(InfraError::StateUnavailable("disk full".to_string()))
        }

        fn delete_time_block(&self, _block_id: &str) -> Result<bool, InfraError> {
            Err(InfraError::StateUnavailable("disk full".to_string()))
        }

        fn load_energy_levels(&self) -> Result<Vec<EnergyLevel>, InfraError> {
            Ok(Vec::new())
        }

        fn save_energy_level(&self, _entry: &EnergyLevel) -> Result<(), InfraError> {
            Err(InfraError::StateUnavailable("disk full".to_string()))
        }
    }

    fn draft(title: &str, date: &str, start: &str, end: &str) -> TimeBlockDraft {
        TimeBlockDraft {
            title: title.to_string(),
            description: None,
            start_time: start.to_string(),
            end_time: end.to_string(),
            date: date.to_string(),
            category: Some("Learning".to_string()),
            completed: None,
        }
    }

    #[test]
    fn new_workspace_is_seeded_with_sample_blocks() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let snapshot = get_calendar_snapshot_impl(&state).expect("snapshot");

        assert_eq!(snapshot.time_blocks.len(), 5);
        assert_eq!(snapshot.view, CalendarView::Week);
        assert_eq!(snapshot.anchor_date, state.today());
        assert!(state.database_path().exists());
        assert!(state.config_dir().join("app.json").exists());
    }

    #[test]
    fn seeding_can_be_disabled_in_config() {
        let workspace = TempWorkspace::new();
        workspace.write_config(r#"{"schema":1,"seedSampleData":false,"defaultView":"day"}"#);
        let state = workspace.app_state();
        let snapshot = get_calendar_snapshot_impl(&state).expect("snapshot");

        assert!(snapshot.time_blocks.is_empty());
        assert_eq!(snapshot.view, CalendarView::Day);
        assert!(snapshot.grid.is_empty);
    }

    #[test]
    fn saved_blocks_survive_restart() {
        let workspace = TempWorkspace::new();
        workspace.write_config(r#"{"schema":1,"seedSampleData":false}"#);
        {
            let state = workspace.app_state();
            open_form_impl(&state, None).expect("open form");
            save_time_block_impl(&state, draft("Read", "2026-02-18", "19:00", "20:00"))
                .expect("save");
            upsert_energy_level_impl(&state, "2026-02-18".to_string(), 4, Some(19))
                .expect("energy");
        }

        let restarted = workspace.app_state();
        let snapshot = get_calendar_snapshot_impl(&restarted).expect("snapshot");
        assert_eq!(snapshot.time_blocks.len(), 1);
        assert_eq!(snapshot.time_blocks[0].title, "Read");
        assert_eq!(snapshot.energy_levels.len(), 1);
    }

    #[test]
    fn deleting_and_moving_blocks_writes_through() {
        let workspace = TempWorkspace::new();
        workspace.write_config(r#"{"schema":1,"seedSampleData":false}"#);
        let state = workspace.app_state();
        let created = quick_add_impl(&state, "2026-02-18".to_string(), 9, "Standup".to_string())
            .expect("quick add");
        let block_id = created.time_blocks[0].id.clone();
        assert!(block_id.starts_with("blk-"));

        begin_drag_impl(&state, block_id.clone()).expect("begin drag");
        drag_over_impl(&state, "2026-02-20".to_string(), 15).expect("drag over");
        let moved = drop_drag_impl(&state).expect("drop");
        assert_eq!(moved.time_blocks[0].start_time.to_string(), "15:00");
        assert_eq!(moved.time_blocks[0].end_time.to_string(), "16:00");

        let reloaded = workspace.app_state();
        let snapshot = get_calendar_snapshot_impl(&reloaded).expect("snapshot");
        assert_eq!(snapshot.time_blocks[0].date.to_string(), "2026-02-20");

        delete_time_block_impl(&reloaded, block_id).expect("delete");
        let after_restart = workspace.app_state();
        let snapshot = get_calendar_snapshot_impl(&after_restart).expect("snapshot");
        assert!(snapshot.time_blocks.is_empty());
    }

    #[test]
    fn failed_write_leaves_memory_matching_storage() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).expect("date");
        let mut calendar = CalendarState::new(date);
        calendar.time_blocks.push(TimeBlock {
            id: "x".to_string(),
            title: "Focus".to_string(),
            description: None,
            start_time: ClockTime::on_the_hour(9).expect("start"),
            end_time: ClockTime::on_the_hour(10).expect("end"),
            date,
            category: None,
            completed: false,
        });
        let state = AppState::with_store(calendar, Box::new(RejectingStore));
        let before = get_calendar_snapshot_impl(&state).expect("snapshot").time_blocks;

        assert!(delete_time_block_impl(&state, "x".to_string()).is_err());
        assert!(quick_add_impl(&state, "2026-02-18".to_string(), 11, "Call".to_string()).is_err());
        assert!(toggle_completed_impl(&state, "x".to_string()).is_err());
        assert!(upsert_energy_level_impl(&state, "2026-02-18".to_string(), 3, Some(9)).is_err());

        let snapshot = get_calendar_snapshot_impl(&state).expect("snapshot");
        assert_eq!(snapshot.time_blocks, before);
        assert!(snapshot.energy_levels.is_empty());
        let notice = snapshot.notice.expect("error notice");
        assert!(notice.message.contains("could not save changes"));
    }

    #[test]
    fn invalid_draft_sets_error_notice() {
        let state = empty_state();
        open_form_impl(&state, None).expect("open form");
        let result = save_time_block_impl(&state, draft("Read", "2026-02-18", "21:00", "20:00"));
        assert!(matches!(result, Err(InfraError::Calendar(_))));

        let snapshot = get_calendar_snapshot_impl(&state).expect("snapshot");
        assert!(snapshot.notice.is_some());
        assert!(matches!(snapshot.overlay, UiOverlay::FormOpen { editing: None }));
        assert!(snapshot.form_draft.is_some());

        let dismissed = dismiss_notice_impl(&state).expect("dismiss");
        assert!(dismissed.notice.is_none());
    }

    #[test]
    fn edit_form_exposes_prefilled_draft() {
        let state = empty_state();
        let created = quick_add_impl(&state, "2026-02-18".to_string(), 10, "Review".to_string())
            .expect("quick add");
        let block_id = created.time_blocks[0].id.clone();

        let opened = open_form_impl(&state, Some(format!(" {block_id} "))).expect("open edit");
        let form_draft = opened.form_draft.expect("draft");
        assert_eq!(form_draft.title, "Review");
        assert_eq!(form_draft.start_time, "10:00");

        let saved = save_time_block_impl(&state, draft("Review PRs", "2026-02-18", "10:00", "12:00"))
            .expect("save edit");
        assert_eq!(saved.time_blocks.len(), 1);
        assert_eq!(saved.time_blocks[0].id, block_id);
        assert_eq!(saved.time_blocks[0].end_time.to_string(), "12:00");
        assert_eq!(saved.overlay, UiOverlay::Closed);
    }

    #[test]
    fn week_navigation_updates_title_and_grid() {
        let state = empty_state();
        let snapshot = set_anchor_date_impl(&state, "2026-02-18".to_string()).expect("anchor");
        assert_eq!(snapshot.grid.title, "Feb 16 - Feb 22, 2026");

        let next = navigate_next_impl(&state).expect("next");
        assert_eq!(next.anchor_date.to_string(), "2026-02-25");
        assert_eq!(next.grid.title, "Feb 23 - Mar 1, 2026");

        let month = set_view_impl(&state, "Month".to_string()).expect("month");
        assert!(matches!(month.grid.layout, GridLayout::Month(_)));
        assert!(month.grid.energy_overlay.is_none());

        let previous = navigate_previous_impl(&state).expect("previous");
        assert_eq!(previous.anchor_date.to_string(), "2026-01-25");

        let today = go_to_today_impl(&state).expect("today");
        assert_eq!(today.anchor_date, state.today());
    }

    #[test]
    fn input_validation_rejects_bad_arguments() {
        let state = empty_state();
        assert!(matches!(
            set_view_impl(&state, "year".to_string()),
            Err(InfraError::InvalidInput(_))
        ));
        assert!(matches!(
            set_anchor_date_impl(&state, "02/18/2026".to_string()),
            Err(InfraError::InvalidInput(_))
        ));
        assert!(matches!(
            delete_time_block_impl(&state, "  ".to_string()),
            Err(InfraError::InvalidInput(_))
        ));
        assert!(matches!(
            upsert_energy_level_impl(&state, "2026-02-18".to_string(), 7, None),
            Err(InfraError::Calendar(_))
        ));
    }

    #[test]
    fn toggles_and_quick_add_popup_flow() {
        let state = empty_state();
        let popup = open_quick_add_impl(&state, "2026-02-18".to_string(), 13, 120.0, 48.0)
            .expect("open popup");
        assert!(matches!(popup.overlay, UiOverlay::QuickAddOpen { hour: 13, .. }));

        let added = quick_add_impl(&state, "2026-02-18".to_string(), 13, "Lunch walk".to_string())
            .expect("quick add");
        assert_eq!(added.overlay, UiOverlay::Closed);
        let block_id = added.time_blocks[0].id.clone();

        toggle_completed_impl(&state, block_id.clone()).expect("toggle");
        let hidden = toggle_show_completed_impl(&state).expect("hide completed");
        assert_eq!(hidden.grid.visible_count, 0);
        assert_eq!(hidden.time_blocks.len(), 1);

        cancel_drag_impl(&state).expect("cancel without drag");
        close_overlay_impl(&state).expect("close");
    }

    #[test]
    fn route_resolution_is_exposed() {
        assert_eq!(resolve_route_impl("/calendar".to_string()).page, Page::Calendar);
    }
}
