pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::application::bootstrap::bootstrap_workspace;
    use crate::application::commands::{
        begin_drag_impl, cancel_drag_impl, close_overlay_impl, delete_time_block_impl,
        dismiss_notice_impl, drag_over_impl, drop_drag_impl, get_calendar_snapshot_impl,
        go_to_today_impl, navigate_next_impl, navigate_previous_impl, open_form_impl,
        open_quick_add_impl, quick_add_impl, resolve_route_impl, save_time_block_impl,
        set_anchor_date_impl, set_view_impl, toggle_completed_impl, toggle_show_completed_impl,
        upsert_energy_level_impl, AppState, CalendarSnapshotResponse,
    };
    use crate::application::routes::ResolvedRoute;
    use crate::domain::form::TimeBlockDraft;
    use crate::infrastructure::logging::init_logging;
    use serde::Serialize;
    use std::path::PathBuf;

    type CommandResult = Result<CalendarSnapshotResponse, String>;

    #[derive(Debug, Serialize)]
    struct BootstrapResponse {
        workspace_root: String,
        database_path: String,
    }

    #[tauri::command]
    fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
        let workspace_root = match root {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir().map_err(|error| error.to_string())?,
        };

        let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
        Ok(BootstrapResponse {
            workspace_root: result.workspace_root.display().to_string(),
            database_path: result.database_path.display().to_string(),
        })
    }

    #[tauri::command]
    fn ping() -> &'static str {
        "pong"
    }

    #[tauri::command]
    fn resolve_route(path: String) -> ResolvedRoute {
        resolve_route_impl(path)
    }

    #[tauri::command]
    fn get_calendar_snapshot(state: tauri::State<'_, AppState>) -> CommandResult {
        get_calendar_snapshot_impl(state.inner())
            .map_err(|error| state.command_error("get_calendar_snapshot", &error))
    }

    #[tauri::command]
    fn navigate_previous(state: tauri::State<'_, AppState>) -> CommandResult {
        navigate_previous_impl(state.inner())
            .map_err(|error| state.command_error("navigate_previous", &error))
    }

    #[tauri::command]
    fn navigate_next(state: tauri::State<'_, AppState>) -> CommandResult {
        navigate_next_impl(state.inner()).map_err(|error| state.command_error("navigate_next", &error))
    }

    #[tauri::command]
    fn go_to_today(state: tauri::State<'_, AppState>) -> CommandResult {
        go_to_today_impl(state.inner()).map_err(|error| state.command_error("go_to_today", &error))
    }

    #[tauri::command]
    fn set_anchor_date(state: tauri::State<'_, AppState>, date: String) -> CommandResult {
        set_anchor_date_impl(state.inner(), date)
            .map_err(|error| state.command_error("set_anchor_date", &error))
    }

    #[tauri::command]
    fn set_view(state: tauri::State<'_, AppState>, view: String) -> CommandResult {
        set_view_impl(state.inner(), view).map_err(|error| state.command_error("set_view", &error))
    }

    #[tauri::command]
    fn toggle_show_completed(state: tauri::State<'_, AppState>) -> CommandResult {
        toggle_show_completed_impl(state.inner())
            .map_err(|error| state.command_error("toggle_show_completed", &error))
    }

    #[tauri::command]
    fn upsert_energy_level(
        state: tauri::State<'_, AppState>,
        date: String,
        level: u8,
        hour: Option<u8>,
    ) -> CommandResult {
        upsert_energy_level_impl(state.inner(), date, level, hour)
            .map_err(|error| state.command_error("upsert_energy_level", &error))
    }

    #[tauri::command]
    fn open_form(state: tauri::State<'_, AppState>, block_id: Option<String>) -> CommandResult {
        open_form_impl(state.inner(), block_id).map_err(|error| state.command_error("open_form", &error))
    }

    #[tauri::command]
    fn open_quick_add(
        state: tauri::State<'_, AppState>,
        date: String,
        hour: u8,
        x: f64,
        y: f64,
    ) -> CommandResult {
        open_quick_add_impl(state.inner(), date, hour, x, y)
            .map_err(|error| state.command_error("open_quick_add", &error))
    }

    #[tauri::command]
    fn close_overlay(state: tauri::State<'_, AppState>) -> CommandResult {
        close_overlay_impl(state.inner()).map_err(|error| state.command_error("close_overlay", &error))
    }

    #[tauri::command]
    fn save_time_block(state: tauri::State<'_, AppState>, draft: TimeBlockDraft) -> CommandResult {
        save_time_block_impl(state.inner(), draft)
            .map_err(|error| state.command_error("save_time_block", &error))
    }

    #[tauri::command]
    fn delete_time_block(state: tauri::State<'_, AppState>, block_id: String) -> CommandResult {
        delete_time_block_impl(state.inner(), block_id)
            .map_err(|error| state.command_error("delete_time_block", &error))
    }

    #[tauri::command]
    fn toggle_completed(state: tauri::State<'_, AppState>, block_id: String) -> CommandResult {
        toggle_completed_impl(state.inner(), block_id)
            .map_err(|error| state.command_error("toggle_completed", &error))
    }

    #[tauri::command]
    fn quick_add(
        state: tauri::State<'_, AppState>,
        date: String,
        hour: u8,
        title: String,
    ) -> CommandResult {
        quick_add_impl(state.inner(), date, hour, title)
            .map_err(|error| state.command_error("quick_add", &error))
    }

    #[tauri::command]
    fn begin_drag(state: tauri::State<'_, AppState>, block_id: String) -> CommandResult {
        begin_drag_impl(state.inner(), block_id).map_err(|error| state.command_error("begin_drag", &error))
    }

    #[tauri::command]
    fn drag_over(state: tauri::State<'_, AppState>, date: String, hour: u8) -> CommandResult {
        drag_over_impl(state.inner(), date, hour).map_err(|error| state.command_error("drag_over", &error))
    }

    #[tauri::command]
    fn drop_drag(state: tauri::State<'_, AppState>) -> CommandResult {
        drop_drag_impl(state.inner()).map_err(|error| state.command_error("drop_drag", &error))
    }

    #[tauri::command]
    fn cancel_drag(state: tauri::State<'_, AppState>) -> CommandResult {
        cancel_drag_impl(state.inner()).map_err(|error| state.command_error("cancel_drag", &error))
    }

    #[tauri::command]
    fn dismiss_notice(state: tauri::State<'_, AppState>) -> CommandResult {
        dismiss_notice_impl(state.inner()).map_err(|error| state.command_error("dismiss_notice", &error))
    }

    pub fn run() {
        let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
        if let Err(error) = init_logging(&workspace_root.join("logs")) {
            eprintln!("failed to initialize command log: {error}");
        }
        let app_state = AppState::new(workspace_root).expect("failed to initialize app state");
        tracing::info!(
            logs_dir = %app_state.logs_dir().display(),
            database = %app_state.database_path().display(),
            "calendar backend ready"
        );

        tauri::Builder::default()
            .manage(app_state)
            .invoke_handler(tauri::generate_handler![
                ping,
                bootstrap,
                resolve_route,
                get_calendar_snapshot,
                navigate_previous,
                navigate_next,
                go_to_today,
                set_anchor_date,
                set_view,
                toggle_show_completed,
                upsert_energy_level,
                open_form,
                open_quick_add,
                close_overlay,
                save_time_block,
                delete_time_block,
                toggle_completed,
                quick_add,
                begin_drag,
                drag_over,
                drop_drag,
                cancel_drag,
                dismiss_notice
            ])
            .run(tauri::generate_context!())
            .expect("failed to run tauri app");
    }
}

#[cfg(feature = "desktop")]
pub use desktop::run;
