use crate::domain::energy::upsert_energy_level;
use crate::domain::error::CalendarError;
use crate::domain::grid::{self, CalendarGrid, Direction, GridQuery};
use crate::domain::models::{
    normalize_optional, CalendarView, ClockTime, EnergyLevel, TimeBlock, TimeBlockPayload,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUICK_ADD_CATEGORY: &str = "Work";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PopupPosition {
    pub x: f64,
    pub y: f64,
}

/// The one surface layered over the grid, if any.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiOverlay {
    #[default]
    Closed,
    FormOpen {
        editing: Option<String>,
    },
    QuickAddOpen {
        position: PopupPosition,
        date: NaiveDate,
        hour: u8,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DropTarget {
    pub date: NaiveDate,
    pub hour: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PendingDrag {
    pub block_id: String,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarAction {
    NavigatePrevious,
    NavigateNext,
    GoToToday,
    SetAnchorDate(NaiveDate),
    SetView(CalendarView),
    ToggleShowCompleted,
    UpsertEnergyLevel {
        date: NaiveDate,
        level: u8,
        hour: Option<u8>,
    },
    OpenForm(Option<String>),
    OpenQuickAdd {
        position: PopupPosition,
        date: NaiveDate,
        hour: u8,
    },
    CloseOverlay,
    SaveTimeBlock(TimeBlockPayload),
    DeleteTimeBlock(String),
    ToggleCompleted(String),
    QuickAdd {
        date: NaiveDate,
        hour: u8,
        title: String,
    },
    BeginDrag(String),
    DragOver {
        date: NaiveDate,
        hour: u8,
    },
    Drop,
    CancelDrag,
    DismissNotice,
}

impl CalendarAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NavigatePrevious => "navigate_previous",
            Self::NavigateNext => "navigate_next",
            Self::GoToToday => "go_to_today",
            Self::SetAnchorDate(_) => "set_anchor_date",
            Self::SetView(_) => "set_view",
            Self::ToggleShowCompleted => "toggle_show_completed",
            Self::UpsertEnergyLevel { .. } => "upsert_energy_level",
            Self::OpenForm(_) => "open_form",
            Self::OpenQuickAdd { .. } => "open_quick_add",
            Self::CloseOverlay => "close_overlay",
            Self::SaveTimeBlock(_) => "save_time_block",
            Self::DeleteTimeBlock(_) => "delete_time_block",
            Self::ToggleCompleted(_) => "toggle_completed",
            Self::QuickAdd { .. } => "quick_add",
            Self::BeginDrag(_) => "begin_drag",
            Self::DragOver { .. } => "drag_over",
            Self::Drop => "drop",
            Self::CancelDrag => "cancel_drag",
            Self::DismissNotice => "dismiss_notice",
        }
    }

    fn writes_collections(&self) -> bool {
        matches!(
            self,
            Self::UpsertEnergyLevel { .. }
                | Self::SaveTimeBlock(_)
                | Self::DeleteTimeBlock(_)
                | Self::ToggleCompleted(_)
                | Self::QuickAdd { .. }
                | Self::Drop
        )
    }
}

/// Collection change the caller may want to write through to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BlockSaved(TimeBlock),
    BlockRemoved(String),
    EnergySaved(EnergyLevel),
}

pub struct ActionContext<'a> {
    pub today: NaiveDate,
    pub next_id: &'a mut dyn FnMut() -> String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    pub time_blocks: Vec<TimeBlock>,
    pub energy_levels: Vec<EnergyLevel>,
    pub view: CalendarView,
    pub anchor_date: NaiveDate,
    pub show_completed: bool,
    pub overlay: UiOverlay,
    pub pending_drag: Option<PendingDrag>,
    pub notice: Option<Notice>,
    pub quick_add_category: String,
}

impl CalendarState {
    pub fn new(anchor_date: NaiveDate) -> Self {
        Self {
            time_blocks: Vec::new(),
            energy_levels: Vec::new(),
            view: CalendarView::default(),
            anchor_date,
            show_completed: true,
            overlay: UiOverlay::Closed,
            pending_drag: None,
            notice: None,
            quick_add_category: DEFAULT_QUICK_ADD_CATEGORY.to_string(),
        }
    }

    pub fn block(&self, block_id: &str) -> Option<&TimeBlock> {
        self.time_blocks.iter().find(|block| block.id == block_id)
    }

    pub fn grid(&self, today: NaiveDate) -> CalendarGrid {
        grid::derive_grid(
            &self.time_blocks,
            &self.energy_levels,
            GridQuery {
                view: self.view,
                anchor: self.anchor_date,
                show_completed: self.show_completed,
                today,
            },
        )
    }

    pub fn visible_time_blocks(&self) -> Vec<&TimeBlock> {
        grid::visible_time_blocks(
            &self.time_blocks,
            self.view,
            self.anchor_date,
            self.show_completed,
        )
    }

    /// Applies one action. A failure is also left on `notice` so the front
    /// end can show it; the next successful write clears it.
    pub fn dispatch(
        &mut self,
        action: CalendarAction,
        context: &mut ActionContext<'_>,
    ) -> Result<Option<Effect>, CalendarError> {
        let writes = action.writes_collections();
        match self.apply(action, context) {
            Ok(effect) => {
                if writes {
                    self.notice = None;
                }
                Ok(effect)
            }
            Err(error) => {
                self.notice = Some(Notice::error(error.to_string()));
                Err(error)
            }
        }
    }

    fn apply(
        &mut self,
        action: CalendarAction,
        context: &mut ActionContext<'_>,
    ) -> Result<Option<Effect>, CalendarError> {
        match action {
            CalendarAction::NavigatePrevious => {
                self.anchor_date = grid::shift_anchor(self.view, self.anchor_date, Direction::Previous);
                Ok(None)
            }
            CalendarAction::NavigateNext => {
                self.anchor_date = grid::shift_anchor(self.view, self.anchor_date, Direction::Next);
                Ok(None)
            }
            CalendarAction::GoToToday => {
                self.anchor_date = context.today;
                Ok(None)
            }
            CalendarAction::SetAnchorDate(date) => {
                self.anchor_date = date;
                Ok(None)
            }
            CalendarAction::SetView(view) => {
                self.view = view;
                Ok(None)
            }
            CalendarAction::ToggleShowCompleted => {
                self.show_completed = !self.show_completed;
                Ok(None)
            }
            CalendarAction::UpsertEnergyLevel { date, level, hour } => {
                let entry = EnergyLevel { date, level, hour };
                entry.validate()?;
                upsert_energy_level(&mut self.energy_levels, entry.clone());
                Ok(Some(Effect::EnergySaved(entry)))
            }
            CalendarAction::OpenForm(editing) => {
                if let Some(block_id) = editing.as_deref() {
                    if self.block(block_id).is_none() {
                        return Err(CalendarError::BlockNotFound(block_id.to_string()));
                    }
                }
                self.overlay = UiOverlay::FormOpen { editing };
                Ok(None)
            }
            CalendarAction::OpenQuickAdd {
                position,
                date,
                hour,
            } => {
                validate_hour(hour)?;
                self.overlay = UiOverlay::QuickAddOpen {
                    position,
                    date,
                    hour,
                };
                Ok(None)
            }
            CalendarAction::CloseOverlay => {
                self.overlay = UiOverlay::Closed;
                Ok(None)
            }
            CalendarAction::SaveTimeBlock(payload) => self.save_time_block(payload, context),
            CalendarAction::DeleteTimeBlock(block_id) => Ok(self.delete_time_block(&block_id)),
            CalendarAction::ToggleCompleted(block_id) => {
                let Some(block) = self
                    .time_blocks
                    .iter_mut()
                    .find(|block| block.id == block_id)
                else {
                    return Ok(None);
                };
                block.completed = !block.completed;
                Ok(Some(Effect::BlockSaved(block.clone())))
            }
            CalendarAction::QuickAdd { date, hour, title } => {
                self.quick_add(date, hour, &title, context)
            }
            CalendarAction::BeginDrag(block_id) => {
                if self.block(&block_id).is_none() {
                    return Err(CalendarError::BlockNotFound(block_id));
                }
                self.pending_drag = Some(PendingDrag {
                    block_id,
                    target: None,
                });
                Ok(None)
            }
            CalendarAction::DragOver { date, hour } => {
                validate_hour(hour)?;
                if let Some(pending) = self.pending_drag.as_mut() {
                    pending.target = Some(DropTarget { date, hour });
                }
                Ok(None)
            }
            CalendarAction::Drop => self.drop_pending(),
            CalendarAction::CancelDrag => {
                self.pending_drag = None;
                Ok(None)
            }
            CalendarAction::DismissNotice => {
                self.notice = None;
                Ok(None)
            }
        }
    }

    fn save_time_block(
        &mut self,
        payload: TimeBlockPayload,
        context: &mut ActionContext<'_>,
    ) -> Result<Option<Effect>, CalendarError> {
        payload.validate()?;

        let editing = match &self.overlay {
            UiOverlay::FormOpen { editing } => editing.clone(),
            _ => None,
        };

        let saved = match editing {
            Some(block_id) => {
                let Some(existing) = self
                    .time_blocks
                    .iter_mut()
                    .find(|block| block.id == block_id)
                else {
                    return Err(CalendarError::BlockNotFound(block_id));
                };
                let updated = payload.into_block(existing.id.clone(), existing.completed);
                *existing = updated.clone();
                updated
            }
            None => {
                let block = payload.into_block((context.next_id)(), false);
                self.time_blocks.push(block.clone());
                block
            }
        };

        self.overlay = UiOverlay::Closed;
        Ok(Some(Effect::BlockSaved(saved)))
    }

    fn delete_time_block(&mut self, block_id: &str) -> Option<Effect> {
        let position = self
            .time_blocks
            .iter()
            .position(|block| block.id == block_id)?;
        self.time_blocks.remove(position);

        if matches!(&self.overlay, UiOverlay::FormOpen { editing: Some(editing) } if editing == block_id)
        {
            self.overlay = UiOverlay::Closed;
        }
        if self
            .pending_drag
            .as_ref()
            .is_some_and(|pending| pending.block_id == block_id)
        {
            self.pending_drag = None;
        }
        Some(Effect::BlockRemoved(block_id.to_string()))
    }

    fn quick_add(
        &mut self,
        date: NaiveDate,
        hour: u8,
        title: &str,
        context: &mut ActionContext<'_>,
    ) -> Result<Option<Effect>, CalendarError> {
        validate_hour(hour)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(CalendarError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        let (start_time, end_time) = hour_span(hour, 1)?;

        let block = TimeBlock {
            id: (context.next_id)(),
            title: title.to_string(),
            description: None,
            start_time,
            end_time,
            date,
            category: normalize_optional(Some(self.quick_add_category.clone())),
            completed: false,
        };
        self.time_blocks.push(block.clone());
        if matches!(self.overlay, UiOverlay::QuickAddOpen { .. }) {
            self.overlay = UiOverlay::Closed;
        }
        Ok(Some(Effect::BlockSaved(block)))
    }

    fn drop_pending(&mut self) -> Result<Option<Effect>, CalendarError> {
        let Some(PendingDrag {
            block_id,
            target: Some(target),
        }) = self.pending_drag.take()
        else {
            return Ok(None);
        };
        let Some(block) = self
            .time_blocks
            .iter_mut()
            .find(|block| block.id == block_id)
        else {
            return Ok(None);
        };

        let (start_time, end_time) = match block.whole_hour_span() {
            // Start and end share an hour: keep the block's minute length.
            0 => {
                validate_hour(target.hour)?;
                let minutes = block
                    .end_time
                    .minutes_since_midnight()
                    .saturating_sub(block.start_time.minutes_since_midnight());
                let start = ClockTime::on_the_hour(target.hour);
                let end = u8::try_from(minutes)
                    .ok()
                    .and_then(|minute| ClockTime::from_hm(target.hour, minute));
                match (start, end) {
                    (Some(start), Some(end)) => (start, end),
                    _ => {
                        return Err(CalendarError::Validation(format!(
                            "a {minutes}-minute block cannot start at {:02}:00",
                            target.hour
                        )));
                    }
                }
            }
            span => hour_span(target.hour, span)?,
        };
        block.date = target.date;
        block.start_time = start_time;
        block.end_time = end_time;
        Ok(Some(Effect::BlockSaved(block.clone())))
    }
}

fn validate_hour(hour: u8) -> Result<(), CalendarError> {
    if hour > 23 {
        return Err(CalendarError::Validation(
            "hour must be between 0 and 23".to_string(),
        ));
    }
    Ok(())
}

fn hour_span(start_hour: u8, hours: u8) -> Result<(ClockTime, ClockTime), CalendarError> {
    let start = ClockTime::on_the_hour(start_hour);
    let end = start_hour
        .checked_add(hours)
        .and_then(ClockTime::on_the_hour);
    match (start, end) {
        (Some(start), Some(end)) if start < ClockTime::END_OF_DAY => Ok((start, end)),
        _ => Err(CalendarError::Validation(format!(
            "a {hours}-hour block starting at {start_hour:02}:00 would end after midnight"
        ))),
    }
}
