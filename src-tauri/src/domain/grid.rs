//! Pure derivations from calendar state to what the front end draws.
//!
//! Nothing here mutates; every function recomputes from the block list, the
//! view mode and the anchor date.

use crate::domain::energy::{energy_overlay, EnergyOverlay};
use crate::domain::models::{CalendarView, CategoryTone, EnergyLevel, TimeBlock};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

pub const HOURS_PER_DAY: u8 = 24;
pub const DAYS_PER_WEEK: usize = 7;
pub const MONTH_GRID_CELLS: usize = 42;
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Inclusive date range covered by a view.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn view_range(view: CalendarView, anchor: NaiveDate) -> DateRange {
    match view {
        CalendarView::Day => DateRange {
            start: anchor,
            end: anchor,
        },
        CalendarView::Week => {
            let start = week_start(anchor);
            DateRange {
                start,
                end: start.checked_add_days(Days::new(6)).unwrap_or(start),
            }
        }
        CalendarView::Month => DateRange {
            start: month_start(anchor),
            end: month_end(anchor),
        },
    }
}

/// One day, seven days or one calendar month. Month steps clamp to the last
/// valid day (Jan 31 -> Feb 28). The anchor stays put if the step overflows.
pub fn shift_anchor(view: CalendarView, anchor: NaiveDate, direction: Direction) -> NaiveDate {
    let shifted = match (view, direction) {
        (CalendarView::Day, Direction::Next) => anchor.checked_add_days(Days::new(1)),
        (CalendarView::Day, Direction::Previous) => anchor.checked_sub_days(Days::new(1)),
        (CalendarView::Week, Direction::Next) => anchor.checked_add_days(Days::new(7)),
        (CalendarView::Week, Direction::Previous) => anchor.checked_sub_days(Days::new(7)),
        (CalendarView::Month, Direction::Next) => anchor.checked_add_months(Months::new(1)),
        (CalendarView::Month, Direction::Previous) => anchor.checked_sub_months(Months::new(1)),
    };
    shifted.unwrap_or(anchor)
}

pub fn header_title(view: CalendarView, anchor: NaiveDate) -> String {
    match view {
        CalendarView::Day => anchor.format("%B %-d, %Y").to_string(),
        CalendarView::Week => {
            let range = view_range(view, anchor);
            format!(
                "{} - {}",
                range.start.format("%b %-d"),
                range.end.format("%b %-d, %Y")
            )
        }
        CalendarView::Month => anchor.format("%B %Y").to_string(),
    }
}

pub fn is_visible(
    block: &TimeBlock,
    view: CalendarView,
    anchor: NaiveDate,
    show_completed: bool,
) -> bool {
    (show_completed || !block.completed) && view_range(view, anchor).contains(block.date)
}

pub fn visible_time_blocks<'a>(
    blocks: &'a [TimeBlock],
    view: CalendarView,
    anchor: NaiveDate,
    show_completed: bool,
) -> Vec<&'a TimeBlock> {
    blocks
        .iter()
        .filter(|block| is_visible(block, view, anchor, show_completed))
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockCard {
    #[serde(flatten)]
    pub block: TimeBlock,
    pub tone: CategoryTone,
}

impl BlockCard {
    fn from_block(block: &TimeBlock) -> Self {
        Self {
            tone: CategoryTone::for_category(block.category.as_deref()),
            block: block.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HourRow {
    pub hour: u8,
    pub label: String,
    pub blocks: Vec<BlockCard>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DayGrid {
    pub date: NaiveDate,
    pub is_today: bool,
    pub rows: Vec<HourRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekDayHeader {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u32,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekRow {
    pub hour: u8,
    pub label: String,
    /// One cell per weekday, Monday first.
    pub cells: Vec<Vec<BlockCard>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekGrid {
    pub days: Vec<WeekDayHeader>,
    pub rows: Vec<WeekRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub day_number: u32,
    pub in_current_month: bool,
    pub is_today: bool,
    pub blocks: Vec<BlockCard>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthGrid {
    pub weekday_labels: Vec<String>,
    pub cells: Vec<MonthCell>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum GridLayout {
    Day(DayGrid),
    Week(WeekGrid),
    Month(MonthGrid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridQuery {
    pub view: CalendarView,
    pub anchor: NaiveDate,
    pub show_completed: bool,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarGrid {
    pub view: CalendarView,
    pub anchor_date: NaiveDate,
    pub title: String,
    pub range: DateRange,
    pub layout: GridLayout,
    pub energy_overlay: Option<EnergyOverlay>,
    pub visible_count: usize,
    pub is_empty: bool,
}

fn hour_label(hour: u8) -> String {
    format!("{hour:02}:00")
}

fn cards_for(blocks: &[&TimeBlock], date: NaiveDate, hour: Option<u8>) -> Vec<BlockCard> {
    blocks
        .iter()
        .filter(|block| block.date == date)
        .filter(|block| hour.is_none_or(|hour| block.start_hour() == hour))
        .map(|block| BlockCard::from_block(block))
        .collect()
}

pub fn day_grid(visible: &[&TimeBlock], date: NaiveDate, today: NaiveDate) -> DayGrid {
    DayGrid {
        date,
        is_today: date == today,
        rows: (0..HOURS_PER_DAY)
            .map(|hour| HourRow {
                hour,
                label: hour_label(hour),
                blocks: cards_for(visible, date, Some(hour)),
            })
            .collect(),
    }
}

pub fn week_grid(visible: &[&TimeBlock], anchor: NaiveDate, today: NaiveDate) -> WeekGrid {
    let start = week_start(anchor);
    let dates = (0..DAYS_PER_WEEK as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect::<Vec<_>>();

    WeekGrid {
        days: dates
            .iter()
            .map(|date| WeekDayHeader {
                date: *date,
                day_name: date.format("%a").to_string(),
                day_number: date.day(),
                is_today: *date == today,
            })
            .collect(),
        rows: (0..HOURS_PER_DAY)
            .map(|hour| WeekRow {
                hour,
                label: hour_label(hour),
                cells: dates
                    .iter()
                    .map(|date| cards_for(visible, *date, Some(hour)))
                    .collect(),
            })
            .collect(),
    }
}

/// Six full weeks starting on the Monday on or before the first of the month.
pub fn month_grid_dates(anchor: NaiveDate) -> Vec<NaiveDate> {
    let start = week_start(month_start(anchor));
    (0..MONTH_GRID_CELLS as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

pub fn month_grid(blocks: &[&TimeBlock], anchor: NaiveDate, today: NaiveDate) -> MonthGrid {
    MonthGrid {
        weekday_labels: WEEKDAY_LABELS.iter().map(|label| label.to_string()).collect(),
        cells: month_grid_dates(anchor)
            .into_iter()
            .map(|date| MonthCell {
                date,
                day_number: date.day(),
                in_current_month: date.year() == anchor.year() && date.month() == anchor.month(),
                is_today: date == today,
                blocks: cards_for(blocks, date, None),
            })
            .collect(),
    }
}

pub fn derive_grid(blocks: &[TimeBlock], energy: &[EnergyLevel], query: GridQuery) -> CalendarGrid {
    let visible = visible_time_blocks(blocks, query.view, query.anchor, query.show_completed);
    let layout = match query.view {
        CalendarView::Day => GridLayout::Day(day_grid(&visible, query.anchor, query.today)),
        CalendarView::Week => GridLayout::Week(week_grid(&visible, query.anchor, query.today)),
        CalendarView::Month => {
            // Leading and trailing cells belong to neighbouring months but
            // still show their blocks.
            let grid_dates = month_grid_dates(query.anchor);
            let (first, last) = match (grid_dates.first(), grid_dates.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => (query.anchor, query.anchor),
            };
            let padded = blocks
                .iter()
                .filter(|block| query.show_completed || !block.completed)
                .filter(|block| first <= block.date && block.date <= last)
                .collect::<Vec<_>>();
            GridLayout::Month(month_grid(&padded, query.anchor, query.today))
        }
    };

    CalendarGrid {
        view: query.view,
        anchor_date: query.anchor,
        title: header_title(query.view, query.anchor),
        range: view_range(query.view, query.anchor),
        layout,
        energy_overlay: energy_overlay(query.view, energy),
        visible_count: visible.len(),
        is_empty: visible.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ClockTime;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn block(id: &str, date: &str, start: &str, end: &str, completed: bool) -> TimeBlock {
        TimeBlock {
            id: id.to_string(),
            title: format!("Block {id}"),
            description: None,
            start_time: ClockTime::parse(start).expect("start"),
            end_time: ClockTime::parse(end).expect("end"),
            date: day(date),
            category: Some("Work".to_string()),
            completed,
        }
    }

    fn query(view: CalendarView, anchor: &str) -> GridQuery {
        GridQuery {
            view,
            anchor: day(anchor),
            show_completed: true,
            today: day("2026-02-18"),
        }
    }

    #[test]
    fn week_range_starts_on_monday() {
        let range = view_range(CalendarView::Week, day("2026-02-18"));
        assert_eq!(range.start, day("2026-02-16"));
        assert_eq!(range.end, day("2026-02-22"));

        let sunday = view_range(CalendarView::Week, day("2026-02-22"));
        assert_eq!(sunday.start, day("2026-02-16"));
    }

    #[test]
    fn month_range_covers_calendar_month() {
        let range = view_range(CalendarView::Month, day("2024-02-10"));
        assert_eq!(range.start, day("2024-02-01"));
        assert_eq!(range.end, day("2024-02-29"));
    }

    #[test]
    fn next_week_from_wednesday_moves_seven_days_and_retitles() {
        let anchor = day("2026-02-18");
        assert_eq!(
            header_title(CalendarView::Week, anchor),
            "Feb 16 - Feb 22, 2026"
        );
        let next = shift_anchor(CalendarView::Week, anchor, Direction::Next);
        assert_eq!(next, day("2026-02-25"));
        assert_eq!(header_title(CalendarView::Week, next), "Feb 23 - Mar 1, 2026");
    }

    #[test]
    fn month_navigation_clamps_to_last_day() {
        let next = shift_anchor(CalendarView::Month, day("2026-01-31"), Direction::Next);
        assert_eq!(next, day("2026-02-28"));
        let previous = shift_anchor(CalendarView::Month, day("2026-03-31"), Direction::Previous);
        assert_eq!(previous, day("2026-02-28"));
        assert_eq!(
            shift_anchor(CalendarView::Day, day("2026-03-01"), Direction::Previous),
            day("2026-02-28")
        );
    }

    #[test]
    fn header_titles_per_view() {
        assert_eq!(header_title(CalendarView::Day, day("2026-02-05")), "February 5, 2026");
        assert_eq!(header_title(CalendarView::Month, day("2026-02-05")), "February 2026");
    }

    #[test]
    fn completed_blocks_hidden_when_toggle_off() {
        let blocks = vec![
            block("1", "2026-02-18", "07:00", "07:30", true),
            block("2", "2026-02-18", "08:30", "09:30", false),
        ];
        let visible = visible_time_blocks(&blocks, CalendarView::Day, day("2026-02-18"), false);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "2");
    }

    #[test]
    fn day_grid_places_blocks_by_start_hour_only() {
        let blocks = vec![
            block("1", "2026-02-18", "08:30", "09:30", false),
            block("2", "2026-02-18", "08:00", "08:15", false),
            block("3", "2026-02-19", "08:00", "09:00", false),
        ];
        let grid = derive_grid(&blocks, &[], query(CalendarView::Day, "2026-02-18"));
        let GridLayout::Day(day_grid) = grid.layout else {
            panic!("expected day layout");
        };
        assert_eq!(day_grid.rows.len(), 24);
        assert!(day_grid.is_today);
        assert_eq!(day_grid.rows[8].label, "08:00");
        assert_eq!(day_grid.rows[8].blocks.len(), 2);
        assert!(day_grid.rows[9].blocks.is_empty());
        assert_eq!(grid.visible_count, 2);
    }

    #[test]
    fn week_grid_has_monday_to_sunday_columns() {
        let blocks = vec![
            block("1", "2026-02-16", "10:00", "11:00", false),
            block("2", "2026-02-22", "18:00", "19:00", false),
            block("3", "2026-02-23", "18:00", "19:00", false),
        ];
        let grid = derive_grid(&blocks, &[], query(CalendarView::Week, "2026-02-18"));
        let GridLayout::Week(week) = grid.layout else {
            panic!("expected week layout");
        };
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].day_name, "Mon");
        assert_eq!(week.days[6].date, day("2026-02-22"));
        assert!(week.days[2].is_today);
        assert_eq!(week.rows[10].cells[0].len(), 1);
        assert_eq!(week.rows[18].cells[6].len(), 1);
        assert_eq!(grid.visible_count, 2);
        assert!(grid.energy_overlay.is_some());
    }

    #[test]
    fn month_grid_marks_outside_days_but_keeps_their_blocks() {
        let blocks = vec![
            block("1", "2026-01-26", "09:00", "10:00", false),
            block("2", "2026-02-10", "09:00", "10:00", false),
        ];
        let grid = derive_grid(&blocks, &[], query(CalendarView::Month, "2026-02-10"));
        assert!(grid.energy_overlay.is_none());
        assert_eq!(grid.visible_count, 1);
        let GridLayout::Month(month) = grid.layout else {
            panic!("expected month layout");
        };
        assert_eq!(month.cells.len(), MONTH_GRID_CELLS);
        assert_eq!(month.cells[0].date, day("2026-01-26"));
        assert!(!month.cells[0].in_current_month);
        assert_eq!(month.cells[0].blocks.len(), 1);
        assert_eq!(month.cells[0].blocks[0].tone, CategoryTone::Blue);
    }

    #[test]
    fn empty_state_flag_follows_visible_blocks() {
        let grid = derive_grid(&[], &[], query(CalendarView::Week, "2026-02-18"));
        assert!(grid.is_empty);
    }

    proptest! {
        #[test]
        fn month_grid_is_always_42_cells_from_monday(
            year in 1970i32..2200i32,
            month in 1u32..=12u32,
            day_of_month in 1u32..=28u32
        ) {
            let anchor = NaiveDate::from_ymd_opt(year, month, day_of_month).expect("valid date");
            let dates = month_grid_dates(anchor);
            let first_of_month = month_start(anchor);
            prop_assert_eq!(dates.len(), MONTH_GRID_CELLS);
            prop_assert_eq!(dates[0].weekday(), Weekday::Mon);
            prop_assert!(dates[0] <= first_of_month);
            prop_assert!((first_of_month - dates[0]).num_days() < 7);
            prop_assert!(dates[MONTH_GRID_CELLS - 1] >= month_end(anchor));
        }

        #[test]
        fn visibility_matches_range_and_completed_filter(
            offset in -60i64..60i64,
            completed in any::<bool>(),
            show_completed in any::<bool>(),
            view_index in 0usize..3usize
        ) {
            let view = [CalendarView::Day, CalendarView::Week, CalendarView::Month][view_index];
            let anchor = day("2026-02-18");
            let date = anchor + chrono::Duration::days(offset);
            let mut candidate = block("p", "2026-02-18", "09:00", "10:00", completed);
            candidate.date = date;
            let blocks = vec![candidate];

            let visible = visible_time_blocks(&blocks, view, anchor, show_completed);
            let expected = view_range(view, anchor).contains(date) && (show_completed || !completed);
            prop_assert_eq!(!visible.is_empty(), expected);
        }
    }
}
