//! Month grid layout
//!
//! Always 6 rows of 7 cells: the tail of the previous month, the displayed
//! month, then the head of the next month.

use super::date::{column_of, days_in_month, previous_month, CalendarDate, Weekday};

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 7;
pub const CELLS: usize = ROWS * COLUMNS;

/// Which month a cell belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// Trailing day of the previous month
    Previous,
    /// Day of the displayed month
    Day,
    /// Leading day of the next month
    Next,
}

impl CellKind {
    /// CSS class of the cell
    pub fn class(self) -> &'static str {
        match self {
            CellKind::Previous => "prev",
            CellKind::Day => "day",
            CellKind::Next => "next",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub kind: CellKind,
    /// Day of month shown in the cell
    pub day: u8,
    /// Full date, for days of the displayed month only
    pub date: Option<CalendarDate>,
    pub today: bool,
    pub current: bool,
}

impl GridCell {
    pub fn is_interactive(&self) -> bool {
        self.kind == CellKind::Day
    }
}

/// Lay out the month containing `reference`
pub fn month_grid(
    reference: CalendarDate,
    selected: CalendarDate,
    today: CalendarDate,
    first_day: Weekday,
) -> Vec<GridCell> {
    let year = reference.year();
    let month = reference.month();
    let days = days_in_month(year, month);
    let leading = column_of(reference.first_of_month().weekday(), first_day);
    let (prev_year, prev_month) = previous_month(year, month);
    let prev_days = days_in_month(prev_year, prev_month);

    let mut cells = Vec::with_capacity(CELLS);
    for i in 0..leading {
        cells.push(GridCell {
            kind: CellKind::Previous,
            day: prev_days - leading + i + 1,
            date: None,
            today: false,
            current: false,
        });
    }
    for day in 1..=days {
        let date = CalendarDate::new(year, month, day);
        cells.push(GridCell {
            kind: CellKind::Day,
            day,
            date,
            today: date == Some(today),
            current: date == Some(selected),
        });
    }
    let mut next = 1;
    while cells.len() < CELLS {
        cells.push(GridCell {
            kind: CellKind::Next,
            day: next,
            date: None,
            today: false,
            current: false,
        });
        next += 1;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> CalendarDate {
        CalendarDate::new(y, m, d).unwrap()
    }

    #[test]
    fn test_february_2024() {
        let feb = date(2024, 2, 14);
        let cells = month_grid(feb, feb, date(2024, 2, 20), Weekday::Sun);

        assert_eq!(cells.len(), CELLS);
        let leading: Vec<u8> = cells
            .iter()
            .take_while(|c| c.kind == CellKind::Previous)
            .map(|c| c.day)
            .collect();
        assert_eq!(leading, vec![28, 29, 30, 31]);
        assert_eq!(cells.iter().filter(|c| c.is_interactive()).count(), 29);

        let trailing: Vec<u8> = cells
            .iter()
            .filter(|c| c.kind == CellKind::Next)
            .map(|c| c.day)
            .collect();
        assert_eq!(trailing, (1..=9).collect::<Vec<_>>());

        assert_eq!(cells.iter().filter(|c| c.today).count(), 1);
        assert!(cells[4 + 19].today);
        assert!(cells[4 + 13].current);
    }

    #[test]
    fn test_monday_first_column() {
        let feb = date(2024, 2, 1);
        let cells = month_grid(feb, feb, feb, Weekday::Mon);
        let leading = cells.iter().filter(|c| c.kind == CellKind::Previous).count();
        assert_eq!(leading, 3);
        assert_eq!(cells[3].day, 1);
    }

    #[test]
    fn test_month_starting_on_first_column_has_no_leading_cells() {
        // September 2024 starts on a Sunday
        let sep = date(2024, 9, 1);
        let cells = month_grid(sep, sep, sep, Weekday::Sun);
        assert_eq!(cells[0].kind, CellKind::Day);
        assert_eq!(cells[0].day, 1);
        assert_eq!(cells.iter().filter(|c| c.kind == CellKind::Next).count(), 12);
    }

    #[test]
    fn test_january_leads_with_december() {
        let jan = date(2025, 1, 1);
        let cells = month_grid(jan, jan, jan, Weekday::Sun);
        // 2025-01-01 is a Wednesday
        let leading: Vec<u8> = cells
            .iter()
            .filter(|c| c.kind == CellKind::Previous)
            .map(|c| c.day)
            .collect();
        assert_eq!(leading, vec![29, 30, 31]);
    }

    #[test]
    fn test_selection_outside_month_marks_nothing() {
        let feb = date(2024, 2, 14);
        let cells = month_grid(date(2024, 3, 1), feb, feb, Weekday::Sun);
        assert!(cells.iter().all(|c| !c.current && !c.today));
    }
}
