//! Calendar configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::date::Weekday;

/// Invalid [`CalendarOptions`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("expected 12 month names, got {0}")]
    MonthNames(usize),

    #[error("expected 7 weekday labels, got {0}")]
    WeekdayLabels(usize),
}

/// Calendar options, loadable from a `[calendar]` TOML table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarOptions {
    /// First year offered by the year selector
    #[serde(default = "default_epoch_year")]
    pub epoch_year: i32,

    /// Weekday shown in the first grid column
    #[serde(default = "default_first_day_of_week")]
    pub first_day_of_week: Weekday,

    /// Month names, January first
    #[serde(default = "default_month_names")]
    pub month_names: Vec<String>,

    /// Weekday header labels, Sunday first
    #[serde(default = "default_weekday_labels")]
    pub weekday_labels: Vec<String>,
}

fn default_epoch_year() -> i32 {
    1970
}

fn default_first_day_of_week() -> Weekday {
    Weekday::Sun
}

fn default_month_names() -> Vec<String> {
    [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_weekday_labels() -> Vec<String> {
    ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            epoch_year: default_epoch_year(),
            first_day_of_week: default_first_day_of_week(),
            month_names: default_month_names(),
            weekday_labels: default_weekday_labels(),
        }
    }
}

impl CalendarOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.month_names.len() != 12 {
            return Err(OptionsError::MonthNames(self.month_names.len()));
        }
        if self.weekday_labels.len() != 7 {
            return Err(OptionsError::WeekdayLabels(self.weekday_labels.len()));
        }
        Ok(())
    }

    /// Header labels in column order
    pub fn header_labels(&self) -> Vec<String> {
        let start = self.first_day_of_week.num_days_from_sunday() as usize;
        (0..7)
            .map(|i| {
                self.weekday_labels
                    .get((start + i) % 7)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Name of a month (0-11)
    pub fn month_name(&self, month0: u8) -> &str {
        self.month_names
            .get(month0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}
