use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use thiserror::Error;

use crate::time::offset_from_hours;

pub const DEFAULT_LOG_CAP: usize = 100;
pub const MAX_LOG_CAP: usize = 1000;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_CHART_WINDOW_DAYS: u32 = 7;
pub const MAX_CHART_WINDOW_DAYS: u32 = 31;
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Exam day counted down to on the home screen.
#[must_use]
pub fn default_exam_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 22).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("log cap must be between 1 and {max}, got {0}", max = MAX_LOG_CAP)]
    InvalidLogCap(usize),
    #[error("utc offset must be between -12 and 14 hours, got {0}")]
    InvalidUtcOffset(i32),
    #[error("chart window must be between 1 and {max} days, got {0}", max = MAX_CHART_WINDOW_DAYS)]
    InvalidChartWindow(u32),
    #[error("default question count must be positive")]
    InvalidQuestionCount,
}

/// Validated deployment parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    log_cap: usize,
    utc_offset: FixedOffset,
    exam_date: NaiveDate,
    chart_window_days: u32,
    default_question_count: usize,
}

/// Unvalidated settings, typically assembled from env vars and flags.
#[derive(Clone, Debug)]
pub struct QuizSettingsDraft {
    pub log_cap: usize,
    pub utc_offset_hours: i32,
    pub exam_date: NaiveDate,
    pub chart_window_days: u32,
    pub default_question_count: usize,
}

impl Default for QuizSettingsDraft {
    fn default() -> Self {
        Self {
            log_cap: DEFAULT_LOG_CAP,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            exam_date: default_exam_date(),
            chart_window_days: DEFAULT_CHART_WINDOW_DAYS,
            default_question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for any out-of-range value.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        if self.log_cap == 0 || self.log_cap > MAX_LOG_CAP {
            return Err(SettingsError::InvalidLogCap(self.log_cap));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(SettingsError::InvalidUtcOffset(self.utc_offset_hours));
        }
        let utc_offset = offset_from_hours(self.utc_offset_hours)
            .ok_or(SettingsError::InvalidUtcOffset(self.utc_offset_hours))?;
        if self.chart_window_days == 0 || self.chart_window_days > MAX_CHART_WINDOW_DAYS {
            return Err(SettingsError::InvalidChartWindow(self.chart_window_days));
        }
        if self.default_question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }

        Ok(QuizSettings {
            log_cap: self.log_cap,
            utc_offset,
            exam_date: self.exam_date,
            chart_window_days: self.chart_window_days,
            default_question_count: self.default_question_count,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn log_cap(&self) -> usize {
        self.log_cap
    }

    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    #[must_use]
    pub fn exam_date(&self) -> NaiveDate {
        self.exam_date
    }

    #[must_use]
    pub fn chart_window_days(&self) -> u32 {
        self.chart_window_days
    }

    #[must_use]
    pub fn default_question_count(&self) -> usize {
        self.default_question_count
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            log_cap: DEFAULT_LOG_CAP,
            utc_offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|| Utc.fix()),
            exam_date: default_exam_date(),
            chart_window_days: DEFAULT_CHART_WINDOW_DAYS,
            default_question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
        assert_eq!(settings.utc_offset().local_minus_utc(), 9 * 3600);
        assert_eq!(settings.log_cap(), 100);
    }

    #[test]
    fn log_cap_is_bounded() {
        let draft = QuizSettingsDraft {
            log_cap: 0,
            ..QuizSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(SettingsError::InvalidLogCap(0)));

        let draft = QuizSettingsDraft {
            log_cap: 1000,
            ..QuizSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap().log_cap(), 1000);
    }

    #[test]
    fn rejects_bad_offset_and_window() {
        let draft = QuizSettingsDraft {
            utc_offset_hours: 20,
            ..QuizSettingsDraft::default()
        };
        assert!(matches!(draft.validate(), Err(SettingsError::InvalidUtcOffset(20))));

        let draft = QuizSettingsDraft {
            chart_window_days: 0,
            ..QuizSettingsDraft::default()
        };
        assert!(matches!(draft.validate(), Err(SettingsError::InvalidChartWindow(0))));
    }
}
