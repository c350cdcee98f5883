use serde::Serialize;

use quiz_core::RecordCodec;
use quiz_core::analytics::{build_series, countdown};
use quiz_core::model::{CategorySelector, QuizSettings, selectable_categories};

use crate::Clock;
use crate::context::ClientContext;

/// Everything the home screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeView {
    pub categories: Vec<String>,
    pub days_left: u32,
    pub wrong_count: usize,
    pub selected: String,
    pub chart_title: String,
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

/// Read-only home screen: exam countdown, review backlog and activity chart.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    settings: QuizSettings,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, settings: QuizSettings) -> Self {
        Self { clock, settings }
    }

    /// Build the home view, charting `chart_category` (default: all).
    #[must_use]
    pub fn home(&self, ctx: &ClientContext, chart_category: Option<&str>) -> HomeView {
        let now = self.clock.now();
        let offset = self.settings.utc_offset();
        let record = RecordCodec::new(self.settings.log_cap()).decode(ctx.record_token.as_deref());
        let selector = CategorySelector::parse(chart_category.unwrap_or_default());
        let series = build_series(
            record.logs(),
            &selector,
            self.settings.chart_window_days(),
            now,
            offset,
        );

        HomeView {
            categories: selectable_categories()
                .into_iter()
                .map(str::to_string)
                .collect(),
            days_left: countdown(self.settings.exam_date(), now, offset),
            wrong_count: record.wrong_count(),
            chart_title: format!("{selector}の学習問題数"),
            selected: selector.token().to_string(),
            labels: series.labels,
            values: series.values,
        }
    }
}
