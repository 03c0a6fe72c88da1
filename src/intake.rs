use crate::models::{IntakeRecord, Settings};
use chrono::{DateTime, Duration, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "lowercase")]
pub enum NextDrink {
    /// Drink right away.
    Now,
    At(DateTime<Local>),
}

impl NextDrink {
    pub fn label(&self) -> String {
        match self {
            NextDrink::Now => "now".to_string(),
            NextDrink::At(at) => at.format("%H:%M").to_string(),
        }
    }
}

/// Percentage of the goal reached. May exceed 100; a zero goal yields 0.
pub fn progress_percent(current_ml: u32, goal_ml: u32) -> f64 {
    if goal_ml == 0 {
        return 0.0;
    }
    f64::from(current_ml) * 100.0 / f64::from(goal_ml)
}

pub fn display_progress(percent: f64) -> f64 {
    if !percent.is_finite() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

pub fn remaining_ml(goal_ml: u32, current_ml: u32) -> u32 {
    goal_ml.saturating_sub(current_ml)
}

pub fn next_suggested_time(
    records: &[IntakeRecord],
    interval_minutes: u32,
    now: DateTime<Local>,
) -> NextDrink {
    let Some(last) = records.last() else {
        return NextDrink::Now;
    };
    let next = last.occurred_at + Duration::minutes(i64::from(interval_minutes));
    if next <= now {
        NextDrink::Now
    } else {
        NextDrink::At(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeSummary {
    pub current_ml: u32,
    pub goal_ml: u32,
    pub progress_percent: f64,
    pub display_progress: f64,
    pub remaining_ml: u32,
    pub next_drink: NextDrink,
}

pub fn summarize(
    records: &[IntakeRecord],
    current_ml: u32,
    settings: &Settings,
    now: DateTime<Local>,
) -> IntakeSummary {
    let goal_ml = settings.daily_goal_ml;
    let progress = progress_percent(current_ml, goal_ml);
    IntakeSummary {
        current_ml,
        goal_ml,
        progress_percent: progress,
        display_progress: display_progress(progress),
        remaining_ml: remaining_ml(goal_ml, current_ml),
        next_drink: next_suggested_time(records, settings.reminder.interval_minutes, now),
    }
}
