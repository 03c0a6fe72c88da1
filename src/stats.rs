use crate::clock::DailyWindow;
use crate::errors::TrackerError;
use crate::models::{DailyPoint, IntakeRecord, WeeklyResponse};
use crate::tracker::Tracker;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

const DAY_COUNT: i64 = 7;

/// Seven days ending today. Past days come from the store; today uses the
/// tracker's running total.
pub async fn build_weekly(tracker: &Tracker) -> Result<WeeklyResponse, TrackerError> {
    let snapshot = tracker.snapshot().await;
    let today = snapshot.state.window.date;
    let first = DailyWindow::for_date(today - Duration::days(DAY_COUNT - 1));
    let records = tracker
        .store()
        .query_range(tracker.profile(), first.start, snapshot.state.window.start)
        .await?;

    Ok(build_weekly_at(
        today,
        &records,
        snapshot.state.settings.daily_goal_ml,
        snapshot.state.current_intake_ml,
    ))
}

pub fn build_weekly_at(
    today: NaiveDate,
    past_records: &[IntakeRecord],
    goal_ml: u32,
    today_ml: u32,
) -> WeeklyResponse {
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for record in past_records {
        let entry = per_day.entry(record.occurred_at.date_naive()).or_default();
        *entry = entry.saturating_add(record.amount_ml);
    }
    per_day.insert(today, today_ml);

    let mut days = Vec::with_capacity(DAY_COUNT as usize);
    for offset in (0..DAY_COUNT).rev() {
        let date = today - Duration::days(offset);
        let intake_ml = per_day.get(&date).copied().unwrap_or(0);
        days.push(DailyPoint {
            date: date.to_string(),
            label: day_label(date),
            intake_ml,
            goal_ml,
            goal_met: goal_ml > 0 && intake_ml >= goal_ml,
        });
    }

    let total: u64 = days.iter().map(|day| u64::from(day.intake_ml)).sum();
    let days_goal_met = days.iter().filter(|day| day.goal_met).count() as u8;

    WeeklyResponse {
        average_ml: total as f64 / DAY_COUNT as f64,
        days_goal_met,
        days,
    }
}

fn day_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}
