//! The authoritative intake state and the only place it is mutated.
//!
//! Every entry point takes the state lock for its whole duration, store I/O
//! included, so mutations are applied strictly one after another. Writes go to
//! the store first and touch memory only on success.

use crate::clock::{Clock, DailyWindow};
use crate::errors::TrackerError;
use crate::intake::{self, IntakeSummary};
use crate::models::{
    AmountStep, DEFAULT_DRINK_AMOUNT_ML, DRINK_AMOUNT_STEP_ML, IntakeRecord, MAX_DAILY_GOAL_ML,
    MAX_INTERVAL_MINUTES, ProfileId, RecordId, ReminderConfig, Settings, SettingsUpdate,
};
use crate::notifier::IntakeRecorder;
use crate::scheduler::ReminderScheduler;
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Whether the initial settings fetch has resolved. Persisting is only
/// allowed once it has, so defaults never overwrite stored settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsGate {
    NotLoaded,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct TrackerState {
    pub settings: Settings,
    pub gate: SettingsGate,
    pub records: Vec<IntakeRecord>,
    pub current_intake_ml: u32,
    pub drink_amount_ml: u32,
    pub window: DailyWindow,
}

/// Read-only copy of the state plus derived figures.
#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub summary: IntakeSummary,
    pub next_fire_at: Option<DateTime<Local>>,
    pub now: DateTime<Local>,
}

pub struct Tracker {
    profile: ProfileId,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    scheduler: ReminderScheduler,
    state: Mutex<TrackerState>,
}

impl Tracker {
    pub fn new(
        profile: ProfileId,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        scheduler: ReminderScheduler,
    ) -> Self {
        let window = DailyWindow::for_date(clock.today());
        Self {
            profile,
            store,
            clock,
            scheduler,
            state: Mutex::new(TrackerState {
                settings: Settings::default(),
                gate: SettingsGate::NotLoaded,
                records: Vec::new(),
                current_intake_ml: 0,
                drink_amount_ml: DEFAULT_DRINK_AMOUNT_ML,
                window,
            }),
        }
    }

    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    /// Fetches stored settings and opens the persist gate, whatever the
    /// outcome. Arms the reminder when the loaded config has it enabled.
    pub async fn load_settings(&self) -> Settings {
        let mut state = self.state.lock().await;
        match self.store.get_settings(&self.profile).await {
            Ok(Some(settings)) => state.settings = settings,
            Ok(None) => info!(profile = %self.profile, "no stored settings, using defaults"),
            Err(err) => error!(profile = %self.profile, "failed to load settings: {err}"),
        }
        state.gate = SettingsGate::Loaded;
        self.scheduler.apply(state.settings.reminder);
        state.settings
    }

    /// Replaces the in-memory records with the stored ones for today.
    pub async fn load_today(&self) -> Result<usize, TrackerError> {
        let mut state = self.state.lock().await;
        let window = state.window;
        let records = self
            .store
            .query_range(&self.profile, window.start, window.end)
            .await
            .inspect_err(|err| error!(date = %window.date, "failed to load records: {err}"))?;
        state.current_intake_ml = total_ml(&records);
        state.records = records;
        Ok(state.records.len())
    }

    pub async fn add_water(&self) -> Result<IntakeRecord, TrackerError> {
        let mut state = self.state.lock().await;
        let amount_ml = state.drink_amount_ml;
        let record = self
            .store
            .insert(&self.profile, amount_ml, self.clock.now())
            .await
            .inspect_err(|err| error!(amount_ml, "failed to save drink record: {err}"))?;
        state.current_intake_ml = state.current_intake_ml.saturating_add(record.amount_ml);
        state.records.push(record.clone());
        info!(id = %record.id, amount_ml, total_ml = state.current_intake_ml, "water added");
        Ok(record)
    }

    pub async fn remove_record(&self, id: RecordId) -> Result<IntakeRecord, TrackerError> {
        let mut state = self.state.lock().await;
        let Some(index) = state.records.iter().position(|r| r.id == id) else {
            return Err(TrackerError::UnknownRecord(id));
        };
        self.store
            .delete(&self.profile, id)
            .await
            .inspect_err(|err| error!(%id, "failed to delete drink record: {err}"))?;
        let record = state.records.remove(index);
        state.current_intake_ml = state.current_intake_ml.saturating_sub(record.amount_ml);
        info!(%id, total_ml = state.current_intake_ml, "drink record removed");
        Ok(record)
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, TrackerError> {
        let mut state = self.state.lock().await;
        self.apply_settings(&mut state, update).await
    }

    pub async fn toggle_reminder(&self) -> Result<Settings, TrackerError> {
        let mut state = self.state.lock().await;
        let update = SettingsUpdate {
            enabled: Some(!state.settings.reminder.enabled),
            ..SettingsUpdate::default()
        };
        self.apply_settings(&mut state, update).await
    }

    async fn apply_settings(
        &self,
        state: &mut TrackerState,
        update: SettingsUpdate,
    ) -> Result<Settings, TrackerError> {
        let next = apply_update(state.settings, update)?;
        if next == state.settings {
            return Ok(next);
        }

        match state.gate {
            SettingsGate::Loaded => {
                self.store
                    .upsert_settings(&self.profile, &next)
                    .await
                    .inspect_err(|err| error!("failed to save settings: {err}"))?;
            }
            SettingsGate::NotLoaded => {
                warn!("settings changed before initial load, not persisting");
            }
        }

        state.settings = next;
        self.scheduler.apply(next.reminder);
        Ok(next)
    }

    pub async fn adjust_drink_amount(&self, step: AmountStep) -> u32 {
        let mut state = self.state.lock().await;
        state.drink_amount_ml = match step {
            AmountStep::Increase => state.drink_amount_ml.saturating_add(DRINK_AMOUNT_STEP_ML),
            AmountStep::Decrease => state
                .drink_amount_ml
                .saturating_sub(DRINK_AMOUNT_STEP_ML)
                .max(DRINK_AMOUNT_STEP_ML),
        };
        state.drink_amount_ml
    }

    /// Starts a new day when the calendar date has moved on. Stored records
    /// are left alone.
    pub async fn check_rollover(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.window.contains(now) {
            return false;
        }
        let today = now.date_naive();
        info!(from = %state.window.date, to = %today, "day rolled over");
        state.window = DailyWindow::for_date(today);
        state.records.clear();
        state.current_intake_ml = 0;
        true
    }

    /// Drink amount and the remaining-to-goal figure for a reminder.
    pub async fn reminder_payload(&self) -> (u32, u32) {
        let state = self.state.lock().await;
        (
            state.drink_amount_ml,
            intake::remaining_ml(state.settings.daily_goal_ml, state.current_intake_ml),
        )
    }

    pub async fn settings(&self) -> Settings {
        self.state.lock().await.settings
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        let state = self.state.lock().await.clone();
        let now = self.clock.now();
        let summary = intake::summarize(
            &state.records,
            state.current_intake_ml,
            &state.settings,
            now,
        );
        TrackerSnapshot {
            state,
            summary,
            next_fire_at: self.scheduler.current_next_fire_time(),
            now,
        }
    }
}

#[async_trait]
impl IntakeRecorder for Tracker {
    async fn record_drink(&self) {
        // failures are already logged by add_water
        let _ = self.add_water().await;
    }
}

fn apply_update(current: Settings, update: SettingsUpdate) -> Result<Settings, TrackerError> {
    let mut next = current;
    if let Some(goal) = update.daily_goal_ml {
        if goal == 0 || goal > MAX_DAILY_GOAL_ML {
            return Err(TrackerError::InvalidInput(format!(
                "daily goal must be between 1 and {MAX_DAILY_GOAL_ML} ml"
            )));
        }
        next.daily_goal_ml = goal;
    }
    if let Some(minutes) = update.interval_minutes {
        if minutes == 0 || minutes > MAX_INTERVAL_MINUTES {
            return Err(TrackerError::InvalidInput(format!(
                "reminder interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes"
            )));
        }
        next.reminder.interval_minutes = minutes;
    }
    if let Some(enabled) = update.enabled {
        next.reminder = ReminderConfig {
            enabled,
            ..next.reminder
        };
    }
    Ok(next)
}

fn total_ml(records: &[IntakeRecord]) -> u32 {
    records
        .iter()
        .fold(0u32, |sum, record| sum.saturating_add(record.amount_ml))
}
