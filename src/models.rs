use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_DAILY_GOAL_ML: u32 = 1000;
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_DRINK_AMOUNT_ML: u32 = 20;
pub const DRINK_AMOUNT_STEP_ML: u32 = 20;
pub const MAX_DAILY_GOAL_ML: u32 = 20_000;
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new("default_profile")
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: RecordId,
    pub amount_ml: u32,
    pub occurred_at: DateTime<Local>,
}

impl IntakeRecord {
    pub fn time_label(&self) -> String {
        self.occurred_at.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub interval_minutes: u32,
    pub enabled: bool,
}

impl ReminderConfig {
    /// Timer period. A zero interval is treated as one minute.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes.max(1)) * 60)
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub daily_goal_ml: u32,
    pub reminder: ReminderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal_ml: DEFAULT_DAILY_GOAL_ML,
            reminder: ReminderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsUpdate {
    pub daily_goal_ml: Option<u32>,
    pub interval_minutes: Option<u32>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountStep {
    Increase,
    Decrease,
}

#[derive(Debug, Deserialize)]
pub struct DrinkAmountRequest {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionReport {
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub interaction: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptAnswer {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct InstallEvent {
    pub event: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordView {
    pub id: String,
    pub amount_ml: u32,
    pub time: String,
    pub occurred_at: String,
}

impl From<&IntakeRecord> for RecordView {
    fn from(record: &IntakeRecord) -> Self {
        Self {
            id: record.id.to_string(),
            amount_ml: record.amount_ml,
            time: record.time_label(),
            occurred_at: record.occurred_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderView {
    pub enabled: bool,
    pub interval_minutes: u32,
    pub next_fire_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: String,
    pub current_intake_ml: u32,
    pub daily_goal_ml: u32,
    pub progress_percent: f64,
    pub display_progress: f64,
    pub remaining_ml: u32,
    pub next_drink: String,
    pub drink_amount_ml: u32,
    pub records: Vec<RecordView>,
    pub reminder: ReminderView,
    pub notification_permission: String,
    pub installable: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub label: String,
    pub intake_ml: u32,
    pub goal_ml: u32,
    pub goal_met: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyResponse {
    pub days: Vec<DailyPoint>,
    pub average_ml: f64,
    pub days_goal_met: u8,
}
