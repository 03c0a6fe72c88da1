use crate::errors::{StoreError, StoreResult};
use crate::models::{IntakeRecord, ProfileId, RecordId, Settings};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(
        &self,
        profile: &ProfileId,
        amount_ml: u32,
        occurred_at: DateTime<Local>,
    ) -> StoreResult<IntakeRecord>;

    async fn delete(&self, profile: &ProfileId, id: RecordId) -> StoreResult<()>;

    /// Records with `start <= occurred_at < end`, oldest first.
    async fn query_range(
        &self,
        profile: &ProfileId,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> StoreResult<Vec<IntakeRecord>>;

    async fn get_settings(&self, profile: &ProfileId) -> StoreResult<Option<Settings>>;

    async fn upsert_settings(&self, profile: &ProfileId, settings: &Settings) -> StoreResult<()>;

    async fn sum_range(
        &self,
        profile: &ProfileId,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> StoreResult<u64> {
        let records = self.query_range(profile, start, end).await?;
        Ok(records.iter().map(|r| u64::from(r.amount_ml)).sum())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub profile_id: ProfileId,
    #[serde(flatten)]
    pub record: IntakeRecord,
}

/// Backing data shared by the memory and file stores.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub records: Vec<StoredRecord>,
    #[serde(default)]
    pub settings: BTreeMap<ProfileId, Settings>,
}

impl StoreData {
    pub fn insert(
        &mut self,
        profile: &ProfileId,
        amount_ml: u32,
        occurred_at: DateTime<Local>,
    ) -> IntakeRecord {
        let record = IntakeRecord {
            id: RecordId::new(),
            amount_ml,
            occurred_at,
        };
        self.records.push(StoredRecord {
            profile_id: profile.clone(),
            record: record.clone(),
        });
        record
    }

    pub fn delete(&mut self, profile: &ProfileId, id: RecordId) -> StoreResult<()> {
        let before = self.records.len();
        self.records
            .retain(|stored| !(stored.profile_id == *profile && stored.record.id == id));
        if self.records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub fn query_range(
        &self,
        profile: &ProfileId,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Vec<IntakeRecord> {
        let mut records: Vec<IntakeRecord> = self
            .records
            .iter()
            .filter(|stored| stored.profile_id == *profile)
            .filter(|stored| start <= stored.record.occurred_at && stored.record.occurred_at < end)
            .map(|stored| stored.record.clone())
            .collect();
        records.sort_by_key(|record| record.occurred_at);
        records
    }
}

/// In-process store. `set_failing(true)` makes every call return
/// [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(
        &self,
        profile: &ProfileId,
        amount_ml: u32,
        occurred_at: DateTime<Local>,
    ) -> StoreResult<IntakeRecord> {
        self.check()?;
        Ok(self.lock().insert(profile, amount_ml, occurred_at))
    }

    async fn delete(&self, profile: &ProfileId, id: RecordId) -> StoreResult<()> {
        self.check()?;
        self.lock().delete(profile, id)
    }

    async fn query_range(
        &self,
        profile: &ProfileId,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> StoreResult<Vec<IntakeRecord>> {
        self.check()?;
        Ok(self.lock().query_range(profile, start, end))
    }

    async fn get_settings(&self, profile: &ProfileId) -> StoreResult<Option<Settings>> {
        self.check()?;
        Ok(self.lock().settings.get(profile).copied())
    }

    async fn upsert_settings(&self, profile: &ProfileId, settings: &Settings) -> StoreResult<()> {
        self.check()?;
        self.lock().settings.insert(profile.clone(), *settings);
        Ok(())
    }
}
