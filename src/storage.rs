use crate::errors::StoreResult;
use crate::models::{IntakeRecord, ProfileId, RecordId, Settings};
use crate::store::{RecordStore, StoreData};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::error;

/// Record store kept as one pretty-printed JSON document.
///
/// Every mutation is applied to a copy, written out, and only then swapped in,
/// so a failed write leaves the loaded data untouched.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = load_data(&path).await;
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    async fn mutate<T>(&self, apply: impl FnOnce(&mut StoreData) -> StoreResult<T>) -> StoreResult<T> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let out = apply(&mut next)?;
        persist_data(&self.path, &next).await?;
        *data = next;
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert(
        &self,
        profile: &ProfileId,
        amount_ml: u32,
        occurred_at: DateTime<Local>,
    ) -> StoreResult<IntakeRecord> {
        self.mutate(|data| Ok(data.insert(profile, amount_ml, occurred_at)))
            .await
    }

    async fn delete(&self, profile: &ProfileId, id: RecordId) -> StoreResult<()> {
        self.mutate(|data| data.delete(profile, id)).await
    }

    async fn query_range(
        &self,
        profile: &ProfileId,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> StoreResult<Vec<IntakeRecord>> {
        Ok(self.data.lock().await.query_range(profile, start, end))
    }

    async fn get_settings(&self, profile: &ProfileId) -> StoreResult<Option<Settings>> {
        Ok(self.data.lock().await.settings.get(profile).copied())
    }

    async fn upsert_settings(&self, profile: &ProfileId, settings: &Settings) -> StoreResult<()> {
        self.mutate(|data| {
            data.settings.insert(profile.clone(), *settings);
            Ok(())
        })
        .await
    }
}

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!(path = %path.display(), "failed to parse data file: {err}");
                StoreData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            StoreData::default()
        }
    }
}

/// Writes a sibling temp file and renames it over `path`, so the data file is
/// always either the old or the new document.
pub async fn persist_data(path: &Path, data: &StoreData) -> StoreResult<()> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = temp_path(path);
    fs::write(&tmp, payload).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
