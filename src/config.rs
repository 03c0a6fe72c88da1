use crate::models::ProfileId;
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub profile_id: ProfileId,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/state.json"));

        let profile_id = env::var("APP_PROFILE_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(ProfileId::new)
            .unwrap_or_default();

        Self {
            port,
            data_path,
            profile_id,
        }
    }
}
