use crate::bridge::BrowserBridge;
use crate::install::InstallState;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub bridge: Arc<BrowserBridge>,
    pub install: Arc<Mutex<InstallState>>,
}

impl AppState {
    pub fn new(tracker: Arc<Tracker>, bridge: Arc<BrowserBridge>) -> Self {
        Self {
            tracker,
            bridge,
            install: Arc::new(Mutex::new(InstallState::default())),
        }
    }
}
