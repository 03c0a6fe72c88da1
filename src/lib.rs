pub mod app;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod install;
pub mod intake;
pub mod models;
pub mod notifier;
pub mod permission;
pub mod rollover;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::JsonFileStore;
pub use tracker::Tracker;
