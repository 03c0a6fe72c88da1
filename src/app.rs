use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/water/add", post(handlers::add_water_form))
        .route("/api/today", get(handlers::get_today))
        .route("/api/water", post(handlers::add_water))
        .route("/api/records/:id", delete(handlers::remove_record))
        .route("/api/drink-amount", post(handlers::drink_amount))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/api/reminder/toggle", post(handlers::toggle_reminder))
        .route("/api/weekly", get(handlers::get_weekly))
        .route("/api/pending", get(handlers::get_pending))
        .route("/api/permission", post(handlers::report_permission))
        .route(
            "/api/notifications/:id",
            post(handlers::notification_interaction),
        )
        .route("/api/prompts/:id", post(handlers::answer_prompt))
        .route("/api/install", post(handlers::install_event))
        .with_state(state)
}
