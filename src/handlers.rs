use crate::bridge::PendingView;
use crate::errors::AppError;
use crate::install::{InstallOutcome, ReportedChoice};
use crate::models::{
    AmountStep, DrinkAmountRequest, InstallEvent, InteractionRequest, PermissionReport,
    PromptAnswer, RecordId, RecordView, ReminderView, Settings, SettingsUpdate, TodayResponse,
    WeeklyResponse,
};
use crate::notifier::{Interaction, NotificationId};
use crate::permission::{Permission, PermissionGate};
use crate::state::AppState;
use crate::stats::build_weekly;
use crate::tracker::TrackerSnapshot;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.tracker.snapshot().await;
    Html(render_index(&snapshot))
}

pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodayResponse>, AppError> {
    Ok(Json(today_response(&state).await))
}

pub async fn add_water(State(state): State<AppState>) -> Result<Json<TodayResponse>, AppError> {
    state.tracker.add_water().await?;
    Ok(Json(today_response(&state).await))
}

pub async fn add_water_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.tracker.add_water().await?;
    Ok(Redirect::to("/"))
}

pub async fn remove_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodayResponse>, AppError> {
    let id: RecordId = id
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request("record id must be a UUID"))?;
    state.tracker.remove_record(id).await?;
    Ok(Json(today_response(&state).await))
}

pub async fn drink_amount(
    State(state): State<AppState>,
    Json(payload): Json<DrinkAmountRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    let step = match payload.action.trim() {
        "increase" => AmountStep::Increase,
        "decrease" => AmountStep::Decrease,
        _ => return Err(AppError::bad_request("action must be 'increase' or 'decrease'")),
    };
    state.tracker.adjust_drink_amount(step).await;
    Ok(Json(today_response(&state).await))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.tracker.settings().await)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.tracker.update_settings(update).await?))
}

pub async fn toggle_reminder(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.tracker.toggle_reminder().await?))
}

pub async fn get_weekly(State(state): State<AppState>) -> Result<Json<WeeklyResponse>, AppError> {
    Ok(Json(build_weekly(&state.tracker).await?))
}

pub async fn get_pending(State(state): State<AppState>) -> Json<PendingView> {
    Json(state.bridge.pending())
}

pub async fn report_permission(
    State(state): State<AppState>,
    Json(payload): Json<PermissionReport>,
) -> Result<StatusCode, AppError> {
    let permission: Permission = payload.permission.parse().map_err(AppError::bad_request)?;
    state.bridge.report_permission(permission);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn notification_interaction(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<InteractionRequest>,
) -> Result<StatusCode, AppError> {
    let interaction = match payload.interaction.trim() {
        "click" => Interaction::Clicked,
        "close" => Interaction::Closed,
        _ => return Err(AppError::bad_request("interaction must be 'click' or 'close'")),
    };
    if !state.bridge.interact(NotificationId(id), interaction) {
        return Err(AppError::not_found(format!("no pending notification {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn answer_prompt(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<PromptAnswer>,
) -> Result<StatusCode, AppError> {
    if !state.bridge.answer_prompt(id, payload.accepted) {
        return Err(AppError::not_found(format!("no pending prompt {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn install_event(
    State(state): State<AppState>,
    Json(payload): Json<InstallEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut install = state.install.lock().await;
    match payload.event.trim() {
        "available" => install.prompt_available(),
        "installed" => install.installed(),
        "accepted" => {
            install
                .request_install(&ReportedChoice(InstallOutcome::Accepted))
                .await;
        }
        "dismissed" => {
            install
                .request_install(&ReportedChoice(InstallOutcome::Dismissed))
                .await;
        }
        _ => {
            return Err(AppError::bad_request(
                "event must be 'available', 'installed', 'accepted' or 'dismissed'",
            ));
        }
    }
    Ok(Json(serde_json::json!({ "installable": install.is_installable() })))
}

async fn today_response(state: &AppState) -> TodayResponse {
    let snapshot = state.tracker.snapshot().await;
    let installable = state.install.lock().await.is_installable();
    to_response(&snapshot, state.bridge.current(), installable)
}

pub fn to_response(
    snapshot: &TrackerSnapshot,
    permission: Permission,
    installable: bool,
) -> TodayResponse {
    let TrackerSnapshot {
        state,
        summary,
        next_fire_at,
        ..
    } = snapshot;

    TodayResponse {
        date: state.window.date.to_string(),
        current_intake_ml: summary.current_ml,
        daily_goal_ml: summary.goal_ml,
        progress_percent: summary.progress_percent,
        display_progress: summary.display_progress,
        remaining_ml: summary.remaining_ml,
        next_drink: summary.next_drink.label(),
        drink_amount_ml: state.drink_amount_ml,
        records: state.records.iter().map(RecordView::from).collect(),
        reminder: ReminderView {
            enabled: state.settings.reminder.enabled,
            interval_minutes: state.settings.reminder.interval_minutes,
            next_fire_at: next_fire_at.map(|at| at.format("%H:%M").to_string()),
        },
        notification_permission: permission.to_string(),
        installable,
    }
}
