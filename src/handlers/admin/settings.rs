use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::AppState;
use crate::error::Result;
use crate::handlers::blocking;
use crate::models::{EmailSettings, SaveEmailSettings};
use crate::services::settings;

pub async fn list_email_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmailSettings>>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || settings::list_email_settings(&db)).await?,
    ))
}

pub async fn get_active_email_settings(
    State(state): State<AppState>,
) -> Result<Json<Option<EmailSettings>>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || settings::get_active_email_settings(&db)).await?,
    ))
}

pub async fn get_email_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailSettings>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || settings::get_email_settings(&db, &id)).await?,
    ))
}

pub async fn save_email_settings(
    State(state): State<AppState>,
    Json(input): Json<SaveEmailSettings>,
) -> Result<(StatusCode, Json<EmailSettings>)> {
    let db = state.db.clone();
    let created = input.id.is_none();
    let saved = blocking(move || settings::save_email_settings(&db, &input)).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}

/// The path id wins over any id in the body.
pub async fn update_email_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut input): Json<SaveEmailSettings>,
) -> Result<Json<EmailSettings>> {
    input.id = Some(id);
    let db = state.db.clone();
    Ok(Json(
        blocking(move || settings::save_email_settings(&db, &input)).await?,
    ))
}

pub async fn activate_email_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailSettings>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || settings::activate_email_settings(&db, &id)).await?,
    ))
}

pub async fn delete_email_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let db = state.db.clone();
    blocking(move || settings::delete_email_settings(&db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub to: String,
}

pub async fn send_test_email(
    State(state): State<AppState>,
    Json(input): Json<TestEmailRequest>,
) -> Result<StatusCode> {
    let notifier = state.notifier.clone();
    blocking(move || settings::send_test_email(notifier.as_ref(), &input.to)).await?;
    Ok(StatusCode::NO_CONTENT)
}
