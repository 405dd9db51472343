use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::AppState;
use crate::error::Result;
use crate::handlers::blocking;
use crate::middleware::AdminContext;
use crate::models::{LicenseKey, LicenseKeyWithDetails, UpdateLicenseKey};
use crate::services::licenses;

#[derive(Debug, Deserialize)]
pub struct IssueLicenseKey {
    pub product_id: String,
    pub customer_id: String,
}

pub async fn issue_license_key(
    State(state): State<AppState>,
    Json(input): Json<IssueLicenseKey>,
) -> Result<(StatusCode, Json<LicenseKey>)> {
    let db = state.db.clone();
    let license = blocking(move || {
        licenses::issue_license_key(&db, &input.product_id, &input.customer_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(license)))
}

pub async fn list_license_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<LicenseKeyWithDetails>>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || licenses::list_license_keys(&db)).await?))
}

pub async fn get_license_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseKeyWithDetails>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || licenses::get_license_key(&db, &id)).await?,
    ))
}

pub async fn update_license_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateLicenseKey>,
) -> Result<Json<LicenseKeyWithDetails>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || licenses::update_license_key(&db, &id, &input)).await?,
    ))
}

pub async fn delete_license_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let db = state.db.clone();
    blocking(move || licenses::delete_license_key(&db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_license_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
) -> Result<Json<LicenseKey>> {
    let db = state.db.clone();
    let license = blocking(move || licenses::revoke(&db, &id)).await?;
    tracing::info!(license_id = %license.id, admin = %ctx.admin.username, "license key revoked by admin");
    Ok(Json(license))
}

pub async fn reactivate_license_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseKey>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || licenses::reactivate(&db, &id)).await?))
}

pub async fn increment_license_key_usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseKey>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || licenses::increment_usage(&db, &id)).await?,
    ))
}

pub async fn resend_license_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let AppState { db, notifier, .. } = state;
    blocking(move || licenses::resend_license_key(&db, notifier.as_ref(), &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
