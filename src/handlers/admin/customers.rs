use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::AppState;
use crate::error::Result;
use crate::handlers::blocking;
use crate::models::{CreateCustomer, Customer, LicenseKeyWithDetails, UpdateCustomer};
use crate::services::catalog;

pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>)> {
    let db = state.db.clone();
    let customer = blocking(move || catalog::create_customer(&db, &input)).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || catalog::list_customers(&db)).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || catalog::get_customer(&db, &id)).await?))
}

pub async fn list_customer_license_keys(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LicenseKeyWithDetails>>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || catalog::list_customer_license_keys(&db, &id)).await?,
    ))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCustomer>,
) -> Result<Json<Customer>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || catalog::update_customer(&db, &id, &input)).await?,
    ))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let db = state.db.clone();
    blocking(move || catalog::delete_customer(&db, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
