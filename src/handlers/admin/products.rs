use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::AppState;
use crate::error::Result;
use crate::handlers::blocking;
use crate::middleware::AdminContext;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::services::catalog;

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let db = state.db.clone();
    let product = blocking(move || catalog::create_product(&db, &input)).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || catalog::list_products(&db)).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || catalog::get_product(&db, &id)).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProduct>,
) -> Result<Json<Product>> {
    let db = state.db.clone();
    Ok(Json(
        blocking(move || catalog::update_product(&db, &id, &input)).await?,
    ))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let db = state.db.clone();
    let product_id = id.clone();
    blocking(move || catalog::delete_product(&db, &product_id)).await?;
    tracing::info!(product_id = %id, admin = %ctx.admin.username, "product deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
