use axum::{Json, extract::State};

use crate::db::AppState;
use crate::error::Result;
use crate::handlers::blocking;
use crate::services::dashboard::{self, DashboardStats};

pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || dashboard::stats(&db)).await?))
}
