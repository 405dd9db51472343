//! Public license verification, compatible with Gumroad's verify endpoint
//! so existing client integrations only need a new base URL.

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::AppState;
use crate::error::AppError;
use crate::models::LicenseKeyWithDetails;
use crate::services::licenses;

use super::blocking;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub license_key: String,
    /// Anything other than `"false"` counts as true.
    #[serde(default)]
    pub increment_uses_count: Option<String>,
}

impl VerifyRequest {
    fn increment(&self) -> bool {
        self.increment_uses_count
            .as_deref()
            .is_none_or(|v| v.trim() != "false")
    }
}

fn failure(status: StatusCode) -> Response {
    (status, Json(json!({ "success": false }))).into_response()
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

pub fn purchase_response(details: &LicenseKeyWithDetails, base_url: &str) -> Value {
    let license = &details.license;
    json!({
        "success": true,
        "purchase": {
            "seller_id": "self-hosted",
            "product_id": license.product_id,
            "product_name": details.product_name,
            "permalink": details.product_name,
            "product_permalink": format!("{}/products/{}", base_url.trim_end_matches('/'), license.product_id),
            "email": details.customer_email,
            "price": 0,
            "gumroad_fee": 0,
            "currency": "usd",
            "quantity": 1,
            "discover_fee_charged": false,
            "can_contact": true,
            "referrer": "direct",
            "card": {},
            "order_number": license.id,
            "sale_id": format!("sale_{}", license.id),
            "sale_timestamp": format_timestamp(license.created_at),
            "url": "",
            "variants": {},
            "license_key": license.key,
            "ip_country": "Unknown",
            "is_recurring_billing": false,
            "is_preorder_authorization": false,
            "is_gift_receiver_purchase": false,
            "refunded": false,
            "disputed": false,
            "dispute_won": false,
            "subscription_id": null,
            "cancelled": license.is_revoked(),
            "ended": !license.is_active(),
            "uses": license.current_activations,
            "test": false,
        }
    })
}

pub async fn verify_license(
    State(state): State<AppState>,
    Form(req): Form<VerifyRequest>,
) -> Response {
    let increment = req.increment();
    let db = state.db.clone();
    let result = blocking(move || {
        licenses::verify_license(&db, &req.product_id, &req.license_key, increment)
    })
    .await;

    match result {
        Ok(v) if v.valid => Json(purchase_response(&v.license, &state.public_base_url)).into_response(),
        Ok(_) | Err(AppError::NotFound(_)) => failure(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, "license verification failed");
            failure(e.status())
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/licenses/verify", post(verify_license))
}
