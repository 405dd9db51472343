//! Payment provider webhooks.
//!
//! Each endpoint normalises its provider's payload and hands the resulting
//! [`PaymentEvent`] to the provisioning pipeline. Malformed JSON, or a paid
//! event missing its data, is a 400.
//! Unhandled event types and events the pipeline ignores are acknowledged
//! with 200 so the provider stops redelivering. Storage failures are a 500
//! so the provider retries later.

mod gumroad;
mod paypal;
mod stripe;

pub use gumroad::*;
pub use paypal::*;
pub use stripe::*;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::db::AppState;
use crate::error::AppError;
use crate::payments::{PaymentEvent, PaymentProvider};
use crate::services::{ProvisionOutcome, Provisioner};

use super::blocking;

fn received() -> Response {
    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

fn invalid_json(provider: PaymentProvider, error: &AppError) -> Response {
    tracing::error!(provider = provider.as_ref(), error = %error, "failed to parse webhook");
    let message = match error {
        AppError::Validation(msg) => msg.as_str(),
        _ => "Invalid JSON",
    };
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn provision(state: AppState, provider: PaymentProvider, event: PaymentEvent) -> Response {
    let provisioner = Provisioner::new(state.db.clone(), state.notifier.clone());
    match blocking(move || provisioner.provision(&event)).await {
        Ok(ProvisionOutcome::Issued(license)) => {
            tracing::info!(
                provider = provider.as_ref(),
                license_id = %license.id,
                "webhook provisioned license key"
            );
            received()
        }
        Ok(ProvisionOutcome::Ignored(reason)) => {
            tracing::warn!(provider = provider.as_ref(), reason = ?reason, "webhook payment ignored");
            received()
        }
        Err(e) => {
            tracing::error!(provider = provider.as_ref(), error = %e, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process payment" })),
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/stripe", post(handle_stripe_webhook))
        .route("/webhooks/gumroad", post(handle_gumroad_webhook))
        .route("/webhooks/paypal", post(handle_paypal_webhook))
}
