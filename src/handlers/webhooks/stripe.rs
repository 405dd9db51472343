use axum::{body::Bytes, extract::State, response::Response};

use crate::db::AppState;
use crate::payments::{PaymentProvider, parse_stripe_webhook};

use super::{invalid_json, provision, received};

pub async fn handle_stripe_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match parse_stripe_webhook(&body) {
        Ok(Some(event)) => provision(state, PaymentProvider::Stripe, event).await,
        Ok(None) => received(),
        Err(e) => invalid_json(PaymentProvider::Stripe, &e),
    }
}
