use axum::{body::Bytes, extract::State, response::Response};

use crate::db::AppState;
use crate::payments::{PaymentProvider, parse_paypal_webhook};

use super::{invalid_json, provision, received};

pub async fn handle_paypal_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    match parse_paypal_webhook(&body) {
        Ok(Some(event)) => provision(state, PaymentProvider::Paypal, event).await,
        Ok(None) => received(),
        Err(e) => invalid_json(PaymentProvider::Paypal, &e),
    }
}
