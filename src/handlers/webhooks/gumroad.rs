use std::collections::BTreeMap;

use axum::{Form, extract::State, response::Response};

use crate::db::AppState;
use crate::payments::{PaymentProvider, parse_gumroad_ping};

use super::provision;

/// Gumroad pings are form-encoded and carry a single sale each.
pub async fn handle_gumroad_webhook(
    State(state): State<AppState>,
    Form(form): Form<BTreeMap<String, String>>,
) -> Response {
    provision(state, PaymentProvider::Gumroad, parse_gumroad_ping(&form)).await
}
