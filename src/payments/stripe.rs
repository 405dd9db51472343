use serde::Deserialize;

use crate::error::{AppError, Result};

use super::PaymentEvent;

const PAID_EVENTS: [&str; 2] = ["checkout.session.completed", "payment_intent.succeeded"];

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<StripeEventData>,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: StripePaymentObject,
}

/// The subset shared by checkout sessions and payment intents.
#[derive(Debug, Default, Deserialize)]
pub struct StripePaymentObject {
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: Option<StripeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StripeMetadata {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Normalise a Stripe webhook body.
///
/// The customer email comes from `customer_details.email` and falls back to
/// `receipt_email`. The product id is read from `metadata.product_id`.
pub fn parse_stripe_webhook(body: &[u8]) -> Result<Option<PaymentEvent>> {
    let payload: serde_json::Value = serde_json::from_slice(body)?;
    let event: StripeWebhookEvent = serde_json::from_value(payload.clone())?;

    if !PAID_EVENTS.contains(&event.event_type.as_str()) {
        tracing::debug!(event_type = %event.event_type, "ignoring Stripe event");
        return Ok(None);
    }

    let Some(data) = event.data else {
        return Err(AppError::Validation("Invalid data structure".into()));
    };
    let object = data.object;
    let details = object.customer_details.unwrap_or_default();

    let email = details
        .email
        .filter(|e| !e.is_empty())
        .or(object.receipt_email)
        .unwrap_or_default();

    Ok(Some(PaymentEvent {
        email,
        name: details.name.unwrap_or_default(),
        product_id: object
            .metadata
            .and_then(|m| m.product_id)
            .unwrap_or_default(),
        payload,
    }))
}
