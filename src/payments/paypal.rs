use serde::Deserialize;

use crate::error::Result;

use super::PaymentEvent;

const SALE_COMPLETED: &str = "PAYMENT.SALE.COMPLETED";

#[derive(Debug, Deserialize)]
pub struct PaypalWebhookEvent {
    pub event_type: String,
    #[serde(default)]
    pub resource: Option<PaypalResource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaypalResource {
    #[serde(default)]
    pub payer: Option<PaypalPayer>,
    /// Product id passed through the checkout's `custom` field
    #[serde(default)]
    pub custom: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaypalPayer {
    #[serde(default)]
    pub payer_info: Option<PaypalPayerInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaypalPayerInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl PaypalPayerInfo {
    fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => String::new(),
        }
    }
}

pub fn parse_paypal_webhook(body: &[u8]) -> Result<Option<PaymentEvent>> {
    let payload: serde_json::Value = serde_json::from_slice(body)?;
    let event: PaypalWebhookEvent = serde_json::from_value(payload.clone())?;

    if event.event_type != SALE_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "ignoring PayPal event");
        return Ok(None);
    }

    let resource = event.resource.unwrap_or_default();
    let info = resource
        .payer
        .and_then(|p| p.payer_info)
        .unwrap_or_default();

    Ok(Some(PaymentEvent {
        name: info.full_name(),
        email: info.email.unwrap_or_default(),
        product_id: resource.custom.unwrap_or_default(),
        payload,
    }))
}
