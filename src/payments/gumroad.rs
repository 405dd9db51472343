use std::collections::BTreeMap;

use super::PaymentEvent;

/// Normalise a Gumroad ping (form fields already decoded).
///
/// Gumroad sends `full_name` for newer products and `purchaser_name` for
/// older ones. The whole form is retained as the payload.
pub fn parse_gumroad_ping(form: &BTreeMap<String, String>) -> PaymentEvent {
    let field = |name: &str| form.get(name).cloned().unwrap_or_default();

    let name = match field("full_name") {
        n if n.is_empty() => field("purchaser_name"),
        n => n,
    };

    PaymentEvent {
        email: field("email"),
        name,
        product_id: field("product_id"),
        payload: serde_json::to_value(form).unwrap_or(serde_json::Value::Null),
    }
}
