//! Provider webhook payloads normalised into [`PaymentEvent`]s.
//!
//! Each adapter is a pure function over the request body. `Ok(None)` means
//! the event type is not a completed payment and should be acknowledged
//! without provisioning.

mod gumroad;
mod paypal;
mod stripe;

pub use gumroad::*;
pub use paypal::*;
pub use stripe::*;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

pub use crate::services::PaymentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Gumroad,
    Paypal,
}
