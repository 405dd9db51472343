//! Payment event → customer → license key → notification.
//!
//! Each step commits on its own. Once the key is issued it stays issued:
//! the metadata write and the notification are best effort and only log
//! on failure.
//!
//! The pipeline does not deduplicate deliveries. Every successful call
//! issues a new key, so a webhook delivered twice yields two keys for the
//! same customer. Callers needing at-most-once issuance must dedupe on an
//! external transaction id before calling [`Provisioner::provision`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::{Gateway, queries};
use crate::email::Notifier;
use crate::error::Result;
use crate::models::LicenseKey;
use crate::services::{catalog, licenses};

/// Provider-agnostic purchase signal produced by the webhook adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub email: String,
    pub name: String,
    pub product_id: String,
    /// Raw provider payload, kept on the issued key as metadata
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingEmail,
    MissingProductId,
    UnknownProduct,
}

#[derive(Debug, Clone)]
pub enum ProvisionOutcome {
    Issued(LicenseKey),
    /// Permanently malformed input; acknowledged so the sender stops retrying
    Ignored(IgnoreReason),
}

#[derive(Clone)]
pub struct Provisioner {
    db: Gateway,
    notifier: Arc<dyn Notifier>,
}

impl Provisioner {
    pub fn new(db: Gateway, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub fn provision(&self, event: &PaymentEvent) -> Result<ProvisionOutcome> {
        let email = event.email.trim();
        let product_id = event.product_id.trim();

        if email.is_empty() {
            tracing::warn!(product_id = %product_id, "payment event without email ignored");
            return Ok(ProvisionOutcome::Ignored(IgnoreReason::MissingEmail));
        }
        if product_id.is_empty() {
            tracing::warn!(email = %email, "payment event without product id ignored");
            return Ok(ProvisionOutcome::Ignored(IgnoreReason::MissingProductId));
        }

        let Some(product) = self
            .db
            .read(|conn| queries::get_product_by_id(conn, product_id))?
        else {
            tracing::warn!(product_id = %product_id, "payment event for unknown product ignored");
            return Ok(ProvisionOutcome::Ignored(IgnoreReason::UnknownProduct));
        };

        let customer = catalog::find_or_create_customer(&self.db, email, &event.name)?;
        let mut license = licenses::issue_for(&self.db, &product, &customer)?;

        match self.store_payload(&license.id, &event.payload) {
            Ok(metadata) => license.metadata = metadata,
            Err(e) => tracing::error!(
                license_id = %license.id,
                error = %e,
                "failed to store payment payload on license key"
            ),
        }

        if let Err(e) = self
            .notifier
            .send_license_key(&customer.email, &license.key, &product.name)
        {
            tracing::error!(
                license_id = %license.id,
                email = %customer.email,
                error = %e,
                "failed to deliver license key email"
            );
        }

        tracing::info!(
            license_id = %license.id,
            customer_id = %customer.id,
            product_id = %product.id,
            "provisioned license key from payment"
        );
        Ok(ProvisionOutcome::Issued(license))
    }

    fn store_payload(&self, license_id: &str, payload: &serde_json::Value) -> Result<String> {
        let metadata = serde_json::to_string(payload)?;
        self.db
            .write(|tx| queries::set_license_key_metadata(tx, license_id, &metadata))?;
        Ok(metadata)
    }
}
