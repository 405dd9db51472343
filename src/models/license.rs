//! License key entity and its state machine.
//!
//! ```text
//!   active ──(activation ceiling reached)──▶ expired
//!   active ──revoke──▶ revoked ──reactivate (only if not date-expired)──▶ active
//! ```
//!
//! Date-based expiry is never written back eagerly. `status` may still read
//! `active` after `expires_at` has passed; it only changes on the next
//! activation attempt. Every validity check therefore recomputes expiry from
//! `expires_at` instead of trusting the stored status.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result};

/// Length of generated license key tokens.
pub const LICENSE_KEY_LENGTH: usize = 32;

/// Token alphabet: uppercase letters and digits minus the look-alikes I, O, 0, 1.
pub const LICENSE_KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Expired,
    Revoked,
}

/// Activations left on a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageRemaining {
    /// `max_activations == 0`
    Unlimited,
    Count(i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseKey {
    pub id: String,
    pub key: String,
    pub product_id: String,
    pub customer_id: String,
    /// None = never expires
    pub expires_at: Option<i64>,
    /// Activation ceiling (0 = unlimited)
    pub max_activations: i32,
    pub current_activations: i32,
    /// Verification-API counter pair, tracked independently of activations
    pub usage_limit: i32,
    pub usage_count: i32,
    /// Opaque serialized blob; holds the originating payment payload for provisioned keys
    pub metadata: String,
    pub status: LicenseStatus,
    pub is_trial: bool,
    pub last_validated_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LicenseKey {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(crate::util::now())
    }

    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    pub fn is_revoked(&self) -> bool {
        self.status == LicenseStatus::Revoked
    }

    /// A zero ceiling means unlimited and never fails the activation check.
    fn has_activations_left(&self) -> bool {
        self.max_activations == 0 || self.current_activations < self.max_activations
    }

    pub fn is_valid_for_use_at(&self, now: i64) -> bool {
        self.is_active() && !self.is_expired_at(now) && self.has_activations_left()
    }

    pub fn is_valid_for_use(&self) -> bool {
        self.is_valid_for_use_at(crate::util::now())
    }

    pub fn usage_remaining(&self) -> UsageRemaining {
        if self.max_activations == 0 {
            return UsageRemaining::Unlimited;
        }
        UsageRemaining::Count((self.max_activations - self.current_activations).max(0))
    }

    /// Consume one activation in memory. Flips the status to `expired` once the
    /// ceiling is reached. The caller persists the result.
    pub fn apply_increment(&mut self, now: i64) -> Result<()> {
        if !self.is_valid_for_use_at(now) {
            return Err(AppError::InvalidState(format!(
                "License key {} is not valid for use",
                self.id
            )));
        }
        self.current_activations += 1;
        if self.max_activations > 0 && self.current_activations >= self.max_activations {
            self.status = LicenseStatus::Expired;
        }
        self.last_validated_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_revoke(&mut self, now: i64) {
        self.status = LicenseStatus::Revoked;
        self.updated_at = now;
    }

    /// A key whose expiry date has passed cannot be brought back.
    pub fn apply_reactivate(&mut self, now: i64) -> Result<()> {
        if self.is_expired_at(now) {
            return Err(AppError::InvalidState(format!(
                "Cannot reactivate expired license key {}",
                self.id
            )));
        }
        self.status = LicenseStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    pub fn metadata_value(&self) -> serde_json::Value {
        if self.metadata.is_empty() {
            return serde_json::Value::Object(Default::default());
        }
        serde_json::from_str(&self.metadata)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

/// Generate a random license key token from [`LICENSE_KEY_ALPHABET`].
pub fn generate_license_key() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..LICENSE_KEY_LENGTH)
        .map(|_| LICENSE_KEY_ALPHABET[rng.gen_range(0..LICENSE_KEY_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLicenseKey {
    pub product_id: Option<String>,
    pub customer_id: Option<String>,
    /// Calendar date `YYYY-MM-DD`; expiry is set to the start of that day (UTC)
    pub expires_at: Option<String>,
    pub max_activations: Option<i32>,
    pub usage_limit: Option<i32>,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyWithDetails {
    #[serde(flatten)]
    pub license: LicenseKey,
    pub product_name: String,
    pub customer_email: String,
    pub customer_name: String,
}
