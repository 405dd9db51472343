//! Persisted license key lifecycle: issuance and state transitions.
//!
//! Every transition loads the row inside the write transaction, applies the
//! in-memory transition from [`LicenseKey`], and saves it back, so the check
//! and the update see the same row even when writers race.

use rusqlite::Connection;

use crate::db::{Gateway, queries};
use crate::email::Notifier;
use crate::error::{AppError, Result};
use crate::models::{
    Customer, LicenseKey, LicenseKeyWithDetails, LicenseStatus, Product, UpdateLicenseKey,
    generate_license_key,
};
use crate::util::{now, parse_date};

/// Insert a fresh key for `product` and `customer_id` using the product defaults.
pub(crate) fn insert_issued_key(
    conn: &Connection,
    product: &Product,
    customer_id: &str,
) -> Result<LicenseKey> {
    let issued_at = now();
    let license = LicenseKey {
        id: crate::util::gen_id(),
        key: generate_license_key(),
        product_id: product.id.clone(),
        customer_id: customer_id.to_string(),
        expires_at: product.expiration_from(issued_at),
        max_activations: product.default_usage_limit,
        current_activations: 0,
        usage_limit: product.default_usage_limit,
        usage_count: 0,
        metadata: String::new(),
        status: LicenseStatus::Active,
        is_trial: false,
        last_validated_at: None,
        created_at: issued_at,
        updated_at: issued_at,
    };
    queries::insert_license_key(conn, &license)?;
    Ok(license)
}

/// Issue a key for an already-resolved product and customer.
pub fn issue_for(db: &Gateway, product: &Product, customer: &Customer) -> Result<LicenseKey> {
    let license = db.write(|tx| insert_issued_key(tx, product, &customer.id))?;
    tracing::info!(
        license_id = %license.id,
        product_id = %product.id,
        customer_id = %customer.id,
        "license key issued"
    );
    Ok(license)
}

/// Admin issuance by id. Both references are checked before the insert.
pub fn issue_license_key(db: &Gateway, product_id: &str, customer_id: &str) -> Result<LicenseKey> {
    let (product, customer) = db.read(|conn| {
        let product = queries::get_product_by_id(conn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
        let customer = queries::get_customer_by_id(conn, customer_id)?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer_id)))?;
        Ok((product, customer))
    })?;
    issue_for(db, &product, &customer)
}

fn load_for_update(conn: &Connection, id: &str) -> Result<LicenseKey> {
    queries::get_license_key_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("License key {} not found", id)))
}

pub fn get_license_key(db: &Gateway, id: &str) -> Result<LicenseKeyWithDetails> {
    db.read(|conn| queries::get_license_key_with_details(conn, id))?
        .ok_or_else(|| AppError::NotFound(format!("License key {} not found", id)))
}

pub fn list_license_keys(db: &Gateway) -> Result<Vec<LicenseKeyWithDetails>> {
    db.read(queries::list_license_keys)
}

/// Consume one activation. Fails with `InvalidState` when the key is not
/// valid for use (revoked, date-expired, or at its ceiling).
pub fn increment_usage(db: &Gateway, id: &str) -> Result<LicenseKey> {
    let license = db.write(|tx| {
        let mut license = load_for_update(tx, id)?;
        license.apply_increment(now())?;
        queries::save_license_key_state(tx, &license)?;
        Ok(license)
    })?;
    tracing::debug!(
        license_id = %license.id,
        activations = license.current_activations,
        status = license.status.as_ref(),
        "license activation recorded"
    );
    Ok(license)
}

pub fn revoke(db: &Gateway, id: &str) -> Result<LicenseKey> {
    let license = db.write(|tx| {
        let mut license = load_for_update(tx, id)?;
        license.apply_revoke(now());
        queries::save_license_key_state(tx, &license)?;
        Ok(license)
    })?;
    tracing::info!(license_id = %id, "license key revoked");
    Ok(license)
}

pub fn reactivate(db: &Gateway, id: &str) -> Result<LicenseKey> {
    let license = db.write(|tx| {
        let mut license = load_for_update(tx, id)?;
        license.apply_reactivate(now())?;
        queries::save_license_key_state(tx, &license)?;
        Ok(license)
    })?;
    tracing::info!(license_id = %id, "license key reactivated");
    Ok(license)
}

/// Admin edit of a key's references, limits, expiry and metadata.
pub fn update_license_key(
    db: &Gateway,
    id: &str,
    input: &UpdateLicenseKey,
) -> Result<LicenseKeyWithDetails> {
    let expires_at = input.expires_at.as_deref().map(parse_date).transpose()?;
    if input.max_activations.is_some_and(|m| m < 0) || input.usage_limit.is_some_and(|u| u < 0) {
        return Err(AppError::Validation("Limits cannot be negative".into()));
    }

    db.write(|tx| {
        if let Some(product_id) = &input.product_id
            && queries::get_product_by_id(tx, product_id)?.is_none()
        {
            return Err(AppError::NotFound(format!("Product {} not found", product_id)));
        }
        if let Some(customer_id) = &input.customer_id
            && queries::get_customer_by_id(tx, customer_id)?.is_none()
        {
            return Err(AppError::NotFound(format!("Customer {} not found", customer_id)));
        }
        if !queries::update_license_key(tx, id, input, expires_at)? {
            return Err(AppError::NotFound(format!("License key {} not found", id)));
        }
        Ok(())
    })?;

    get_license_key(db, id)
}

pub fn delete_license_key(db: &Gateway, id: &str) -> Result<()> {
    if !db.write(|tx| queries::delete_license_key(tx, id))? {
        return Err(AppError::NotFound(format!("License key {} not found", id)));
    }
    tracing::info!(license_id = %id, "license key deleted");
    Ok(())
}

/// Re-deliver an existing key to its customer through the active notifier.
///
/// Unlike provisioning, a delivery failure here is returned to the caller.
pub fn resend_license_key(db: &Gateway, notifier: &dyn Notifier, id: &str) -> Result<()> {
    let license = get_license_key(db, id)?;
    notifier.send_license_key(
        &license.customer_email,
        &license.license.key,
        &license.product_name,
    )?;
    tracing::info!(license_id = %id, email = %license.customer_email, "license key resent");
    Ok(())
}

/// Result of a verification-API lookup.
#[derive(Debug, Clone)]
pub struct Verification {
    pub valid: bool,
    pub license: LicenseKeyWithDetails,
}

/// Look up a key by `(product_id, key)` and, when requested and valid,
/// consume one activation.
///
/// Any mismatch (unknown product, unknown key, key of another product) is
/// `NotFound`.
pub fn verify_license(
    db: &Gateway,
    product_id: &str,
    key: &str,
    increment: bool,
) -> Result<Verification> {
    let product_id = product_id.trim();
    let key = key.trim();
    if product_id.is_empty() || key.is_empty() {
        return Err(AppError::NotFound("License key not found".into()));
    }

    let license = db
        .read(|conn| queries::get_license_key_by_product_and_key(conn, product_id, key))?
        .ok_or_else(|| AppError::NotFound("License key not found".into()))?;

    let mut valid = license.is_valid_for_use();
    if valid && increment {
        match increment_usage(db, &license.id) {
            Ok(_) => {}
            // Lost a race for the last activation.
            Err(AppError::InvalidState(_)) => valid = false,
            Err(err) => return Err(err),
        }
    }

    Ok(Verification {
        valid,
        license: get_license_key(db, &license.id)?,
    })
}
