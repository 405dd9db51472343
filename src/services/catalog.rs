//! Products and customers as the lifecycle engine needs them.

use crate::db::{Gateway, queries};
use crate::error::{AppError, Result};
use crate::models::*;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============ Products ============

pub fn create_product(db: &Gateway, input: &CreateProduct) -> Result<Product> {
    input.validate()?;
    let product = db.write(|tx| queries::create_product(tx, input))?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok(product)
}

pub fn get_product(db: &Gateway, id: &str) -> Result<Product> {
    db.read(|conn| queries::get_product_by_id(conn, id))?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

pub fn list_products(db: &Gateway) -> Result<Vec<Product>> {
    db.read(queries::list_products)
}

pub fn update_product(db: &Gateway, id: &str, input: &UpdateProduct) -> Result<Product> {
    input.validate()?;
    if !db.write(|tx| queries::update_product(tx, id, input))? {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }
    get_product(db, id)
}

/// Delete a product that owns no license keys.
///
/// The ownership check and the delete share one write transaction, so a key
/// issued concurrently cannot slip in between them.
pub fn delete_product(db: &Gateway, id: &str) -> Result<()> {
    db.write(|tx| {
        if queries::get_product_by_id(tx, id)?.is_none() {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }
        let owned = queries::count_license_keys_for_product(tx, id)?;
        if owned > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete product with associated license keys ({})",
                owned
            )));
        }
        queries::delete_product(tx, id)
    })?;
    tracing::info!(product_id = %id, "product deleted");
    Ok(())
}

// ============ Customers ============

pub fn create_customer(db: &Gateway, input: &CreateCustomer) -> Result<Customer> {
    input.validate()?;
    let email = normalize_email(&input.email);
    let name = display_name(&input.first_name, &input.last_name, &email);

    let customer = db.write(|tx| {
        if queries::get_customer_by_email(tx, &email)?.is_some() {
            return Err(AppError::Conflict(format!(
                "Customer with email {} already exists",
                email
            )));
        }
        queries::create_customer(tx, &email, &name, input)
    })?;
    tracing::info!(customer_id = %customer.id, "customer created");
    Ok(customer)
}

/// Resolve a customer by email, inserting one only when none exists.
///
/// Payment providers own the address format, so any non-empty value is
/// accepted after normalization. The read happens first so the common
/// repeat-buyer path never takes the write lock; the insert path re-checks
/// inside the write transaction.
pub fn find_or_create_customer(db: &Gateway, email: &str, name: &str) -> Result<Customer> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }

    if let Some(existing) = db.read(|conn| queries::get_customer_by_email(conn, &email))? {
        return Ok(existing);
    }

    let name = match name.trim() {
        "" => email_local_part(&email).to_string(),
        n => n.to_string(),
    };

    db.write(|tx| {
        if let Some(existing) = queries::get_customer_by_email(tx, &email)? {
            return Ok(existing);
        }
        let customer = queries::create_customer(tx, &email, &name, &CreateCustomer::default())?;
        tracing::info!(customer_id = %customer.id, "customer created from payment");
        Ok(customer)
    })
}

pub fn get_customer(db: &Gateway, id: &str) -> Result<Customer> {
    db.read(|conn| queries::get_customer_by_id(conn, id))?
        .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
}

pub fn list_customers(db: &Gateway) -> Result<Vec<Customer>> {
    db.read(queries::list_customers)
}

pub fn list_customer_license_keys(db: &Gateway, id: &str) -> Result<Vec<LicenseKeyWithDetails>> {
    get_customer(db, id)?;
    db.read(|conn| queries::list_license_keys_for_customer(conn, id))
}

pub fn update_customer(db: &Gateway, id: &str, input: &UpdateCustomer) -> Result<Customer> {
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    let email = input.email.as_deref().map(normalize_email);

    db.write(|tx| {
        let current = queries::get_customer_by_id(tx, id)?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))?;

        if let Some(email) = &email
            && *email != current.email
            && queries::get_customer_by_email(tx, email)?.is_some()
        {
            return Err(AppError::Conflict(format!(
                "Customer with email {} already exists",
                email
            )));
        }

        // Re-derive the display name only when a name component changed.
        let first = input.first_name.as_deref().unwrap_or(&current.first_name);
        let last = input.last_name.as_deref().unwrap_or(&current.last_name);
        let name = (input.first_name.is_some() || input.last_name.is_some()).then(|| {
            display_name(first, last, email.as_deref().unwrap_or(&current.email))
        });

        queries::update_customer(tx, id, input, email.clone(), name)?;
        Ok(())
    })?;

    get_customer(db, id)
}

/// Delete a customer that owns no license keys.
pub fn delete_customer(db: &Gateway, id: &str) -> Result<()> {
    db.write(|tx| {
        if queries::get_customer_by_id(tx, id)?.is_none() {
            return Err(AppError::NotFound(format!("Customer {} not found", id)));
        }
        let owned = queries::count_license_keys_for_customer(tx, id)?;
        if owned > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete customer with associated license keys ({})",
                owned
            )));
        }
        queries::delete_customer(tx, id)
    })?;
    tracing::info!(customer_id = %id, "customer deleted");
    Ok(())
}
