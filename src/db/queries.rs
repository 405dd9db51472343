use rusqlite::{Connection, OptionalExtension, params, types::Value};

use crate::error::Result;
use crate::models::*;
use crate::util::{gen_id, now};

use super::from_row::{
    ADMIN_USER_COLS, CUSTOMER_COLS, EMAIL_SETTINGS_COLS, LICENSE_KEY_COLS, PRODUCT_COLS,
    query_all, query_one,
};

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Returns whether a row was updated. A builder with no fields only
    /// reports whether the row exists.
    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            let sql = format!("SELECT 1 FROM {} WHERE id = ?1", self.table);
            let exists = conn
                .query_row(&sql, params![self.id], |_| Ok(()))
                .optional()?;
            return Ok(exists.is_some());
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let now = now();
    let product = Product {
        id: gen_id(),
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        version: input
            .version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRODUCT_VERSION.to_string()),
        default_expiration_days: input
            .default_expiration_days
            .unwrap_or(DEFAULT_EXPIRATION_DAYS),
        default_usage_limit: input.default_usage_limit.unwrap_or(DEFAULT_USAGE_LIMIT),
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO products (id, name, description, version, default_expiration_days, default_usage_limit, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &product.id,
            &product.name,
            &product.description,
            &product.version,
            product.default_expiration_days,
            product.default_usage_limit,
            now,
            now
        ],
    )?;

    Ok(product)
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        params![id],
    )
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY created_at DESC, name", PRODUCT_COLS),
        [],
    )
}

pub fn update_product(conn: &Connection, id: &str, input: &UpdateProduct) -> Result<bool> {
    UpdateBuilder::new("products", id)
        .set_opt("name", input.name.as_ref().map(|n| n.trim().to_string()))
        .set_opt("description", input.description.clone())
        .set_opt("version", input.version.clone())
        .set_opt("default_expiration_days", input.default_expiration_days)
        .set_opt("default_usage_limit", input.default_usage_limit)
        .execute(conn)
}

pub fn delete_product(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_license_keys_for_product(conn: &Connection, product_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM license_keys WHERE product_id = ?1",
        params![product_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Customers ============

/// Insert a customer. `email` must already be normalized.
pub fn create_customer(
    conn: &Connection,
    email: &str,
    name: &str,
    input: &CreateCustomer,
) -> Result<Customer> {
    let now = now();
    let customer = Customer {
        id: gen_id(),
        email: email.to_string(),
        name: name.to_string(),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        company: input.company.trim().to_string(),
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO customers (id, email, name, first_name, last_name, company, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &customer.id,
            &customer.email,
            &customer.name,
            &customer.first_name,
            &customer.last_name,
            &customer.company,
            now,
            now
        ],
    )?;

    Ok(customer)
}

pub fn get_customer_by_id(conn: &Connection, id: &str) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLS),
        params![id],
    )
}

pub fn get_customer_by_email(conn: &Connection, email: &str) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM customers WHERE email = ?1", CUSTOMER_COLS),
        params![email],
    )
}

pub fn list_customers(conn: &Connection) -> Result<Vec<Customer>> {
    query_all(
        conn,
        &format!("SELECT {} FROM customers ORDER BY created_at DESC, email", CUSTOMER_COLS),
        [],
    )
}

pub fn update_customer(
    conn: &Connection,
    id: &str,
    input: &UpdateCustomer,
    email: Option<String>,
    name: Option<String>,
) -> Result<bool> {
    UpdateBuilder::new("customers", id)
        .set_opt("email", email)
        .set_opt("name", name)
        .set_opt("first_name", input.first_name.as_ref().map(|s| s.trim().to_string()))
        .set_opt("last_name", input.last_name.as_ref().map(|s| s.trim().to_string()))
        .set_opt("company", input.company.as_ref().map(|s| s.trim().to_string()))
        .execute(conn)
}

pub fn delete_customer(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_license_keys_for_customer(conn: &Connection, customer_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM license_keys WHERE customer_id = ?1",
        params![customer_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ License Keys ============

pub fn insert_license_key(conn: &Connection, license: &LicenseKey) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO license_keys ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            LICENSE_KEY_COLS
        ),
        params![
            &license.id,
            &license.key,
            &license.product_id,
            &license.customer_id,
            license.expires_at,
            license.max_activations,
            license.current_activations,
            license.usage_limit,
            license.usage_count,
            &license.metadata,
            license.status.as_ref(),
            license.is_trial,
            license.last_validated_at,
            license.created_at,
            license.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_license_key_by_id(conn: &Connection, id: &str) -> Result<Option<LicenseKey>> {
    query_one(
        conn,
        &format!("SELECT {} FROM license_keys WHERE id = ?1", LICENSE_KEY_COLS),
        params![id],
    )
}

/// Look up a key by its token, scoped to a product. A token belonging to a
/// different product is treated as absent.
pub fn get_license_key_by_product_and_key(
    conn: &Connection,
    product_id: &str,
    key: &str,
) -> Result<Option<LicenseKey>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM license_keys WHERE product_id = ?1 AND key = ?2",
            LICENSE_KEY_COLS
        ),
        params![product_id, key],
    )
}

fn details_select() -> String {
    let cols: Vec<String> = LICENSE_KEY_COLS
        .split(", ")
        .map(|c| format!("l.{}", c))
        .collect();
    format!(
        "SELECT {}, p.name, c.email, c.name FROM license_keys l
         JOIN products p ON p.id = l.product_id
         JOIN customers c ON c.id = l.customer_id",
        cols.join(", ")
    )
}

pub fn get_license_key_with_details(
    conn: &Connection,
    id: &str,
) -> Result<Option<LicenseKeyWithDetails>> {
    query_one(conn, &format!("{} WHERE l.id = ?1", details_select()), params![id])
}

pub fn list_license_keys(conn: &Connection) -> Result<Vec<LicenseKeyWithDetails>> {
    query_all(
        conn,
        &format!("{} ORDER BY l.created_at DESC", details_select()),
        [],
    )
}

pub fn list_license_keys_for_customer(
    conn: &Connection,
    customer_id: &str,
) -> Result<Vec<LicenseKeyWithDetails>> {
    query_all(
        conn,
        &format!(
            "{} WHERE l.customer_id = ?1 ORDER BY l.created_at DESC",
            details_select()
        ),
        params![customer_id],
    )
}

/// Persist the state-machine fields of a key after a transition.
pub fn save_license_key_state(conn: &Connection, license: &LicenseKey) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE license_keys
         SET status = ?1, current_activations = ?2, last_validated_at = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            license.status.as_ref(),
            license.current_activations,
            license.last_validated_at,
            license.updated_at,
            &license.id
        ],
    )?;
    Ok(affected > 0)
}

pub fn set_license_key_metadata(conn: &Connection, id: &str, metadata: &str) -> Result<bool> {
    UpdateBuilder::new("license_keys", id)
        .set("metadata", metadata.to_string())
        .execute(conn)
}

/// Apply an admin edit. `expires_at` is already parsed from the form date.
pub fn update_license_key(
    conn: &Connection,
    id: &str,
    input: &UpdateLicenseKey,
    expires_at: Option<i64>,
) -> Result<bool> {
    UpdateBuilder::new("license_keys", id)
        .set_opt("product_id", input.product_id.clone())
        .set_opt("customer_id", input.customer_id.clone())
        .set_opt("expires_at", expires_at)
        .set_opt("max_activations", input.max_activations)
        .set_opt("usage_limit", input.usage_limit)
        .set_opt("metadata", input.metadata.clone())
        .execute(conn)
}

pub fn delete_license_key(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM license_keys WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_license_keys_by_status(conn: &Connection, status: LicenseStatus) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM license_keys WHERE status = ?1",
        params![status.as_ref()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_rows(conn: &Connection, table: &'static str) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ============ Email Settings ============

pub fn insert_email_settings(
    conn: &Connection,
    input: &SaveEmailSettings,
    port: u16,
) -> Result<EmailSettings> {
    let now = now();
    let settings = EmailSettings {
        id: gen_id(),
        provider: input.provider,
        host: input.host.trim().to_string(),
        port,
        username: input.username.clone(),
        password: input.password.clone(),
        encryption: input.encryption.clone(),
        from_email: input.from_email.trim().to_string(),
        from_name: input.from_name.clone(),
        is_active: input.is_active,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        &format!(
            "INSERT INTO email_settings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            EMAIL_SETTINGS_COLS
        ),
        params![
            &settings.id,
            settings.provider.as_ref(),
            &settings.host,
            settings.port,
            &settings.username,
            &settings.password,
            &settings.encryption,
            &settings.from_email,
            &settings.from_name,
            settings.is_active,
            now,
            now
        ],
    )?;

    Ok(settings)
}

/// Overwrite every editable column of an existing row.
pub fn update_email_settings(
    conn: &Connection,
    id: &str,
    input: &SaveEmailSettings,
    port: u16,
) -> Result<bool> {
    UpdateBuilder::new("email_settings", id)
        .set("provider", input.provider.as_ref().to_string())
        .set("host", input.host.trim().to_string())
        .set("port", port)
        .set("username", input.username.clone())
        .set("password", input.password.clone())
        .set("encryption", input.encryption.clone())
        .set("from_email", input.from_email.trim().to_string())
        .set("from_name", input.from_name.clone())
        .set("is_active", input.is_active)
        .execute(conn)
}

pub fn get_email_settings_by_id(conn: &Connection, id: &str) -> Result<Option<EmailSettings>> {
    query_one(
        conn,
        &format!("SELECT {} FROM email_settings WHERE id = ?1", EMAIL_SETTINGS_COLS),
        params![id],
    )
}

pub fn get_active_email_settings(conn: &Connection) -> Result<Option<EmailSettings>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM email_settings WHERE is_active = 1 LIMIT 1",
            EMAIL_SETTINGS_COLS
        ),
        [],
    )
}

pub fn list_email_settings(conn: &Connection) -> Result<Vec<EmailSettings>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM email_settings ORDER BY is_active DESC, created_at DESC",
            EMAIL_SETTINGS_COLS
        ),
        [],
    )
}

/// Deactivate every row except `keep_id` (all rows when `None`).
pub fn deactivate_other_email_settings(conn: &Connection, keep_id: Option<&str>) -> Result<usize> {
    let now = now();
    let affected = match keep_id {
        Some(id) => conn.execute(
            "UPDATE email_settings SET is_active = 0, updated_at = ?1 WHERE is_active = 1 AND id != ?2",
            params![now, id],
        )?,
        None => conn.execute(
            "UPDATE email_settings SET is_active = 0, updated_at = ?1 WHERE is_active = 1",
            params![now],
        )?,
    };
    Ok(affected)
}

pub fn set_email_settings_active(conn: &Connection, id: &str) -> Result<bool> {
    UpdateBuilder::new("email_settings", id)
        .set("is_active", true)
        .execute(conn)
}

pub fn delete_email_settings(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM email_settings WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_active_email_settings(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM email_settings WHERE is_active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Admin Users ============

pub fn create_admin_user(conn: &Connection, username: &str, password_hash: &str) -> Result<AdminUser> {
    let admin = AdminUser {
        id: gen_id(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        created_at: now(),
    };

    conn.execute(
        &format!(
            "INSERT INTO admin_users ({}) VALUES (?1, ?2, ?3, ?4)",
            ADMIN_USER_COLS
        ),
        params![&admin.id, &admin.username, &admin.password_hash, admin.created_at],
    )?;

    Ok(admin)
}

pub fn get_admin_user_by_username(conn: &Connection, username: &str) -> Result<Option<AdminUser>> {
    query_one(
        conn,
        &format!("SELECT {} FROM admin_users WHERE username = ?1", ADMIN_USER_COLS),
        params![username],
    )
}
