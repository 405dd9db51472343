//! Row mapping for the query layer.

use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub const PRODUCT_COLS: &str = "id, name, description, version, default_expiration_days, default_usage_limit, created_at, updated_at";

pub const CUSTOMER_COLS: &str =
    "id, email, name, first_name, last_name, company, created_at, updated_at";

pub const LICENSE_KEY_COLS: &str = "id, key, product_id, customer_id, expires_at, max_activations, current_activations, usage_limit, usage_count, metadata, status, is_trial, last_validated_at, created_at, updated_at";

pub const EMAIL_SETTINGS_COLS: &str = "id, provider, host, port, username, password, encryption, from_email, from_name, is_active, created_at, updated_at";

pub const ADMIN_USER_COLS: &str = "id, username, password_hash, created_at";

fn parse_enum<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            version: row.get(3)?,
            default_expiration_days: row.get(4)?,
            default_usage_limit: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Customer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            company: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for LicenseKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseKey {
            id: row.get(0)?,
            key: row.get(1)?,
            product_id: row.get(2)?,
            customer_id: row.get(3)?,
            expires_at: row.get(4)?,
            max_activations: row.get(5)?,
            current_activations: row.get(6)?,
            usage_limit: row.get(7)?,
            usage_count: row.get(8)?,
            metadata: row.get(9)?,
            status: parse_enum(row, 10)?,
            is_trial: row.get(11)?,
            last_validated_at: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl FromRow for LicenseKeyWithDetails {
    /// Expects `LICENSE_KEY_COLS` followed by product name, customer email, customer name.
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseKeyWithDetails {
            license: LicenseKey::from_row(row)?,
            product_name: row.get(15)?,
            customer_email: row.get(16)?,
            customer_name: row.get(17)?,
        })
    }
}

impl FromRow for EmailSettings {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(EmailSettings {
            id: row.get(0)?,
            provider: parse_enum(row, 1)?,
            host: row.get(2)?,
            port: row.get(3)?,
            username: row.get(4)?,
            password: row.get(5)?,
            encryption: row.get(6)?,
            from_email: row.get(7)?,
            from_name: row.get(8)?,
            is_active: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl FromRow for AdminUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AdminUser {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

pub fn query_one<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}
