mod from_row;
mod gateway;
pub mod queries;
mod retry;

pub use from_row::*;
pub use gateway::Gateway;
pub use retry::{RetryPolicy, perform_write};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::email::Notifier;
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: Gateway,
    pub notifier: Arc<dyn Notifier>,
    /// Used to build product links in verification responses
    pub public_base_url: String,
}

/// Build the connection pool.
///
/// Every connection runs in WAL mode (readers never block the writer) with
/// `busy_timeout = 0`, so a second writer fails fast with `SQLITE_BUSY` and
/// the [`Gateway`] retry policy decides what happens next.
pub fn create_pool(path: &str, max_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 0;",
        )
    });
    let pool = Pool::builder().max_size(max_size.max(1)).build(manager)?;
    Ok(pool)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            version TEXT NOT NULL DEFAULT '1.0.0',
            default_expiration_days INTEGER NOT NULL DEFAULT 365,
            default_usage_limit INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            company TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS license_keys (
            id TEXT PRIMARY KEY,
            key TEXT NOT NULL UNIQUE,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
            customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
            expires_at INTEGER,
            max_activations INTEGER NOT NULL DEFAULT 1,
            current_activations INTEGER NOT NULL DEFAULT 0,
            usage_limit INTEGER NOT NULL DEFAULT 1,
            usage_count INTEGER NOT NULL DEFAULT 0,
            metadata TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'expired', 'revoked')),
            is_trial INTEGER NOT NULL DEFAULT 0,
            last_validated_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_license_keys_product ON license_keys(product_id);
        CREATE INDEX IF NOT EXISTS idx_license_keys_customer ON license_keys(customer_id);

        CREATE TABLE IF NOT EXISTS email_settings (
            id TEXT PRIMARY KEY,
            provider TEXT NOT NULL DEFAULT 'log',
            host TEXT NOT NULL DEFAULT '',
            port INTEGER NOT NULL DEFAULT 0,
            username TEXT NOT NULL DEFAULT '',
            password TEXT NOT NULL DEFAULT '',
            encryption TEXT NOT NULL DEFAULT 'tls',
            from_email TEXT NOT NULL,
            from_name TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        -- At most one active row; writers deactivate the others first.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_email_settings_single_active
            ON email_settings(is_active) WHERE is_active = 1;

        CREATE TABLE IF NOT EXISTS admin_users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
