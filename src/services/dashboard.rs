use serde::Serialize;

use crate::db::{Gateway, queries};
use crate::error::Result;
use crate::models::LicenseStatus;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub products: i64,
    pub customers: i64,
    pub license_keys: i64,
    pub active_keys: i64,
    pub expired_keys: i64,
    pub revoked_keys: i64,
}

/// Counts by stored status. A key past its date but never touched still
/// counts as active here.
pub fn stats(db: &Gateway) -> Result<DashboardStats> {
    db.read(|conn| {
        Ok(DashboardStats {
            products: queries::count_rows(conn, "products")?,
            customers: queries::count_rows(conn, "customers")?,
            license_keys: queries::count_rows(conn, "license_keys")?,
            active_keys: queries::count_license_keys_by_status(conn, LicenseStatus::Active)?,
            expired_keys: queries::count_license_keys_by_status(conn, LicenseStatus::Expired)?,
            revoked_keys: queries::count_license_keys_by_status(conn, LicenseStatus::Revoked)?,
        })
    })
}
