use crate::db::{Gateway, queries};
use crate::error::{AppError, Result};
use crate::models::{AdminUser, hash_password};

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn create_admin(db: &Gateway, username: &str, password: &str) -> Result<AdminUser> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    // Hashed before the write so the lock is not held during key stretching.
    let password_hash = hash_password(password)?;
    let admin = db.write(|tx| {
        if queries::get_admin_user_by_username(tx, username)?.is_some() {
            return Err(AppError::Conflict(format!(
                "Admin user {} already exists",
                username
            )));
        }
        queries::create_admin_user(tx, username, &password_hash)
    })?;
    tracing::info!(username = %admin.username, "admin user created");
    Ok(admin)
}

/// Create the bootstrap admin unless one with that username exists.
/// Returns whether a row was inserted.
pub fn ensure_default_admin(db: &Gateway, username: &str, password: &str) -> Result<bool> {
    match create_admin(db, username, password) {
        Ok(_) => Ok(true),
        Err(AppError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check credentials. Unknown users and wrong passwords are indistinguishable.
pub fn authenticate(db: &Gateway, username: &str, password: &str) -> Result<Option<AdminUser>> {
    let admin = db.read(|conn| queries::get_admin_user_by_username(conn, username))?;
    Ok(admin.filter(|a| a.check_password(password)))
}
