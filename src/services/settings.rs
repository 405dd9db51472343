//! Outbound email configuration with a single-active-row invariant.
//!
//! Activation always deactivates the other rows and activates the target
//! inside the same write transaction, so no reader ever observes two active
//! rows, and a failed attempt rolls back to the previous active row.

use crate::db::{Gateway, queries};
use crate::email::Notifier;
use crate::error::{AppError, Result};
use crate::models::{EmailSettings, SaveEmailSettings};

/// Create or update a settings row. When `is_active` is set the other rows
/// are deactivated first.
pub fn save_email_settings(db: &Gateway, input: &SaveEmailSettings) -> Result<EmailSettings> {
    let port = input.validate()?;

    let settings = db.write(|tx| {
        let id = match &input.id {
            Some(id) => {
                if queries::get_email_settings_by_id(tx, id)?.is_none() {
                    return Err(AppError::NotFound(format!("Email settings {} not found", id)));
                }
                if input.is_active {
                    queries::deactivate_other_email_settings(tx, Some(id))?;
                }
                queries::update_email_settings(tx, id, input, port)?;
                id.clone()
            }
            None => {
                if input.is_active {
                    queries::deactivate_other_email_settings(tx, None)?;
                }
                queries::insert_email_settings(tx, input, port)?.id
            }
        };
        queries::get_email_settings_by_id(tx, &id)?
            .ok_or_else(|| AppError::Internal("Email settings vanished after save".into()))
    })?;

    tracing::info!(
        settings_id = %settings.id,
        provider = settings.provider.as_ref(),
        active = settings.is_active,
        "email settings saved"
    );
    Ok(settings)
}

/// Make `id` the only active settings row.
pub fn activate_email_settings(db: &Gateway, id: &str) -> Result<EmailSettings> {
    let settings = db.write(|tx| {
        if queries::get_email_settings_by_id(tx, id)?.is_none() {
            return Err(AppError::NotFound(format!("Email settings {} not found", id)));
        }
        queries::deactivate_other_email_settings(tx, Some(id))?;
        queries::set_email_settings_active(tx, id)?;
        queries::get_email_settings_by_id(tx, id)?
            .ok_or_else(|| AppError::Internal("Email settings vanished after activation".into()))
    })?;
    tracing::info!(settings_id = %id, "email settings activated");
    Ok(settings)
}

pub fn get_active_email_settings(db: &Gateway) -> Result<Option<EmailSettings>> {
    db.read(queries::get_active_email_settings)
}

pub fn get_email_settings(db: &Gateway, id: &str) -> Result<EmailSettings> {
    db.read(|conn| queries::get_email_settings_by_id(conn, id))?
        .ok_or_else(|| AppError::NotFound(format!("Email settings {} not found", id)))
}

pub fn list_email_settings(db: &Gateway) -> Result<Vec<EmailSettings>> {
    db.read(queries::list_email_settings)
}

pub fn delete_email_settings(db: &Gateway, id: &str) -> Result<()> {
    if !db.write(|tx| queries::delete_email_settings(tx, id))? {
        return Err(AppError::NotFound(format!("Email settings {} not found", id)));
    }
    Ok(())
}

/// Send a test message through the currently active configuration.
pub fn send_test_email(notifier: &dyn Notifier, to: &str) -> Result<()> {
    crate::models::validate_email(to)?;
    notifier.send_test(to)
}
