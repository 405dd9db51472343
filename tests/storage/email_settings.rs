use std::thread;

use crate::common::*;

fn active_count(ctx: &TestContext) -> i64 {
    ctx.db.read(queries::count_active_email_settings).unwrap()
}

#[test]
fn test_saving_active_row_deactivates_others() {
    let ctx = TestContext::new();

    let first =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, true))
            .unwrap();
    let second = services::settings::save_email_settings(
        &ctx.db,
        &email_settings(EmailProvider::Webhook, true),
    )
    .unwrap();

    assert_eq!(active_count(&ctx), 1);
    let active = services::settings::get_active_email_settings(&ctx.db)
        .unwrap()
        .unwrap();
    assert_eq!(active.id, second.id);
    assert!(!services::settings::get_email_settings(&ctx.db, &first.id)
        .unwrap()
        .is_active);
}

#[test]
fn test_inactive_save_leaves_active_row() {
    let ctx = TestContext::new();
    let active =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, true))
            .unwrap();
    services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, false))
        .unwrap();

    let current = services::settings::get_active_email_settings(&ctx.db)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, active.id);
    assert_eq!(services::settings::list_email_settings(&ctx.db).unwrap().len(), 2);
}

#[test]
fn test_update_existing_row() {
    let ctx = TestContext::new();
    let saved =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, false))
            .unwrap();

    let mut input = email_settings(EmailProvider::Resend, true);
    input.id = Some(saved.id.clone());
    input.password = "re_api_key".into();
    let updated = services::settings::save_email_settings(&ctx.db, &input).unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.provider, EmailProvider::Resend);
    assert!(updated.is_active);
    assert_eq!(services::settings::list_email_settings(&ctx.db).unwrap().len(), 1);

    input.id = Some("missing".into());
    assert!(matches!(
        services::settings::save_email_settings(&ctx.db, &input),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_validation_rejects_bad_settings() {
    let ctx = TestContext::new();

    let mut input = email_settings(EmailProvider::Smtp, true);
    input.port = 70_000;
    assert!(matches!(
        services::settings::save_email_settings(&ctx.db, &input),
        Err(AppError::Validation(_))
    ));

    // Port 0 is out of range for API providers too.
    let mut input = email_settings(EmailProvider::Resend, true);
    input.port = 0;
    assert!(matches!(
        services::settings::save_email_settings(&ctx.db, &input),
        Err(AppError::Validation(_))
    ));

    let mut input = email_settings(EmailProvider::Log, true);
    input.from_email = "  ".into();
    assert!(matches!(
        services::settings::save_email_settings(&ctx.db, &input),
        Err(AppError::Validation(_))
    ));

    assert_eq!(active_count(&ctx), 0);
}

#[test]
fn test_activate_switches_active_row() {
    let ctx = TestContext::new();
    let first =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, true))
            .unwrap();
    let second =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, false))
            .unwrap();

    let activated = services::settings::activate_email_settings(&ctx.db, &second.id).unwrap();
    assert!(activated.is_active);
    assert_eq!(active_count(&ctx), 1);
    assert!(!services::settings::get_email_settings(&ctx.db, &first.id)
        .unwrap()
        .is_active);

    assert!(matches!(
        services::settings::activate_email_settings(&ctx.db, "missing"),
        Err(AppError::NotFound(_))
    ));
    // A failed activation leaves the previous row active.
    assert_eq!(
        services::settings::get_active_email_settings(&ctx.db)
            .unwrap()
            .unwrap()
            .id,
        second.id
    );
}

#[test]
fn test_concurrent_activations_leave_exactly_one_active() {
    let ctx = TestContext::new();
    let ids: Vec<String> = (0..6)
        .map(|_| {
            services::settings::save_email_settings(
                &ctx.db,
                &email_settings(EmailProvider::Log, false),
            )
            .unwrap()
            .id
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cycle()
        .take(24)
        .cloned()
        .map(|id| {
            let db = ctx.db.clone();
            thread::spawn(move || services::settings::activate_email_settings(&db, &id).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(active_count(&ctx), 1);
}

#[test]
fn test_delete_email_settings() {
    let ctx = TestContext::new();
    let saved =
        services::settings::save_email_settings(&ctx.db, &email_settings(EmailProvider::Log, true))
            .unwrap();

    services::settings::delete_email_settings(&ctx.db, &saved.id).unwrap();
    assert!(services::settings::get_active_email_settings(&ctx.db)
        .unwrap()
        .is_none());
    assert!(matches!(
        services::settings::delete_email_settings(&ctx.db, &saved.id),
        Err(AppError::NotFound(_))
    ));
}
