use crate::common::*;

#[test]
fn test_increment_reaches_ceiling_and_expires() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 2);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let after_first = services::licenses::increment_usage(&ctx.db, &license.id).unwrap();
    assert_eq!(after_first.current_activations, 1);
    assert_eq!(after_first.status, LicenseStatus::Active);
    assert!(after_first.last_validated_at.is_some());

    let after_second = services::licenses::increment_usage(&ctx.db, &license.id).unwrap();
    assert_eq!(after_second.current_activations, 2);
    assert_eq!(after_second.status, LicenseStatus::Expired);

    let result = services::licenses::increment_usage(&ctx.db, &license.id);
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    let stored = services::licenses::get_license_key(&ctx.db, &license.id).unwrap();
    assert_eq!(stored.license.current_activations, 2);
}

#[test]
fn test_unlimited_key_never_hits_ceiling() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Unlimited", 0);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    for _ in 0..25 {
        services::licenses::increment_usage(&ctx.db, &license.id).unwrap();
    }
    let stored = services::licenses::get_license_key(&ctx.db, &license.id).unwrap();
    assert_eq!(stored.license.current_activations, 25);
    assert_eq!(stored.license.status, LicenseStatus::Active);
}

#[test]
fn test_revoked_key_cannot_be_used_until_reactivated() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 5);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let revoked = services::licenses::revoke(&ctx.db, &license.id).unwrap();
    assert_eq!(revoked.status, LicenseStatus::Revoked);
    assert!(matches!(
        services::licenses::increment_usage(&ctx.db, &license.id),
        Err(AppError::InvalidState(_))
    ));

    let reactivated = services::licenses::reactivate(&ctx.db, &license.id).unwrap();
    assert_eq!(reactivated.status, LicenseStatus::Active);
    services::licenses::increment_usage(&ctx.db, &license.id).unwrap();
}

#[test]
fn test_date_expired_key_cannot_be_reactivated() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 5);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    services::licenses::update_license_key(
        &ctx.db,
        &license.id,
        &UpdateLicenseKey {
            expires_at: Some(date_days_from_now(-2)),
            ..Default::default()
        },
    )
    .unwrap();
    services::licenses::revoke(&ctx.db, &license.id).unwrap();

    let result = services::licenses::reactivate(&ctx.db, &license.id);
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    let stored = services::licenses::get_license_key(&ctx.db, &license.id).unwrap();
    assert_eq!(stored.license.status, LicenseStatus::Revoked);
}

#[test]
fn test_update_rejects_unparseable_date() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 5);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let result = services::licenses::update_license_key(
        &ctx.db,
        &license.id,
        &UpdateLicenseKey {
            expires_at: Some("next tuesday".into()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn test_update_changes_limits_and_metadata() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let updated = services::licenses::update_license_key(
        &ctx.db,
        &license.id,
        &UpdateLicenseKey {
            max_activations: Some(10),
            usage_limit: Some(10),
            metadata: Some(r#"{"seat":"A"}"#.into()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.license.max_activations, 10);
    assert_eq!(updated.license.usage_limit, 10);
    assert_eq!(updated.license.metadata_value()["seat"], "A");
}

#[test]
fn test_delete_license_key() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    services::licenses::delete_license_key(&ctx.db, &license.id).unwrap();
    assert!(matches!(
        services::licenses::get_license_key(&ctx.db, &license.id),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        services::licenses::delete_license_key(&ctx.db, &license.id),
        Err(AppError::NotFound(_))
    ));
}
