use keyward::util::SECONDS_PER_DAY;

use crate::common::*;

#[test]
fn test_issued_key_takes_product_defaults() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");

    let license = create_test_license(&ctx.db, &product, &customer);

    assert_eq!(license.key.len(), LICENSE_KEY_LENGTH);
    assert_eq!(license.status, LicenseStatus::Active);
    assert_eq!(license.max_activations, 3);
    assert_eq!(license.usage_limit, 3);
    assert_eq!(license.current_activations, 0);
    assert!(!license.is_trial);
    assert_eq!(
        license.expires_at,
        Some(license.created_at + 365 * SECONDS_PER_DAY)
    );

    let stored = services::licenses::get_license_key(&ctx.db, &license.id).unwrap();
    assert_eq!(stored.license.key, license.key);
    assert_eq!(stored.product_name, "Widget");
    assert_eq!(stored.customer_email, "buyer@example.com");
}

#[test]
fn test_non_positive_expiration_days_means_no_expiry() {
    let ctx = TestContext::new();
    let product = services::catalog::create_product(
        &ctx.db,
        &CreateProduct {
            name: "Perpetual".into(),
            description: String::new(),
            version: None,
            default_expiration_days: Some(0),
            default_usage_limit: Some(0),
        },
    )
    .unwrap();
    let customer = create_test_customer(&ctx.db, "forever@example.com");

    let license = create_test_license(&ctx.db, &product, &customer);
    assert_eq!(license.expires_at, None);
    assert_eq!(license.usage_remaining(), UsageRemaining::Unlimited);
    assert_eq!(product.version, DEFAULT_PRODUCT_VERSION);
}

#[test]
fn test_admin_issuance_checks_references() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");

    let result = services::licenses::issue_license_key(&ctx.db, "missing", &customer.id);
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = services::licenses::issue_license_key(&ctx.db, &product.id, "missing");
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let license = services::licenses::issue_license_key(&ctx.db, &product.id, &customer.id).unwrap();
    assert_eq!(license.product_id, product.id);
    assert_eq!(license.customer_id, customer.id);
}

#[test]
fn test_repeat_issuance_yields_distinct_keys() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");

    let first = create_test_license(&ctx.db, &product, &customer);
    let second = create_test_license(&ctx.db, &product, &customer);

    assert_ne!(first.key, second.key);
    assert_eq!(
        services::catalog::list_customer_license_keys(&ctx.db, &customer.id)
            .unwrap()
            .len(),
        2
    );
}
