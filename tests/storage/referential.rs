use crate::common::*;

#[test]
fn test_product_with_keys_cannot_be_deleted() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let result = services::catalog::delete_product(&ctx.db, &product.id);
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(services::catalog::get_product(&ctx.db, &product.id).is_ok());

    services::licenses::delete_license_key(&ctx.db, &license.id).unwrap();
    services::catalog::delete_product(&ctx.db, &product.id).unwrap();
    assert!(matches!(
        services::catalog::get_product(&ctx.db, &product.id),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_customer_with_keys_cannot_be_deleted() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    create_test_license(&ctx.db, &product, &customer);

    let result = services::catalog::delete_customer(&ctx.db, &customer.id);
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(services::catalog::get_customer(&ctx.db, &customer.id).is_ok());
}

#[test]
fn test_delete_missing_product_is_not_found() {
    let ctx = TestContext::new();
    assert!(matches!(
        services::catalog::delete_product(&ctx.db, "missing"),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_duplicate_customer_email_is_conflict() {
    let ctx = TestContext::new();
    create_test_customer(&ctx.db, "dup@example.com");

    let result = services::catalog::create_customer(
        &ctx.db,
        &CreateCustomer {
            email: "DUP@example.com".into(),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[test]
fn test_update_customer_rederives_name() {
    let ctx = TestContext::new();
    let customer = create_test_customer(&ctx.db, "ada@example.com");
    assert_eq!(customer.name, "ada");

    let updated = services::catalog::update_customer(
        &ctx.db,
        &customer.id,
        &UpdateCustomer {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            company: Some("Analytical Engines".into()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(updated.company, "Analytical Engines");
    assert_eq!(updated.email, "ada@example.com");
}

#[test]
fn test_update_product_fields() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);

    let updated = services::catalog::update_product(
        &ctx.db,
        &product.id,
        &UpdateProduct {
            name: Some("Widget 2".into()),
            default_usage_limit: Some(4),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.name, "Widget 2");
    assert_eq!(updated.default_usage_limit, 4);

    let result = services::catalog::update_product(&ctx.db, "missing", &UpdateProduct::default());
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn test_dashboard_counts_by_status() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    create_test_license(&ctx.db, &product, &customer);
    let revoked = create_test_license(&ctx.db, &product, &customer);
    let used_up = create_test_license(&ctx.db, &product, &customer);

    services::licenses::revoke(&ctx.db, &revoked.id).unwrap();
    services::licenses::increment_usage(&ctx.db, &used_up.id).unwrap();

    let stats = services::dashboard::stats(&ctx.db).unwrap();
    assert_eq!(stats.products, 1);
    assert_eq!(stats.customers, 1);
    assert_eq!(stats.license_keys, 3);
    assert_eq!(stats.active_keys, 1);
    assert_eq!(stats.revoked_keys, 1);
    assert_eq!(stats.expired_keys, 1);
}
