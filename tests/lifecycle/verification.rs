use crate::common::*;

#[test]
fn test_verify_increments_by_default() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let result =
        services::licenses::verify_license(&ctx.db, &product.id, &license.key, true).unwrap();
    assert!(result.valid);
    assert_eq!(result.license.license.current_activations, 1);

    let result =
        services::licenses::verify_license(&ctx.db, &product.id, &license.key, false).unwrap();
    assert!(result.valid);
    assert_eq!(result.license.license.current_activations, 1);
}

#[test]
fn test_verify_requires_matching_product() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let other = create_test_product(&ctx.db, "Gadget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    for (product_id, key) in [
        (other.id.as_str(), license.key.as_str()),
        ("missing", license.key.as_str()),
        (product.id.as_str(), "NOT-A-KEY"),
        ("", ""),
    ] {
        let result = services::licenses::verify_license(&ctx.db, product_id, key, true);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

#[test]
fn test_verify_reports_invalid_key_without_incrementing() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let first =
        services::licenses::verify_license(&ctx.db, &product.id, &license.key, true).unwrap();
    assert!(first.valid);
    assert_eq!(first.license.license.status, LicenseStatus::Expired);

    let second =
        services::licenses::verify_license(&ctx.db, &product.id, &license.key, true).unwrap();
    assert!(!second.valid);
    assert_eq!(second.license.license.current_activations, 1);
}
