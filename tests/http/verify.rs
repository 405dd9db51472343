use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use crate::common::*;

fn verify_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/licenses/verify")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let response = ctx
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_verify_returns_gumroad_purchase() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let response = ctx
        .app()
        .oneshot(verify_request(format!(
            "product_id={}&license_key={}",
            product.id, license.key
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["purchase"]["license_key"], license.key.as_str());
    assert_eq!(json["purchase"]["email"], "buyer@example.com");
    assert_eq!(json["purchase"]["product_name"], "Widget");
    assert_eq!(json["purchase"]["uses"], 1);
    assert_eq!(json["purchase"]["cancelled"], false);
    assert_eq!(json["purchase"]["ended"], false);
    assert_eq!(
        json["purchase"]["product_permalink"],
        format!("https://licenses.example.com/products/{}", product.id)
    );
}

#[tokio::test]
async fn test_verify_without_increment() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let response = ctx
        .app()
        .oneshot(verify_request(format!(
            "product_id={}&license_key={}&increment_uses_count=false",
            product.id, license.key
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["purchase"]["uses"], 0);
}

#[tokio::test]
async fn test_verify_unknown_or_unusable_key_is_404() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 3);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);
    services::licenses::revoke(&ctx.db, &license.id).unwrap();

    for body in [
        String::new(),
        format!("product_id={}&license_key=WRONG", product.id),
        format!("product_id={}&license_key={}", product.id, license.key),
    ] {
        let response = ctx.app().oneshot(verify_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["success"], false);
    }
}
