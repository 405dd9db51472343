use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use rusqlite::Connection;

use crate::common::*;

/// Take SQLite's writer lock on a separate connection.
fn hold_write_lock(ctx: &TestContext) -> Connection {
    let conn = Connection::open(&ctx.path).unwrap();
    conn.execute_batch("BEGIN IMMEDIATE").unwrap();
    conn
}

#[test]
fn test_write_gives_up_after_retry_budget() {
    let ctx = TestContext::with_policy(RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        jitter: 0.0,
    });
    let _lock = hold_write_lock(&ctx);

    let mut attempts = 0;
    let result = ctx.db.write(|tx| {
        attempts += 1;
        queries::create_product(
            tx,
            &CreateProduct {
                name: "Blocked".into(),
                description: String::new(),
                version: None,
                default_expiration_days: None,
                default_usage_limit: None,
            },
        )
    });

    // BEGIN IMMEDIATE fails before the closure runs.
    assert_eq!(attempts, 0);
    assert!(matches!(
        result,
        Err(AppError::RetriesExhausted { attempts: 3 })
    ));
}

#[test]
fn test_write_succeeds_once_lock_is_released() {
    let ctx = TestContext::new();
    let lock = hold_write_lock(&ctx);

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        lock.execute_batch("COMMIT").unwrap();
    });

    let product = create_test_product(&ctx.db, "Eventually", 1);
    releaser.join().unwrap();

    assert_eq!(
        services::catalog::get_product(&ctx.db, &product.id).unwrap().name,
        "Eventually"
    );
}

#[test]
fn test_failed_attempt_leaves_no_partial_write() {
    let ctx = TestContext::new();

    let result: Result<()> = ctx.db.write(|tx| {
        queries::create_product(
            tx,
            &CreateProduct {
                name: "Rolled back".into(),
                description: String::new(),
                version: None,
                default_expiration_days: None,
                default_usage_limit: None,
            },
        )?;
        Err(AppError::Validation("abort after insert".into()))
    });

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(services::catalog::list_products(&ctx.db).unwrap().is_empty());
}

#[test]
fn test_concurrent_issuance_produces_unique_keys() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = ctx.db.clone();
            let product = product.clone();
            let customer = customer.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|_| {
                        services::licenses::issue_for(&db, &product, &customer)
                            .unwrap()
                            .key
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let keys: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<_> = keys.iter().collect();

    assert_eq!(keys.len(), 80);
    assert_eq!(unique.len(), 80);
    assert_eq!(services::licenses::list_license_keys(&ctx.db).unwrap().len(), 80);
}

#[test]
fn test_concurrent_activations_never_exceed_ceiling() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 5);
    let customer = create_test_customer(&ctx.db, "buyer@example.com");
    let license = create_test_license(&ctx.db, &product, &customer);

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let db = ctx.db.clone();
            let id = license.id.clone();
            thread::spawn(move || services::licenses::increment_usage(&db, &id))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InvalidState(_))))
        .count();

    assert_eq!(succeeded, 5);
    assert_eq!(rejected, 7);

    let stored = services::licenses::get_license_key(&ctx.db, &license.id).unwrap();
    assert_eq!(stored.license.current_activations, 5);
    assert_eq!(stored.license.status, LicenseStatus::Expired);
}

#[test]
fn test_concurrent_first_purchases_share_one_customer() {
    let ctx = TestContext::new();
    let product = create_test_product(&ctx.db, "Widget", 1);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let provisioner = ctx.provisioner();
            let event = payment_event("racer@example.com", &product.id);
            thread::spawn(move || provisioner.provision(&event).unwrap())
        })
        .collect();
    for handle in handles {
        assert!(matches!(handle.join().unwrap(), ProvisionOutcome::Issued(_)));
    }

    assert_eq!(services::catalog::list_customers(&ctx.db).unwrap().len(), 1);
    assert_eq!(services::licenses::list_license_keys(&ctx.db).unwrap().len(), 6);
}
