//! Admin JSON API. Every route requires HTTP Basic credentials of a row in
//! `admin_users`.

mod customers;
mod dashboard;
mod license_keys;
mod products;
mod settings;

pub use customers::*;
pub use dashboard::*;
pub use license_keys::*;
pub use products::*;
pub use settings::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(get_dashboard))
        // Products
        .route("/admin/products", get(list_products).post(create_product))
        .route(
            "/admin/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        // Customers
        .route("/admin/customers", get(list_customers).post(create_customer))
        .route(
            "/admin/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route(
            "/admin/customers/{id}/license-keys",
            get(list_customer_license_keys),
        )
        // License keys
        .route(
            "/admin/license-keys",
            get(list_license_keys).post(issue_license_key),
        )
        .route(
            "/admin/license-keys/{id}",
            get(get_license_key)
                .put(update_license_key)
                .delete(delete_license_key),
        )
        .route("/admin/license-keys/{id}/revoke", post(revoke_license_key))
        .route(
            "/admin/license-keys/{id}/reactivate",
            post(reactivate_license_key),
        )
        .route(
            "/admin/license-keys/{id}/increment",
            post(increment_license_key_usage),
        )
        .route("/admin/license-keys/{id}/resend", post(resend_license_key))
        // Email settings
        .route(
            "/admin/email-settings",
            get(list_email_settings).post(save_email_settings),
        )
        .route("/admin/email-settings/active", get(get_active_email_settings))
        .route("/admin/email-settings/test", post(send_test_email))
        .route(
            "/admin/email-settings/{id}",
            get(get_email_settings)
                .put(update_email_settings)
                .delete(delete_email_settings),
        )
        .route(
            "/admin/email-settings/{id}/activate",
            post(activate_email_settings),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
