use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::AppState;
use crate::handlers::blocking;
use crate::models::AdminUser;
use crate::services::admins;
use crate::util::extract_basic_credentials;

/// The authenticated admin, available to handlers as an extension.
#[derive(Clone)]
pub struct AdminContext {
    pub admin: AdminUser,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"keyward\"")],
    )
        .into_response()
}

/// HTTP Basic authentication against the `admin_users` table.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let (username, password) =
        extract_basic_credentials(request.headers()).ok_or_else(unauthorized)?;

    let db = state.db.clone();
    let admin = blocking(move || admins::authenticate(&db, &username, &password))
        .await
        .map_err(IntoResponse::into_response)?
        .ok_or_else(|| {
            tracing::warn!(path = %request.uri().path(), "admin authentication failed");
            unauthorized()
        })?;

    request.extensions_mut().insert(AdminContext { admin });
    Ok(next.run(request).await)
}
