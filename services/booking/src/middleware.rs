//! Authorization gate for role-protected routes
//!
//! Every gated route goes through [`gate`]: resolve the session cookie, then
//! check the caller's role against the route's required set. Routers attach
//! it with `route_layer` via [`require_session`] or [`require_admin`].

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::Role,
    session::SessionUser,
};

/// Roles allowed on routes that only need a logged-in caller
pub const ANY_ROLE: &[Role] = &[Role::User, Role::Admin];
/// Roles allowed on administrative routes
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Decide whether a resolved caller may proceed
pub fn authorize(session: &SessionUser, required: &[Role]) -> ApiResult<()> {
    if required.contains(&session.role) {
        Ok(())
    } else {
        warn!(
            "User {} with role {} denied, requires one of {:?}",
            session.id, session.role, required
        );
        Err(ApiError::Forbidden)
    }
}

async fn gate(
    state: &AppState,
    jar: &CookieJar,
    mut req: Request<Body>,
    next: Next,
    required: &[Role],
) -> ApiResult<Response> {
    let token = state.sessions.token_from(jar);

    // A bad token on a gated route is reported the same as a missing one.
    let session = state
        .sessions
        .check_session(token)
        .await
        .map_err(|e| match e {
            ApiError::InvalidToken => ApiError::Unauthorized,
            other => other,
        })?;

    authorize(&session, required)?;

    // Add the caller to request extensions for use in handlers
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Require any valid session
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    gate(&state, &jar, req, next, ANY_ROLE).await
}

/// Require a valid session with the admin role
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    gate(&state, &jar, req, next, ADMIN_ONLY).await
}
