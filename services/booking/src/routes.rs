//! Booking service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    config::CorsConfig,
    error::{ApiError, ApiResult},
    middleware::{require_admin, require_session},
    models::{BookingRequest, CreateFlightRequest, LoginRequest, RoleResponse, SignupRequest},
    session::SessionUser,
};

/// Create the router for the booking service
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/book/:flight_id", post(book_flight))
        .route("/tickets", get(list_tickets))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let admin_routes = Router::new()
        .route("/admin/flights", post(create_flight))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/check", get(check_session))
        .route("/auth/logout", post(logout))
        .route("/flights/:route", get(search_flights))
        .route("/flight/:flight_id", get(get_flight))
        .merge(session_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the browser client; credentials require explicit origins
pub fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "booking-service"
    }))
}

/// Register and log in
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let issued = state.sessions.signup(payload).await?;

    let jar = jar.add(state.sessions.session_cookie(issued.token));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(RoleResponse { role: issued.role }),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let issued = state.sessions.login(payload).await?;

    let jar = jar.add(state.sessions.session_cookie(issued.token));
    Ok((StatusCode::OK, jar, Json(RoleResponse { role: issued.role })))
}

/// Report the role of the current session
pub async fn check_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .check_session(state.sessions.token_from(&jar))
        .await?;

    Ok(Json(RoleResponse { role: session.role }))
}

/// Logout endpoint
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(state.sessions.removal_cookie());
    (
        StatusCode::OK,
        jar,
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// Search flights by `{from}-{to}`
pub async fn search_flights(
    State(state): State<AppState>,
    Path(route): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (from, to) = route.split_once('-').ok_or_else(|| {
        ApiError::Validation("Route must be given as {from}-{to}".to_string())
    })?;

    let flights = state.catalog.search_flights(from, to).await?;
    Ok(Json(flights))
}

/// Get a flight by ID
pub async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let flight = state.catalog.get_flight(&flight_id).await?;
    Ok(Json(flight))
}

/// Create a flight (admin only)
pub async fn create_flight(
    State(state): State<AppState>,
    payload: Result<Json<CreateFlightRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let flight = state.catalog.create_flight(payload).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

/// Book the current user onto a flight
pub async fn book_flight(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Path(flight_id): Path<String>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let ticket = state
        .bookings
        .book_flight(session.id, &flight_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List the current user's tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
) -> ApiResult<impl IntoResponse> {
    let tickets = state.bookings.list_tickets(session.id).await?;
    Ok(Json(tickets))
}
