use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    extractors::JsonBody,
    services,
};
use crate::{
    error::{ApiError, ErrorEnvelope, LOGIN_FAILED},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ErrorEnvelope> {
    services::register(state.users.as_ref(), payload)
        .await
        .map_err(|e| reject(&state, e))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Account Created Successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ErrorEnvelope> {
    let logged_in = services::login(state.users.as_ref(), &state.sessions, payload)
        .await
        .map_err(|e| reject(&state, e))?;

    let cookie = state
        .sessions
        .session_cookie(&logged_in.token)
        .map_err(|e| reject(&state, ApiError::upstream(LOGIN_FAILED, e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            message: format!("Welcome back {}", logged_in.user.first_name),
            user: logged_in.user,
        }),
    ))
}

/// Never fails: the client is always told to drop its session cookie.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageResponse>) {
    let mut headers = HeaderMap::new();
    match state.sessions.clear_cookie() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(e) => error!(error = %e, "failed to build logout cookie"),
    }
    (headers, Json(MessageResponse::ok("Logged out successfully.")))
}

/// Logs server-side failures and converts to the response envelope.
pub(crate) fn reject(state: &AppState, err: ApiError) -> ErrorEnvelope {
    if err.status_code().is_server_error() {
        error!(error = ?err, "request failed");
    } else {
        warn!(message = %err, "request rejected");
    }
    err.into_envelope(state.config.env)
}
