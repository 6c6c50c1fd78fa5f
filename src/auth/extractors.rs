use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        request::Parts,
        HeaderMap,
    },
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::handlers::reject;
use super::session::{SessionIssuer, SESSION_COOKIE_NAME};
use crate::error::{ApiError, ErrorEnvelope};
use crate::state::AppState;

const INVALID_BODY: &str = "Invalid request body";

/// Verified identifier of the caller, taken from the `token` cookie or a
/// `Bearer` header.
pub struct AuthUser(pub Uuid);

fn token_from_cookies(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn token_from_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionIssuer: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionIssuer::from_ref(state);
        let Some(token) =
            token_from_cookies(&parts.headers).or_else(|| token_from_bearer(&parts.headers))
        else {
            debug!("no session token on request");
            return Err(ApiError::Unauthorized);
        };
        let claims = sessions.verify(token)?;
        Ok(AuthUser(claims.sub))
    }
}

/// JSON request body whose failures use the error envelope.
///
/// A missing, blank or non-JSON body decodes to `T::default()` so the
/// validator reports the absent fields.
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

#[async_trait]
impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Default,
{
    type Rejection = ErrorEnvelope;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "unreadable request body");
            reject(state, ApiError::Validation(INVALID_BODY))
        })?;

        if !json || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }
        serde_json::from_slice(&body).map(JsonBody).map_err(|e| {
            debug!(error = %e, "malformed JSON body");
            reject(state, ApiError::Validation(INVALID_BODY))
        })
    }
}
