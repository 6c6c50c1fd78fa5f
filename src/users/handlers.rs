use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{get, patch},
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{ProfileResponse, ProfileUpdate, UserListResponse},
    services,
};
use crate::{
    auth::{extractors::AuthUser, handlers::reject},
    error::{ApiError, ErrorEnvelope},
    photos::services::PhotoUpload,
    state::AppState,
};

const MAX_PROFILE_BODY: usize = 10 * 1024 * 1024; // 10MB
const PHOTO_FIELD: &str = "file";
const INVALID_FORM: &str = "Invalid form data";

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            patch(update_profile).layer(DefaultBodyLimit::max(MAX_PROFILE_BODY)),
        )
        .route("/users", get(list_users))
}

/// PATCH /profile (multipart)
/// Text fields: firstName, lastName, occupation, bio, instagram, facebook,
/// linkedin, github. Optional file field: `file`.
#[instrument(skip(state, mp))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProfileResponse>, ErrorEnvelope> {
    let mut mp = mp.map_err(|e| {
        debug!(error = %e, "profile update is not multipart");
        reject(&state, ApiError::Validation(INVALID_FORM))
    })?;
    let mut update = ProfileUpdate::default();
    let mut photo = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| reject(&state, malformed(e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == PHOTO_FIELD {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field.bytes().await.map_err(|e| reject(&state, malformed(e)))?;
            // Browsers send an empty part when no file was picked.
            if !body.is_empty() {
                photo = Some(PhotoUpload { body, content_type });
            }
        } else {
            let value = field.text().await.map_err(|e| reject(&state, malformed(e)))?;
            if !update.set_field(&name, value) {
                debug!(field = %name, "ignoring unknown profile field");
            }
        }
    }

    let user = services::update_profile(
        state.users.as_ref(),
        state.storage.as_ref(),
        user_id,
        update,
        photo,
    )
    .await
    .map_err(|e| reject(&state, e))?;

    Ok(Json(ProfileResponse {
        success: true,
        message: "profile updated successfully".into(),
        user,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ErrorEnvelope> {
    let users = services::list_users(state.users.as_ref())
        .await
        .map_err(|e| reject(&state, e))?;

    Ok(Json(UserListResponse {
        success: true,
        message: "User list fetched successfully".into(),
        total: users.len(),
        users,
    }))
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ApiError {
    debug!(error = %e, "unreadable multipart body");
    ApiError::Validation(INVALID_FORM)
}
