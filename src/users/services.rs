use tracing::info;
use uuid::Uuid;

use super::dto::ProfileUpdate;
use super::repo::UserStore;
use super::repo_types::UserProfile;
use crate::error::{ApiError, LIST_USERS_FAILED, PROFILE_UPDATE_FAILED};
use crate::photos::services::{discard_photo, upload_profile_photo, PhotoUpload, StoredPhoto};
use crate::storage::StorageClient;

/// Partial profile update with an optional new photo.
///
/// The photo is uploaded first. Upload and save are separate effects, so if
/// the save side fails afterwards the uploaded object is deleted again.
pub async fn update_profile(
    users: &dyn UserStore,
    storage: &dyn StorageClient,
    user_id: Uuid,
    update: ProfileUpdate,
    photo: Option<PhotoUpload>,
) -> Result<UserProfile, ApiError> {
    let stored = match photo {
        Some(photo) => Some(
            upload_profile_photo(storage, user_id, photo)
                .await
                .map_err(|e| ApiError::upstream(PROFILE_UPDATE_FAILED, e))?,
        ),
        None => None,
    };

    let res = apply_and_save(users, user_id, update, stored.as_ref()).await;
    if let (Err(_), Some(photo)) = (&res, &stored) {
        discard_photo(storage, photo).await;
    }
    res
}

async fn apply_and_save(
    users: &dyn UserStore,
    user_id: Uuid,
    update: ProfileUpdate,
    photo: Option<&StoredPhoto>,
) -> Result<UserProfile, ApiError> {
    let mut profile = users
        .find_profile(user_id)
        .await
        .map_err(|e| ApiError::upstream(PROFILE_UPDATE_FAILED, e))?
        .ok_or(ApiError::NotFound)?;

    update.apply_to(&mut profile);
    if let Some(photo) = photo {
        profile.photo_url = Some(photo.url.clone());
    }

    let saved = users
        .save_profile(&profile)
        .await
        .map_err(|e| ApiError::upstream(PROFILE_UPDATE_FAILED, e))?
        .ok_or(ApiError::NotFound)?;

    info!(%user_id, photo = photo.is_some(), "profile updated");
    Ok(saved)
}

pub async fn list_users(users: &dyn UserStore) -> Result<Vec<UserProfile>, ApiError> {
    users
        .list_profiles()
        .await
        .map_err(|e| ApiError::upstream(LIST_USERS_FAILED, e))
}
