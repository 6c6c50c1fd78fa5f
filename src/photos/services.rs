use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

/// A profile photo as received in the request.
pub struct PhotoUpload {
    pub body: Bytes,
    pub content_type: String,
}

/// Where an uploaded photo ended up.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub key: String,
    pub url: String,
}

pub async fn upload_profile_photo(
    storage: &dyn StorageClient,
    user_id: Uuid,
    photo: PhotoUpload,
) -> anyhow::Result<StoredPhoto> {
    anyhow::ensure!(!photo.body.is_empty(), "empty photo upload");

    let ext = ext_from_mime(&photo.content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    let size = photo.body.len();
    storage
        .put_object(&key, photo.body, &photo.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    info!(%user_id, %key, size, "profile photo uploaded");
    Ok(StoredPhoto {
        url: storage.public_url(&key),
        key,
    })
}

/// Best-effort removal of a photo whose profile change did not go through.
pub async fn discard_photo(storage: &dyn StorageClient, photo: &StoredPhoto) {
    if let Err(e) = storage.delete_object(&photo.key).await {
        warn!(error = %e, key = %photo.key, "orphaned profile photo left in storage");
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
