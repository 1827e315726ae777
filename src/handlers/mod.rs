//! HTTP handlers, one module per resource.
//!
//! Every handler resolves the caller through `AuthUser` (where required), validates path
//! identifiers with `parse_id` before touching the database, and answers with the
//! `ApiResponse` envelope. Failures surface as `ApiError`.

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::Video,
    storage::{MediaFolder, StorageState, StoredMedia, media_key},
};

pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// An uploaded file part, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

/// MultipartForm
///
/// A drained multipart body. Parts with a filename are files, everything else is text.
/// Empty file parts (browsers send them for untouched inputs) are dropped.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let filename = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    form.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            data,
                        },
                    );
                }
            } else {
                form.texts.insert(name, field.text().await?);
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.texts
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Uploads one form file to the media host under `folder`.
pub async fn store_file(
    storage: &StorageState,
    folder: MediaFolder,
    file: UploadedFile,
) -> ApiResult<StoredMedia> {
    let key = media_key(folder, file.filename.as_deref());
    Ok(storage.upload(&key, &file.content_type, file.data).await?)
}

/// Deletes a replaced or orphaned media URL. Failure is logged, never surfaced.
pub async fn discard_media(storage: &StorageState, url: &str) {
    if let Err(e) = storage.delete_by_url(url).await {
        tracing::warn!(url, "media clean-up failed: {}", e);
    }
}

/// Requires `owner_id` to be the caller.
pub fn ensure_owner(owner_id: Uuid, caller: Uuid, message: &str) -> ApiResult<()> {
    if owner_id == caller {
        Ok(())
    } else {
        Err(ApiError::forbidden(message))
    }
}

/// Loads a video the caller may see: published, or owned by the caller. Anything else
/// is reported as missing.
pub async fn visible_video(state: &AppState, video_id: Uuid, viewer: Uuid) -> ApiResult<Video> {
    state
        .repo
        .find_video(video_id)
        .await?
        .filter(|v| v.is_published || v.owner_id == viewer)
        .ok_or_else(|| ApiError::not_found("Video not found"))
}
