use axum::extract::{
    Multipart, Path, Query, State,
    multipart::MultipartRejection,
    rejection::QueryRejection,
};

use super::{MultipartForm, discard_media, ensure_owner, store_file, visible_video};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id},
    models::{
        NewVideo, Page, PublishStatus, Video, VideoDetails, VideoListFilter, VideoQuery,
        VideoSort, VideoUpdate, VideoWithOwner,
    },
    response::ApiResponse,
    storage::MediaFolder,
};

/// Translates raw listing parameters into a validated filter.
pub fn listing_filter(query: VideoQuery) -> ApiResult<VideoListFilter> {
    let owner_id = match query.user_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "user")?),
        _ => None,
    };

    let descending = !matches!(
        query.sort_type.as_deref().map(str::trim),
        Some(kind) if kind.eq_ignore_ascii_case("asc")
    );

    Ok(VideoListFilter {
        search: query
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        owner_id,
        sort: VideoSort::parse(query.sort_by.as_deref()),
        descending,
        page: Page::new(query.page, query.limit),
    })
}

/// get_all_videos
///
/// [Public Route] Paginated listing of published videos with their owner summary.
/// Supports a case-insensitive text search, an owner filter and sorting.
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    params(VideoQuery),
    responses(
        (status = 200, description = "Published videos", body = [VideoWithOwner]),
        (status = 400, description = "Invalid user id")
    )
)]
pub async fn get_all_videos(
    State(state): State<AppState>,
    query: Result<Query<VideoQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let Query(query) = query?;
    let filter = listing_filter(query)?;
    let videos = state.repo.list_videos(filter).await?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

/// publish_video
///
/// [Authenticated Route] Uploads the video file and thumbnail to the media host and stores
/// the new video, published. `duration` (seconds) is optional and defaults to 0.
#[utoipa::path(
    post,
    path = "/api/v1/videos/publish",
    tag = "videos",
    request_body(content_type = "multipart/form-data", description = "title, description, duration?, video_file, thumbnail"),
    responses(
        (status = 201, description = "Video published", body = Video),
        (status = 400, description = "Missing field or file")
    )
)]
pub async fn publish_video(
    AuthUser { id: owner_id, .. }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Video>> {
    let mut form = MultipartForm::read(multipart?).await?;

    let (Some(title), Some(description)) = (form.text("title"), form.text("description")) else {
        return Err(ApiError::bad_request("Title and description are required"));
    };
    let duration = match form.text("duration") {
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| ApiError::bad_request("Duration must be a non-negative number"))?,
        None => 0.0,
    };

    let video_file = form
        .take_file("video_file")
        .ok_or_else(|| ApiError::bad_request("Video file is required"))?;
    let thumbnail = form
        .take_file("thumbnail")
        .ok_or_else(|| ApiError::bad_request("Thumbnail is required"))?;

    let video_file = store_file(&state.storage, MediaFolder::Videos, video_file).await?;
    let thumbnail = match store_file(&state.storage, MediaFolder::Thumbnails, thumbnail).await {
        Ok(stored) => stored,
        Err(e) => {
            discard_media(&state.storage, &video_file.url).await;
            return Err(e);
        }
    };

    let video = state
        .repo
        .create_video(NewVideo {
            owner_id,
            video_file: video_file.url,
            thumbnail: thumbnail.url,
            title,
            description,
            duration,
        })
        .await?;

    tracing::info!(video_id = %video.id, %owner_id, "video published");
    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// get_video_by_id
///
/// [Authenticated Route] Fetches one video for the caller. Counts a view and moves the
/// video to the top of the caller's watch history. Unpublished videos are only visible
/// to their owner.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{video_id}",
    tag = "videos",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video found", body = VideoDetails),
        (status = 400, description = "Invalid video id"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video_by_id(
    AuthUser { id: viewer, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<VideoDetails>> {
    let video_id = parse_id(&video_id, "video")?;

    let video = visible_video(&state, video_id, viewer).await?;

    state.repo.record_view(video.id, viewer).await?;

    let details = state
        .repo
        .video_details(video.id, viewer)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::ok(details, "Video fetched successfully"))
}

/// update_video
///
/// [Authenticated Route] Owner-only partial update of title, description and thumbnail.
/// A replaced thumbnail is removed from the media host.
#[utoipa::path(
    patch,
    path = "/api/v1/videos/{video_id}",
    tag = "videos",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body(content_type = "multipart/form-data", description = "title?, description?, thumbnail?"),
    responses(
        (status = 200, description = "Video updated", body = Video),
        (status = 400, description = "Invalid id or nothing to update"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn update_video(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id(&video_id, "video")?;
    let mut form = MultipartForm::read(multipart?).await?;

    let video = state
        .repo
        .find_video(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    ensure_owner(video.owner_id, caller, "You can only edit your own videos")?;

    let mut update = VideoUpdate {
        title: form.text("title"),
        description: form.text("description"),
        thumbnail: None,
    };
    let new_thumbnail = form.take_file("thumbnail");
    if update.title.is_none() && update.description.is_none() && new_thumbnail.is_none() {
        return Err(ApiError::bad_request(
            "Provide a title, description or thumbnail to update",
        ));
    }

    if let Some(file) = new_thumbnail {
        update.thumbnail = Some(store_file(&state.storage, MediaFolder::Thumbnails, file).await?.url);
    }
    let stored_thumbnail = update.thumbnail.clone();

    let outcome = state
        .repo
        .update_video(video_id, update)
        .await
        .map_err(ApiError::from)
        .and_then(|v| v.ok_or_else(|| ApiError::not_found("Video not found")));
    let updated = match outcome {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(url) = &stored_thumbnail {
                discard_media(&state.storage, url).await;
            }
            return Err(e);
        }
    };

    if stored_thumbnail.is_some() {
        discard_media(&state.storage, &video.thumbnail).await;
    }

    Ok(ApiResponse::ok(updated, "Video updated successfully"))
}

/// delete_video
///
/// [Authenticated Route] Owner-only. Dependent comments, likes, history entries and
/// playlist entries go with the row; the media files are removed afterwards.
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}",
    tag = "videos",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted", body = Video),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn delete_video(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id(&video_id, "video")?;

    let video = state
        .repo
        .find_video(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    ensure_owner(video.owner_id, caller, "You can only delete your own videos")?;

    let deleted = state
        .repo
        .delete_video(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    discard_media(&state.storage, &deleted.video_file).await;
    discard_media(&state.storage, &deleted.thumbnail).await;

    tracing::info!(%video_id, "video deleted");
    Ok(ApiResponse::ok(deleted, "Video deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{video_id}",
    tag = "videos",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Publish status toggled", body = PublishStatus),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn toggle_publish_status(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<PublishStatus>> {
    let video_id = parse_id(&video_id, "video")?;

    let video = state
        .repo
        .find_video(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    ensure_owner(video.owner_id, caller, "You can only publish your own videos")?;

    let toggled = state
        .repo
        .toggle_publish(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::ok(
        PublishStatus {
            is_published: toggled.is_published,
        },
        "Video publish status toggled successfully",
    ))
}
