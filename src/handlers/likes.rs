use axum::extract::{Path, State};

use super::visible_video;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id},
    models::{LikeStatus, LikeTarget, LikeToggle, LikedVideo},
    response::ApiResponse,
};

/// Checks the target exists, and for videos that the caller may see, then flips the
/// caller's like on it.
async fn toggle(state: &AppState, user_id: uuid::Uuid, target: LikeTarget) -> ApiResult<ApiResponse<LikeStatus>> {
    let exists = match target {
        LikeTarget::Video(id) => {
            visible_video(state, id, user_id).await?;
            true
        }
        LikeTarget::Comment(id) => state.repo.find_comment(id).await?.is_some(),
        LikeTarget::Tweet(id) => state.repo.find_tweet(id).await?.is_some(),
    };
    if !exists {
        return Err(ApiError::not_found(format!("{} not found", capitalize(target.kind()))));
    }

    let (status, message) = match state.repo.toggle_like(user_id, target).await? {
        LikeToggle::Added(like) => (LikeStatus { is_liked: true, like }, "liked"),
        LikeToggle::Removed(like) => (LikeStatus { is_liked: false, like }, "unliked"),
    };

    tracing::debug!(%user_id, kind = target.kind(), target_id = %target.id(), action = message, "like toggled");
    Ok(ApiResponse::ok(
        status,
        format!("{} {} successfully", capitalize(target.kind()), message),
    ))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/video/{video_id}",
    tag = "likes",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeStatus),
        (status = 404, description = "Video not found")
    )
)]
pub async fn toggle_video_like(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let video_id = parse_id(&video_id, "video")?;
    toggle(&state, id, LikeTarget::Video(video_id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/comment/{comment_id}",
    tag = "likes",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeStatus),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn toggle_comment_like(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    toggle(&state, id, LikeTarget::Comment(comment_id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/tweet/{tweet_id}",
    tag = "likes",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeStatus),
        (status = 404, description = "Tweet not found")
    )
)]
pub async fn toggle_tweet_like(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    toggle(&state, id, LikeTarget::Tweet(tweet_id)).await
}

/// get_liked_videos
///
/// [Authenticated Route] The caller's liked videos, most recently liked first.
#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    tag = "likes",
    responses((status = 200, description = "Liked videos", body = [LikedVideo]))
)]
pub async fn get_liked_videos(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<LikedVideo>>> {
    let liked = state.repo.liked_videos(id).await?;
    Ok(ApiResponse::ok(liked, "Liked videos fetched successfully"))
}
