use axum::extract::State;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{ChannelStats, Video},
    response::ApiResponse,
};

/// get_channel_stats
///
/// [Authenticated Route] Totals for the caller's channel: subscribers, videos, views and
/// likes across all their videos.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    responses((status = 200, description = "Channel stats", body = ChannelStats))
)]
pub async fn get_channel_stats(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<ChannelStats>> {
    let stats = state
        .repo
        .channel_stats(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel not found"))?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/videos",
    tag = "dashboard",
    responses((status = 200, description = "All of the caller's videos, newest first", body = [Video]))
)]
pub async fn get_channel_videos(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<Video>>> {
    let videos = state.repo.channel_videos(id).await?;
    Ok(ApiResponse::ok(videos, "Channel videos fetched successfully"))
}
