use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use uuid::Uuid;

use super::{ensure_owner, visible_video};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id, required_text},
    models::{Comment, CommentWithOwner, ContentRequest, PageParams},
    response::ApiResponse,
};

/// Loads a comment and checks it sits under `video_id` and belongs to `caller`.
async fn owned_comment(
    state: &AppState,
    video_id: Uuid,
    comment_id: Uuid,
    caller: Uuid,
) -> ApiResult<Comment> {
    let comment = state
        .repo
        .find_comment(comment_id)
        .await?
        .filter(|c| c.video_id == video_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    ensure_owner(comment.owner_id, caller, "You can only modify your own comments")?;
    Ok(comment)
}

/// get_video_comments
///
/// [Authenticated Route] Newest-first, paginated comments of a video with the author
/// summary and like counter.
#[utoipa::path(
    get,
    path = "/api/v1/comments/{video_id}",
    tag = "comments",
    params(("video_id" = String, Path, description = "Video ID"), PageParams),
    responses(
        (status = 200, description = "Comments", body = [CommentWithOwner]),
        (status = 404, description = "Video not found")
    )
)]
pub async fn get_video_comments(
    AuthUser { id: viewer, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<CommentWithOwner>>> {
    let video_id = parse_id(&video_id, "video")?;
    let Query(params) = params?;

    visible_video(&state, video_id, viewer).await?;

    let comments = state.repo.list_comments(video_id, params.page()).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{video_id}",
    tag = "comments",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body = ContentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Empty content"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn add_comment(
    AuthUser { id: owner_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "video")?;
    let Json(payload) = payload?;
    let content = required_text(payload.content, "Comment content is required")?;

    visible_video(&state, video_id, owner_id).await?;

    let comment = state.repo.create_comment(video_id, owner_id, content).await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{video_id}/{comment_id}",
    tag = "comments",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("comment_id" = String, Path, description = "Comment ID")
    ),
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn update_comment(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path((video_id, comment_id)): Path<(String, String)>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "video")?;
    let comment_id = parse_id(&comment_id, "comment")?;
    let Json(payload) = payload?;
    let content = required_text(payload.content, "Comment content is required")?;

    owned_comment(&state, video_id, comment_id, caller).await?;

    let comment = state
        .repo
        .update_comment(comment_id, content)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{video_id}/{comment_id}",
    tag = "comments",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("comment_id" = String, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment deleted", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path((video_id, comment_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "video")?;
    let comment_id = parse_id(&comment_id, "comment")?;

    owned_comment(&state, video_id, comment_id, caller).await?;

    let comment = state
        .repo
        .delete_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    Ok(ApiResponse::ok(comment, "Comment deleted successfully"))
}
