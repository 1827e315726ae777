use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::ensure_owner;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id, required_text},
    models::{ContentRequest, Tweet, TweetWithOwner},
    response::ApiResponse,
};

#[utoipa::path(
    post,
    path = "/api/v1/tweets",
    tag = "tweets",
    request_body = ContentRequest,
    responses(
        (status = 201, description = "Tweet created", body = Tweet),
        (status = 400, description = "Empty content")
    )
)]
pub async fn create_tweet(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Tweet>> {
    let Json(payload) = payload?;
    let content = required_text(payload.content, "Tweet content is required")?;

    let tweet = state.repo.create_tweet(id, content).await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets/{tweet_id}",
    tag = "tweets",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Tweet found", body = Tweet),
        (status = 404, description = "Tweet not found")
    )
)]
pub async fn get_tweet(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let tweet = state
        .repo
        .find_tweet(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    Ok(ApiResponse::ok(tweet, "Tweet fetched successfully"))
}

/// get_user_tweets
///
/// [Authenticated Route] A user's tweets, newest first, with author summary and likes.
#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{user_id}",
    tag = "tweets",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Tweets", body = [TweetWithOwner]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_tweets(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<TweetWithOwner>>> {
    let user_id = parse_id(&user_id, "user")?;
    if state.repo.find_user(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let tweets = state.repo.user_tweets(user_id).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tweets/{tweet_id}",
    tag = "tweets",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Tweet updated", body = Tweet),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Tweet not found")
    )
)]
pub async fn update_tweet(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let Json(payload) = payload?;
    let content = required_text(payload.content, "Tweet content is required")?;

    let tweet = state
        .repo
        .find_tweet(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    ensure_owner(tweet.owner_id, caller, "You can only edit your own tweets")?;

    let updated = state
        .repo
        .update_tweet(tweet_id, content)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    Ok(ApiResponse::ok(updated, "Tweet updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweets/{tweet_id}",
    tag = "tweets",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Tweet deleted", body = Tweet),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Tweet not found")
    )
)]
pub async fn delete_tweet(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;

    let tweet = state
        .repo
        .find_tweet(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    ensure_owner(tweet.owner_id, caller, "You can only delete your own tweets")?;

    let deleted = state
        .repo
        .delete_tweet(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    Ok(ApiResponse::ok(deleted, "Tweet deleted successfully"))
}
