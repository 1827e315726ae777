use axum::extract::{Path, State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id},
    models::{SubscriptionStatus, SubscriptionToggle, UserSummary},
    response::ApiResponse,
};

/// toggle_subscription
///
/// [Authenticated Route] Follows the channel, or unfollows it if already followed.
/// Subscribing to yourself is rejected.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/channel/{channel_id}",
    tag = "subscriptions",
    params(("channel_id" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscription toggled", body = SubscriptionStatus),
        (status = 400, description = "Invalid id or own channel"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn toggle_subscription(
    AuthUser { id: subscriber_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<SubscriptionStatus>> {
    let channel_id = parse_id(&channel_id, "channel")?;

    if channel_id == subscriber_id {
        return Err(ApiError::bad_request("You cannot subscribe to your own channel"));
    }
    if state.repo.find_user(channel_id).await?.is_none() {
        return Err(ApiError::not_found("Channel not found"));
    }

    let (status, message) = match state.repo.toggle_subscription(subscriber_id, channel_id).await? {
        SubscriptionToggle::Subscribed(subscription) => (
            SubscriptionStatus {
                is_subscribed: true,
                subscription,
            },
            "Subscribed successfully",
        ),
        SubscriptionToggle::Unsubscribed(subscription) => (
            SubscriptionStatus {
                is_subscribed: false,
                subscription,
            },
            "Unsubscribed successfully",
        ),
    };

    Ok(ApiResponse::ok(status, message))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/user/{channel_id}",
    tag = "subscriptions",
    params(("channel_id" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Channel subscribers", body = [UserSummary]),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn get_channel_subscribers(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let channel_id = parse_id(&channel_id, "channel")?;
    if state.repo.find_user(channel_id).await?.is_none() {
        return Err(ApiError::not_found("Channel not found"));
    }

    let subscribers = state.repo.channel_subscribers(channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/channel/{subscriber_id}",
    tag = "subscriptions",
    params(("subscriber_id" = String, Path, description = "Subscriber (user) ID")),
    responses(
        (status = 200, description = "Subscribed channels", body = [UserSummary]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_subscribed_channels(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;
    if state.repo.find_user(subscriber_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let channels = state.repo.subscribed_channels(subscriber_id).await?;
    Ok(ApiResponse::ok(channels, "Subscribed channels fetched successfully"))
}
