use crate::{
    AppState,
    handlers::{comments, dashboard, likes, playlists, subscriptions, tweets, users, videos},
};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every handler here receives a validated `AuthUser`. The auth middleware layered over
/// this router in `create_router` rejects the request with 401 before any handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Account ---
        .route("/users/logout", post(users::logout_user))
        .route("/users/change-password", post(users::change_password))
        .route("/users/current-user", get(users::get_current_user))
        .route("/users/update-account", patch(users::update_account))
        // Multipart uploads; the old file is removed from the media host afterwards.
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/users/c/{username}", get(users::get_channel_profile))
        .route("/users/history", get(users::get_watch_history))
        // --- Videos ---
        .route("/videos/publish", post(videos::publish_video))
        // GET records a view; POST toggles the publish flag (owner only).
        .route(
            "/videos/{video_id}",
            get(videos::get_video_by_id)
                .patch(videos::update_video)
                .delete(videos::delete_video)
                .post(videos::toggle_publish_status),
        )
        // --- Comments ---
        .route(
            "/comments/{video_id}",
            get(comments::get_video_comments).post(comments::add_comment),
        )
        .route(
            "/comments/{video_id}/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // --- Likes (toggle semantics) ---
        .route("/likes/video/{video_id}", post(likes::toggle_video_like))
        .route("/likes/comment/{comment_id}", post(likes::toggle_comment_like))
        .route("/likes/tweet/{tweet_id}", post(likes::toggle_tweet_like))
        .route("/likes/videos", get(likes::get_liked_videos))
        // --- Tweets ---
        .route("/tweets", post(tweets::create_tweet))
        .route("/tweets/user/{user_id}", get(tweets::get_user_tweets))
        .route(
            "/tweets/{tweet_id}",
            get(tweets::get_tweet)
                .patch(tweets::update_tweet)
                .delete(tweets::delete_tweet),
        )
        // --- Playlists ---
        .route("/playlist", post(playlists::create_playlist))
        .route("/playlist/user/{user_id}", get(playlists::get_user_playlists))
        .route(
            "/playlist/add/{video_id}/{playlist_id}",
            patch(playlists::add_video_to_playlist),
        )
        .route(
            "/playlist/remove/{video_id}/{playlist_id}",
            patch(playlists::remove_video_from_playlist),
        )
        .route(
            "/playlist/{playlist_id}",
            get(playlists::get_playlist_by_id)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        // --- Subscriptions ---
        // Path naming is historical: /user/{id} lists a channel's subscribers,
        // /channel/{id} (GET) lists the channels a user follows.
        .route(
            "/subscriptions/channel/{channel_id}",
            post(subscriptions::toggle_subscription).get(subscriptions::get_subscribed_channels),
        )
        .route(
            "/subscriptions/user/{channel_id}",
            get(subscriptions::get_channel_subscribers),
        )
        // --- Dashboard ---
        .route("/dashboard/stats", get(dashboard::get_channel_stats))
        .route("/dashboard/videos", get(dashboard::get_channel_videos))
}
