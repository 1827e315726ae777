use crate::{
    AppState,
    handlers::{healthcheck, users, videos},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous clients. The video listing only ever returns published
/// videos; that filter lives in the repository query.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /healthcheck
        .route("/healthcheck", get(healthcheck::healthcheck))
        // POST /users/register (multipart)
        .route("/users/register", post(users::register_user))
        // POST /users/login
        // Sets the accessToken/refreshToken cookies and returns the pair in the body.
        .route("/users/login", post(users::login_user))
        // POST /users/refresh-token
        // Refresh token comes from the cookie or the JSON body.
        .route("/users/refresh-token", post(users::refresh_access_token))
        // GET /videos?page=&limit=&query=&sort_by=&sort_type=&user_id=
        .route("/videos", get(videos::get_all_videos))
}
