use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod response;
pub mod storage;

// Routing segregated by access level (public, authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::{AppConfig, Env};
pub use error::{ApiError, ApiResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use response::ApiResponse;
pub use storage::{MockStorageService, S3StorageClient, StorageService, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and schema into the OpenAPI document served
/// at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::healthcheck::healthcheck,
        handlers::users::register_user, handlers::users::login_user, handlers::users::logout_user,
        handlers::users::refresh_access_token, handlers::users::change_password,
        handlers::users::get_current_user, handlers::users::update_account,
        handlers::users::update_avatar, handlers::users::update_cover_image,
        handlers::users::get_channel_profile, handlers::users::get_watch_history,
        handlers::videos::get_all_videos, handlers::videos::publish_video,
        handlers::videos::get_video_by_id, handlers::videos::update_video,
        handlers::videos::delete_video, handlers::videos::toggle_publish_status,
        handlers::comments::get_video_comments, handlers::comments::add_comment,
        handlers::comments::update_comment, handlers::comments::delete_comment,
        handlers::likes::toggle_video_like, handlers::likes::toggle_comment_like,
        handlers::likes::toggle_tweet_like, handlers::likes::get_liked_videos,
        handlers::tweets::create_tweet, handlers::tweets::get_tweet,
        handlers::tweets::get_user_tweets, handlers::tweets::update_tweet,
        handlers::tweets::delete_tweet,
        handlers::playlists::create_playlist, handlers::playlists::get_playlist_by_id,
        handlers::playlists::get_user_playlists, handlers::playlists::update_playlist,
        handlers::playlists::delete_playlist, handlers::playlists::add_video_to_playlist,
        handlers::playlists::remove_video_from_playlist,
        handlers::subscriptions::toggle_subscription,
        handlers::subscriptions::get_channel_subscribers,
        handlers::subscriptions::get_subscribed_channels,
        handlers::dashboard::get_channel_stats, handlers::dashboard::get_channel_videos,
    ),
    components(
        schemas(
            models::User, models::UserSummary, models::ChannelProfile, models::Video,
            models::VideoWithOwner, models::VideoDetails, models::VideoSummary,
            models::Comment, models::CommentWithOwner, models::Tweet, models::TweetWithOwner,
            models::Like, models::LikeStatus, models::LikedVideo, models::Playlist,
            models::PlaylistWithVideos, models::Subscription, models::SubscriptionStatus,
            models::ChannelStats, models::PublishStatus, models::LoginRequest,
            models::LoginResponse, models::TokenPair, models::RefreshTokenRequest,
            models::ChangePasswordRequest, models::UpdateAccountRequest,
            models::ContentRequest, models::CreatePlaylistRequest,
            models::UpdatePlaylistRequest,
        )
    ),
    tags(
        (name = "vidtube", description = "VidTube video-sharing API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Single shared container for the application's services and configuration. Cloned per
/// request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (Postgres in production, canned mocks in tests).
    pub repo: RepositoryState,
    /// Media host (S3-compatible bucket).
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull single components out of `AppState`.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Resolving `AuthUser` rejects the request with 401 on a
/// missing or invalid token; on success the identity is stored in the request extensions
/// so the handler's own `AuthUser` extractor does not query the user again.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// cors_layer
///
/// `"*"` allows any origin without credentials. A concrete origin enables credentials so
/// browsers send the session cookies.
pub fn cors_layer(origin: &str) -> CorsLayer {
    match origin.trim() {
        "*" | "" => CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any),
        specific => {
            let origin = HeaderValue::from_str(specific).unwrap_or_else(|_| {
                tracing::warn!(origin = specific, "CORS_ORIGIN is not a valid header value");
                HeaderValue::from_static("null")
            });
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        }
    }
}

/// create_router
///
/// Assembles the API under `/api/v1`, the Swagger UI, and the global layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .layer(body_limit)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, carrying the `x-request-id` so all log lines of one request
/// can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
