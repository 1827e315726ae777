use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Core Schemas (Mapped to Database) ---

/// User
///
/// Canonical account record from the `users` table. The password hash and the current
/// refresh token never leave the server: they are skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Stored lowercase, unique.
    pub username: String,
    pub email: String,
    pub full_name: String,
    // Media-host URLs.
    pub avatar: String,
    pub cover_image: Option<String>,

    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub refresh_token: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UserSummary
///
/// The projection embedded wherever a record shows its owner (videos, comments, tweets,
/// subscriber lists). Decoded from `jsonb_build_object` columns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// ChannelProfile
///
/// Public view of a channel with its subscription counters, resolved for one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    // Whether the requesting user follows this channel.
    pub is_subscribed: bool,
}

/// Video
///
/// A hosted video from the `videos` table. `video_file` and `thumbnail` are media-host URLs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    // Seconds.
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// VideoWithOwner
///
/// Listing shape: the video row with its owner's summary joined in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct VideoWithOwner {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub video: Video,
    #[sqlx(json)]
    pub owner: UserSummary,
}

/// VideoDetails
///
/// Single-video shape, enriched with like counters for the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct VideoDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub video: Video,
    #[sqlx(json)]
    pub owner: UserSummary,
    pub likes_count: i64,
    pub is_liked: bool,
}

/// VideoSummary
///
/// Narrow projection used by the liked-videos listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VideoSummary {
    pub id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub title: String,
    pub views: i64,
}

/// Comment
///
/// A comment on a video from the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CommentWithOwner {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub comment: Comment,
    #[sqlx(json)]
    pub owner: UserSummary,
    pub likes_count: i64,
}

/// Tweet
///
/// A short text post from the `tweets` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tweet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct TweetWithOwner {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub tweet: Tweet,
    #[sqlx(json)]
    pub owner: UserSummary,
    pub likes_count: i64,
}

/// Like
///
/// One row of the `likes` table. Exactly one of the three target columns is set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub tweet_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// LikeTarget
///
/// What a like points at. Maps each kind to its column in `likes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn column(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video_id",
            LikeTarget::Comment(_) => "comment_id",
            LikeTarget::Tweet(_) => "tweet_id",
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }
}

/// Outcome of flipping a like: the row that was inserted or removed.
#[derive(Debug, Clone)]
pub enum LikeToggle {
    Added(Like),
    Removed(Like),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LikeStatus {
    pub is_liked: bool,
    pub like: Like,
}

/// LikedVideo
///
/// A like on a video together with the projected video it points at.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LikedVideo {
    pub id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(json)]
    pub video: VideoSummary,
}

/// Playlist
///
/// A user-curated, ordered collection of videos (`playlists` + `playlist_videos`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PlaylistWithVideos {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub playlist: Playlist,
    // In insertion order.
    #[sqlx(json)]
    pub videos: Vec<VideoWithOwner>,
}

/// Subscription
///
/// A follower edge from `subscriber_id` to `channel_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SubscriptionToggle {
    Subscribed(Subscription),
    Unsubscribed(Subscription),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
    pub subscription: Subscription,
}

/// ChannelStats
///
/// Dashboard counters for the authenticated user's own channel.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChannelStats {
    pub channel: User,
    pub subscribers: i64,
    pub videos_count: i64,
    pub views: i64,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublishStatus {
    pub is_published: bool,
}

// --- Repository Inputs ---

/// Fields of a user row at registration time.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
}

/// Partial video update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

/// Column a video listing may be ordered by. Anything else falls back to creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("views") => VideoSort::Views,
            Some("duration") => VideoSort::Duration,
            Some("title") => VideoSort::Title,
            _ => VideoSort::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            VideoSort::CreatedAt => "v.created_at",
            VideoSort::Views => "v.views",
            VideoSort::Duration => "v.duration",
            VideoSort::Title => "v.title",
        }
    }
}

/// VideoListFilter
///
/// Validated form of the public listing query, ready for the repository.
#[derive(Debug, Clone, Default)]
pub struct VideoListFilter {
    pub search: Option<String>,
    pub owner_id: Option<Uuid>,
    pub sort: VideoSort,
    pub descending: bool,
    pub page: Page,
}

/// Page
///
/// 1-based page number and page size, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 10;
    pub const MAX_SIZE: i64 = 100;

    pub fn new(number: Option<i64>, size: Option<i64>) -> Self {
        Self {
            number: number.filter(|n| *n > 0).unwrap_or(1),
            size: size
                .filter(|s| *s > 0)
                .unwrap_or(Self::DEFAULT_SIZE)
                .min(Self::MAX_SIZE),
        }
    }

    /// Rows to skip. Saturates, so an out-of-range page reads as an empty one.
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// --- Request Payloads (Input Schemas) ---

/// PageParams
///
/// `?page=&limit=` on paginated listings.
#[derive(Debug, Clone, Deserialize, Default, IntoParams)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// VideoQuery
///
/// Query parameters of the public video listing (GET /videos).
#[derive(Debug, Clone, Deserialize, Default, IntoParams)]
pub struct VideoQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive substring matched against title and description.
    pub query: Option<String>,
    /// One of `created_at`, `views`, `duration`, `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_type: Option<String>,
    /// Restrict to one channel.
    pub user_id: Option<String>,
}

/// LoginRequest
///
/// Either `email` or `username` identifies the account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// ContentRequest
///
/// Body of comment and tweet create/update calls.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// UpdatePlaylistRequest
///
/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePlaylistRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
