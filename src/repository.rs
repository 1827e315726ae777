use crate::models::{
    ChannelProfile, ChannelStats, Comment, CommentWithOwner, Like, LikeTarget, LikeToggle,
    LikedVideo, NewUser, NewVideo, Page, Playlist, PlaylistWithVideos, Subscription,
    SubscriptionToggle, Tweet, TweetWithOwner, User, UserSummary, Video, VideoDetails,
    VideoListFilter, VideoUpdate, VideoWithOwner,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Persistence failures. Unique-key violations are lifted out of the driver error so the
/// HTTP layer can answer 409 instead of 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The abstract contract for every persistence operation. Handlers only see this trait,
/// so tests swap in canned implementations without a database.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    // Matches on either key; `None` keys are ignored.
    async fn find_user_by_login(
        &self,
        username: Option<String>,
        email: Option<String>,
    ) -> RepoResult<Option<User>>;
    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> RepoResult<()>;
    async fn update_password(&self, id: Uuid, password_hash: String) -> RepoResult<()>;
    async fn update_account(&self, id: Uuid, full_name: String, email: String) -> RepoResult<Option<User>>;
    async fn update_avatar(&self, id: Uuid, url: String) -> RepoResult<Option<User>>;
    async fn update_cover_image(&self, id: Uuid, url: String) -> RepoResult<Option<User>>;
    async fn channel_profile(&self, username: String, viewer: Uuid) -> RepoResult<Option<ChannelProfile>>;
    async fn watch_history(&self, user_id: Uuid) -> RepoResult<Vec<VideoWithOwner>>;

    // --- Videos ---
    // Published videos only.
    async fn list_videos(&self, filter: VideoListFilter) -> RepoResult<Vec<VideoWithOwner>>;
    async fn create_video(&self, video: NewVideo) -> RepoResult<Video>;
    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>>;
    async fn video_details(&self, id: Uuid, viewer: Uuid) -> RepoResult<Option<VideoDetails>>;
    // Bumps the view counter and moves the video to the top of the viewer's history.
    async fn record_view(&self, video_id: Uuid, viewer: Uuid) -> RepoResult<()>;
    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> RepoResult<Option<Video>>;
    async fn delete_video(&self, id: Uuid) -> RepoResult<Option<Video>>;
    async fn toggle_publish(&self, id: Uuid) -> RepoResult<Option<Video>>;

    // --- Comments ---
    async fn list_comments(&self, video_id: Uuid, page: Page) -> RepoResult<Vec<CommentWithOwner>>;
    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: String) -> RepoResult<Comment>;
    async fn find_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn update_comment(&self, id: Uuid, content: String) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;

    // --- Likes ---
    async fn toggle_like(&self, user_id: Uuid, target: LikeTarget) -> RepoResult<LikeToggle>;
    async fn liked_videos(&self, user_id: Uuid) -> RepoResult<Vec<LikedVideo>>;

    // --- Tweets ---
    async fn create_tweet(&self, owner_id: Uuid, content: String) -> RepoResult<Tweet>;
    async fn find_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>>;
    async fn user_tweets(&self, owner_id: Uuid) -> RepoResult<Vec<TweetWithOwner>>;
    async fn update_tweet(&self, id: Uuid, content: String) -> RepoResult<Option<Tweet>>;
    async fn delete_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>>;

    // --- Playlists ---
    async fn create_playlist(&self, owner_id: Uuid, name: String, description: String) -> RepoResult<Playlist>;
    async fn find_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>>;
    async fn playlist_with_videos(&self, id: Uuid) -> RepoResult<Option<PlaylistWithVideos>>;
    async fn user_playlists(&self, owner_id: Uuid) -> RepoResult<Vec<PlaylistWithVideos>>;
    async fn update_playlist(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> RepoResult<Option<Playlist>>;
    async fn delete_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>>;
    // Returns false when the video was already in the playlist.
    async fn add_video_to_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool>;
    // Returns false when the video was not in the playlist.
    async fn remove_video_from_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool>;

    // --- Subscriptions ---
    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> RepoResult<SubscriptionToggle>;
    async fn channel_subscribers(&self, channel_id: Uuid) -> RepoResult<Vec<UserSummary>>;
    async fn subscribed_channels(&self, subscriber_id: Uuid) -> RepoResult<Vec<UserSummary>>;

    // --- Dashboard ---
    async fn channel_stats(&self, owner_id: Uuid) -> RepoResult<Option<ChannelStats>>;
    // Every video of the channel, published or not.
    async fn channel_videos(&self, owner_id: Uuid) -> RepoResult<Vec<Video>>;
}

/// RepositoryState
///
/// The concrete type used to share persistence access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Owner projection embedded in listings. Expects the owner joined as `u`.
const OWNER_JSON: &str =
    "jsonb_build_object('id', u.id, 'username', u.username, 'full_name', u.full_name, 'avatar', u.avatar)";

/// Substring pattern for `ILIKE ... ESCAPE '\'`. Wildcards in the input match literally.
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgresRepository
///
/// The concrete implementation of `Repository`, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lifts a unique-key violation into `RepositoryError::Duplicate`.
fn duplicate_as(what: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepositoryError::Duplicate(what.to_string());
            }
        }
        RepositoryError::Database(err)
    }
}

fn videos_with_owner_sql() -> String {
    format!(
        "SELECT v.*, {} AS owner FROM videos v JOIN users u ON u.id = v.owner_id",
        OWNER_JSON
    )
}

fn playlists_with_videos_sql() -> String {
    format!(
        r#"
        SELECT p.*,
            COALESCE((
                SELECT jsonb_agg(to_jsonb(v) || jsonb_build_object('owner', {owner}) ORDER BY pv.added_at)
                FROM playlist_videos pv
                JOIN videos v ON v.id = pv.video_id
                JOIN users u ON u.id = v.owner_id
                WHERE pv.playlist_id = p.id
            ), '[]'::jsonb) AS videos
        FROM playlists p
        "#,
        owner = OWNER_JSON
    )
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.avatar)
        .bind(user.cover_image)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_as("user with this email or username"))
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_login(
        &self,
        username: Option<String>,
        email: Option<String>,
    ) -> RepoResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::TEXT IS NOT NULL AND username = $1)
               OR ($2::TEXT IS NOT NULL AND email = $2)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> RepoResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> RepoResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_account(&self, id: Uuid, full_name: String, email: String) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET full_name = $2, email = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(duplicate_as("user with this email"))
    }

    async fn update_avatar(&self, id: Uuid, url: String) -> RepoResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_cover_image(&self, id: Uuid, url: String) -> RepoResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "UPDATE users SET cover_image = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// channel_profile
    ///
    /// Joins the subscription edges twice (as channel and as subscriber) and resolves
    /// whether `viewer` follows the channel.
    async fn channel_profile(&self, username: String, viewer: Uuid) -> RepoResult<Option<ChannelProfile>> {
        Ok(sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT u.id, u.username, u.email, u.full_name, u.avatar, u.cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s WHERE s.channel_id = u.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn watch_history(&self, user_id: Uuid) -> RepoResult<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} JOIN watch_history h ON h.video_id = v.id WHERE h.user_id = $1 ORDER BY h.watched_at DESC",
            videos_with_owner_sql()
        );
        Ok(sqlx::query_as::<_, VideoWithOwner>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // --- VIDEOS ---

    /// list_videos
    ///
    /// Dynamic filtering through `QueryBuilder` so every user value is a bound parameter.
    /// The sort column comes from a closed enum, never from raw input.
    async fn list_videos(&self, filter: VideoListFilter) -> RepoResult<Vec<VideoWithOwner>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(videos_with_owner_sql());
        builder.push(" WHERE v.is_published = true");

        if let Some(search) = filter.search {
            let pattern = like_pattern(&search);
            builder.push(" AND (v.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(r" ESCAPE '\' OR v.description ILIKE ");
            builder.push_bind(pattern);
            builder.push(r" ESCAPE '\')");
        }

        if let Some(owner_id) = filter.owner_id {
            builder.push(" AND v.owner_id = ");
            builder.push_bind(owner_id);
        }

        builder.push(" ORDER BY ");
        builder.push(filter.sort.column());
        builder.push(if filter.descending { " DESC" } else { " ASC" });
        builder.push(", v.id");

        builder.push(" LIMIT ");
        builder.push_bind(filter.page.size);
        builder.push(" OFFSET ");
        builder.push_bind(filter.page.offset());

        Ok(builder
            .build_query_as::<VideoWithOwner>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_video(&self, video: NewVideo) -> RepoResult<Video> {
        Ok(sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, owner_id, video_file, thumbnail, title, description, duration, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(video.owner_id)
        .bind(video.video_file)
        .bind(video.thumbnail)
        .bind(video.title)
        .bind(video.description)
        .bind(video.duration)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        Ok(sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn video_details(&self, id: Uuid, viewer: Uuid) -> RepoResult<Option<VideoDetails>> {
        let sql = format!(
            r#"
            SELECT v.*, {} AS owner,
                (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS likes_count,
                EXISTS (SELECT 1 FROM likes l WHERE l.video_id = v.id AND l.liked_by = $2) AS is_liked
            FROM videos v JOIN users u ON u.id = v.owner_id
            WHERE v.id = $1
            "#,
            OWNER_JSON
        );
        Ok(sqlx::query_as::<_, VideoDetails>(&sql)
            .bind(id)
            .bind(viewer)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn record_view(&self, video_id: Uuid, viewer: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO watch_history (user_id, video_id, watched_at) VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = NOW()
            "#,
        )
        .bind(viewer)
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// update_video
    ///
    /// `COALESCE` keeps the stored column wherever the update carries `None`.
    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> RepoResult<Option<Video>> {
        Ok(sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail = COALESCE($4, thumbnail),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.thumbnail)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        Ok(sqlx::query_as::<_, Video>("DELETE FROM videos WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_publish(&self, id: Uuid) -> RepoResult<Option<Video>> {
        Ok(sqlx::query_as::<_, Video>(
            "UPDATE videos SET is_published = NOT is_published, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, video_id: Uuid, page: Page) -> RepoResult<Vec<CommentWithOwner>> {
        let sql = format!(
            r#"
            SELECT c.*, {} AS owner,
                (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id) AS likes_count
            FROM comments c JOIN users u ON u.id = c.owner_id
            WHERE c.video_id = $1
            ORDER BY c.created_at DESC, c.id
            LIMIT $2 OFFSET $3
            "#,
            OWNER_JSON
        );
        Ok(sqlx::query_as::<_, CommentWithOwner>(&sql)
            .bind(video_id)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: String) -> RepoResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, video_id, owner_id, content) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(video_id)
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_comment(&self, id: Uuid, content: String) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>("DELETE FROM comments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- LIKES ---

    /// toggle_like
    ///
    /// Removes the caller's like on the target if present, otherwise inserts one. Both steps
    /// run in one transaction; a concurrent duplicate insert trips the partial unique index
    /// and surfaces as `Duplicate`.
    async fn toggle_like(&self, user_id: Uuid, target: LikeTarget) -> RepoResult<LikeToggle> {
        let column = target.column();
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, Like>(&format!(
            "DELETE FROM likes WHERE liked_by = $1 AND {} = $2 RETURNING *",
            column
        ))
        .bind(user_id)
        .bind(target.id())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(like) = removed {
            tx.commit().await?;
            return Ok(LikeToggle::Removed(like));
        }

        let added = sqlx::query_as::<_, Like>(&format!(
            "INSERT INTO likes (id, liked_by, {}) VALUES ($1, $2, $3) RETURNING *",
            column
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target.id())
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_as("like"))?;

        tx.commit().await?;
        Ok(LikeToggle::Added(added))
    }

    async fn liked_videos(&self, user_id: Uuid) -> RepoResult<Vec<LikedVideo>> {
        Ok(sqlx::query_as::<_, LikedVideo>(
            r#"
            SELECT l.id, l.created_at,
                jsonb_build_object(
                    'id', v.id, 'video_file', v.video_file, 'thumbnail', v.thumbnail,
                    'duration', v.duration, 'title', v.title, 'views', v.views
                ) AS video
            FROM likes l JOIN videos v ON v.id = l.video_id
            WHERE l.liked_by = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // --- TWEETS ---

    async fn create_tweet(&self, owner_id: Uuid, content: String) -> RepoResult<Tweet> {
        Ok(sqlx::query_as::<_, Tweet>(
            "INSERT INTO tweets (id, owner_id, content) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_tweets(&self, owner_id: Uuid) -> RepoResult<Vec<TweetWithOwner>> {
        let sql = format!(
            r#"
            SELECT t.*, {} AS owner,
                (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS likes_count
            FROM tweets t JOIN users u ON u.id = t.owner_id
            WHERE t.owner_id = $1
            ORDER BY t.created_at DESC
            "#,
            OWNER_JSON
        );
        Ok(sqlx::query_as::<_, TweetWithOwner>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_tweet(&self, id: Uuid, content: String) -> RepoResult<Option<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>(
            "UPDATE tweets SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>> {
        Ok(sqlx::query_as::<_, Tweet>("DELETE FROM tweets WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- PLAYLISTS ---

    async fn create_playlist(&self, owner_id: Uuid, name: String, description: String) -> RepoResult<Playlist> {
        Ok(sqlx::query_as::<_, Playlist>(
            "INSERT INTO playlists (id, owner_id, name, description) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>> {
        Ok(sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// playlist_with_videos
    ///
    /// Aggregates the playlist's videos (each with its owner) into one JSON array column,
    /// preserving insertion order.
    async fn playlist_with_videos(&self, id: Uuid) -> RepoResult<Option<PlaylistWithVideos>> {
        let sql = format!("{} WHERE p.id = $1", playlists_with_videos_sql());
        Ok(sqlx::query_as::<_, PlaylistWithVideos>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_playlists(&self, owner_id: Uuid) -> RepoResult<Vec<PlaylistWithVideos>> {
        let sql = format!(
            "{} WHERE p.owner_id = $1 ORDER BY p.created_at DESC",
            playlists_with_videos_sql()
        );
        Ok(sqlx::query_as::<_, PlaylistWithVideos>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_playlist(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> RepoResult<Option<Playlist>> {
        Ok(sqlx::query_as::<_, Playlist>(
            r#"
            UPDATE playlists
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>> {
        Ok(sqlx::query_as::<_, Playlist>("DELETE FROM playlists WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add_video_to_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            sqlx::query("UPDATE playlists SET updated_at = NOW() WHERE id = $1")
                .bind(playlist_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(result.rows_affected() > 0)
    }

    async fn remove_video_from_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            sqlx::query("UPDATE playlists SET updated_at = NOW() WHERE id = $1")
                .bind(playlist_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(result.rows_affected() > 0)
    }

    // --- SUBSCRIPTIONS ---

    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> RepoResult<SubscriptionToggle> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, Subscription>(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2 RETURNING *",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(subscription) = removed {
            tx.commit().await?;
            return Ok(SubscriptionToggle::Unsubscribed(subscription));
        }

        let added = sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_as("subscription"))?;

        tx.commit().await?;
        Ok(SubscriptionToggle::Subscribed(added))
    }

    async fn channel_subscribers(&self, channel_id: Uuid) -> RepoResult<Vec<UserSummary>> {
        Ok(sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar
            FROM subscriptions s JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn subscribed_channels(&self, subscriber_id: Uuid) -> RepoResult<Vec<UserSummary>> {
        Ok(sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar
            FROM subscriptions s JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // --- DASHBOARD ---

    /// channel_stats
    ///
    /// All counters in a single round trip. Views and likes sum over every video of the
    /// channel and are zero for an empty channel.
    async fn channel_stats(&self, owner_id: Uuid) -> RepoResult<Option<ChannelStats>> {
        let Some(channel) = self.find_user(owner_id).await? else {
            return Ok(None);
        };

        let (subscribers, videos_count, views, likes): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1),
                (SELECT COUNT(*) FROM videos WHERE owner_id = $1),
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner_id = $1),
                (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id WHERE v.owner_id = $1)
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(ChannelStats {
            channel,
            subscribers,
            videos_count,
            views,
            likes,
        }))
    }

    async fn channel_videos(&self, owner_id: Uuid) -> RepoResult<Vec<Video>> {
        Ok(sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
