#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use tower::ServiceExt;
use uuid::Uuid;
use vidtube_api::{
    AppConfig, AppState,
    auth::create_access_token,
    models::{
        ChannelProfile, ChannelStats, Comment, CommentWithOwner, Like, LikeTarget, LikeToggle,
        LikedVideo, NewUser, NewVideo, Page, Playlist, PlaylistWithVideos, Subscription,
        SubscriptionToggle, Tweet, TweetWithOwner, User, UserSummary, Video, VideoDetails,
        VideoListFilter, VideoSort, VideoSummary, VideoUpdate, VideoWithOwner,
    },
    repository::{RepoResult, Repository, RepositoryError},
    storage::MockStorageService,
};

pub const TEST_PASSWORD: &str = "password123";

// --- IN-MEMORY REPOSITORY ---

/// Rows of every table, held in insertion order.
#[derive(Default)]
pub struct Store {
    pub users: Vec<User>,
    pub videos: Vec<Video>,
    pub comments: Vec<Comment>,
    pub tweets: Vec<Tweet>,
    pub likes: Vec<Like>,
    pub playlists: Vec<Playlist>,
    // (playlist_id, video_id), in insertion order.
    pub playlist_videos: Vec<(Uuid, Uuid)>,
    pub subscriptions: Vec<Subscription>,
    // (user_id, video_id), most recent last.
    pub history: Vec<(Uuid, Uuid)>,
}

/// MockRepository
///
/// A `Repository` over plain vectors. Enough of the Postgres semantics (uniqueness,
/// cascades, ordering) is reproduced to drive the handlers end to end through the router.
#[derive(Default)]
pub struct MockRepository {
    pub store: Mutex<Store>,
    // When set, media-bearing row updates fail like a lost connection.
    pub fail_updates: AtomicBool,
}

fn summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        avatar: user.avatar.clone(),
    }
}

impl Store {
    fn owner(&self, id: Uuid) -> UserSummary {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(summary)
            .unwrap_or_default()
    }

    fn with_owner(&self, video: &Video) -> VideoWithOwner {
        VideoWithOwner {
            video: video.clone(),
            owner: self.owner(video.owner_id),
        }
    }

    fn likes_on(&self, target: LikeTarget) -> i64 {
        self.likes.iter().filter(|l| like_matches(l, target)).count() as i64
    }

    fn playlist_with_videos(&self, playlist: &Playlist) -> PlaylistWithVideos {
        let videos = self
            .playlist_videos
            .iter()
            .filter(|(pid, _)| *pid == playlist.id)
            .filter_map(|(_, vid)| self.videos.iter().find(|v| v.id == *vid))
            .map(|v| self.with_owner(v))
            .collect();
        PlaylistWithVideos {
            playlist: playlist.clone(),
            videos,
        }
    }
}

fn like_matches(like: &Like, target: LikeTarget) -> bool {
    match target {
        LikeTarget::Video(id) => like.video_id == Some(id),
        LikeTarget::Comment(id) => like.comment_id == Some(id),
        LikeTarget::Tweet(id) => like.tweet_id == Some(id),
    }
}

impl MockRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inserts a user whose password is `TEST_PASSWORD`.
    pub fn seed_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: format!("{} Tester", username),
            avatar: format!("{}/avatars/{}.png", MockStorageService::BASE_URL, username),
            cover_image: None,
            password_hash: bcrypt::hash(TEST_PASSWORD, 4).unwrap(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_video(&self, owner_id: Uuid, title: &str, published: bool) -> Video {
        let mut store = self.store.lock().unwrap();
        // Spread creation times so ordering is deterministic.
        let now = Utc::now() + Duration::seconds(store.videos.len() as i64);
        let video = Video {
            id: Uuid::new_v4(),
            owner_id,
            video_file: format!("{}/videos/{}.mp4", MockStorageService::BASE_URL, Uuid::new_v4()),
            thumbnail: format!("{}/thumbnails/{}.png", MockStorageService::BASE_URL, Uuid::new_v4()),
            title: title.to_string(),
            description: format!("about {}", title),
            duration: 60.0,
            views: 0,
            is_published: published,
            created_at: now,
            updated_at: now,
        };
        store.videos.push(video.clone());
        video
    }

    pub fn set_refresh(&self, id: Uuid, token: &str) {
        let mut store = self.store.lock().unwrap();
        if let Some(user) = store.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = Some(token.to_string());
        }
    }

    pub fn fail_media_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    fn check_updates(&self) -> RepoResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.store.lock().unwrap().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.store.lock().unwrap().videos.iter().find(|v| v.id == id).cloned()
    }
}

#[async_trait]
impl Repository for MockRepository {
    // --- Users ---

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let mut store = self.store.lock().unwrap();
        if store
            .users
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(RepositoryError::Duplicate("user with this email or username".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            avatar: new.avatar,
            cover_image: new.cover_image,
            password_hash: new.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn find_user_by_login(
        &self,
        username: Option<String>,
        email: Option<String>,
    ) -> RepoResult<Option<User>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .users
            .iter()
            .find(|u| {
                username.as_deref() == Some(u.username.as_str())
                    || email.as_deref() == Some(u.email.as_str())
            })
            .cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<String>) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        if let Some(user) = store.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = token;
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        if let Some(user) = store.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash;
        }
        Ok(())
    }

    async fn update_account(&self, id: Uuid, full_name: String, email: String) -> RepoResult<Option<User>> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.id != id && u.email == email) {
            return Err(RepositoryError::Duplicate("user with this email".into()));
        }
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.full_name = full_name;
            user.email = email;
            user.clone()
        }))
    }

    async fn update_avatar(&self, id: Uuid, url: String) -> RepoResult<Option<User>> {
        self.check_updates()?;
        let mut store = self.store.lock().unwrap();
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.avatar = url;
            user.clone()
        }))
    }

    async fn update_cover_image(&self, id: Uuid, url: String) -> RepoResult<Option<User>> {
        self.check_updates()?;
        let mut store = self.store.lock().unwrap();
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.cover_image = Some(url);
            user.clone()
        }))
    }

    async fn channel_profile(&self, username: String, viewer: Uuid) -> RepoResult<Option<ChannelProfile>> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.username == username).map(|u| ChannelProfile {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            avatar: u.avatar.clone(),
            cover_image: u.cover_image.clone(),
            subscribers_count: store.subscriptions.iter().filter(|s| s.channel_id == u.id).count() as i64,
            channels_subscribed_to_count: store
                .subscriptions
                .iter()
                .filter(|s| s.subscriber_id == u.id)
                .count() as i64,
            is_subscribed: store
                .subscriptions
                .iter()
                .any(|s| s.channel_id == u.id && s.subscriber_id == viewer),
        }))
    }

    async fn watch_history(&self, user_id: Uuid) -> RepoResult<Vec<VideoWithOwner>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .history
            .iter()
            .rev()
            .filter(|(uid, _)| *uid == user_id)
            .filter_map(|(_, vid)| store.videos.iter().find(|v| v.id == *vid))
            .map(|v| store.with_owner(v))
            .collect())
    }

    // --- Videos ---

    async fn list_videos(&self, filter: VideoListFilter) -> RepoResult<Vec<VideoWithOwner>> {
        let store = self.store.lock().unwrap();
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut videos: Vec<&Video> = store
            .videos
            .iter()
            .filter(|v| v.is_published)
            .filter(|v| filter.owner_id.is_none_or(|owner| v.owner_id == owner))
            .filter(|v| {
                needle.as_deref().is_none_or(|n| {
                    v.title.to_lowercase().contains(n) || v.description.to_lowercase().contains(n)
                })
            })
            .collect();

        videos.sort_by(|a, b| {
            let ordering = match filter.sort {
                VideoSort::CreatedAt => a.created_at.cmp(&b.created_at),
                VideoSort::Views => a.views.cmp(&b.views),
                VideoSort::Duration => a.duration.total_cmp(&b.duration),
                VideoSort::Title => a.title.cmp(&b.title),
            };
            if filter.descending { ordering.reverse() } else { ordering }
        });

        Ok(videos
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.size as usize)
            .map(|v| store.with_owner(v))
            .collect())
    }

    async fn create_video(&self, new: NewVideo) -> RepoResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            video_file: new.video_file,
            thumbnail: new.thumbnail,
            title: new.title,
            description: new.description,
            duration: new.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().videos.push(video.clone());
        Ok(video)
    }

    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        Ok(self.video(id))
    }

    async fn video_details(&self, id: Uuid, viewer: Uuid) -> RepoResult<Option<VideoDetails>> {
        let store = self.store.lock().unwrap();
        Ok(store.videos.iter().find(|v| v.id == id).map(|v| VideoDetails {
            video: v.clone(),
            owner: store.owner(v.owner_id),
            likes_count: store.likes_on(LikeTarget::Video(v.id)),
            is_liked: store
                .likes
                .iter()
                .any(|l| l.liked_by == viewer && l.video_id == Some(v.id)),
        }))
    }

    async fn record_view(&self, video_id: Uuid, viewer: Uuid) -> RepoResult<()> {
        let mut store = self.store.lock().unwrap();
        if let Some(video) = store.videos.iter_mut().find(|v| v.id == video_id) {
            video.views += 1;
        }
        store.history.retain(|(uid, vid)| !(*uid == viewer && *vid == video_id));
        store.history.push((viewer, video_id));
        Ok(())
    }

    async fn update_video(&self, id: Uuid, update: VideoUpdate) -> RepoResult<Option<Video>> {
        self.check_updates()?;
        let mut store = self.store.lock().unwrap();
        Ok(store.videos.iter_mut().find(|v| v.id == id).map(|video| {
            if let Some(title) = update.title {
                video.title = title;
            }
            if let Some(description) = update.description {
                video.description = description;
            }
            if let Some(thumbnail) = update.thumbnail {
                video.thumbnail = thumbnail;
            }
            video.clone()
        }))
    }

    async fn delete_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.videos.iter().position(|v| v.id == id) else {
            return Ok(None);
        };
        let video = store.videos.remove(pos);
        let comment_ids: Vec<Uuid> = store
            .comments
            .iter()
            .filter(|c| c.video_id == id)
            .map(|c| c.id)
            .collect();
        store.comments.retain(|c| c.video_id != id);
        store.likes.retain(|l| {
            l.video_id != Some(id) && !l.comment_id.is_some_and(|c| comment_ids.contains(&c))
        });
        store.playlist_videos.retain(|(_, vid)| *vid != id);
        store.history.retain(|(_, vid)| *vid != id);
        Ok(Some(video))
    }

    async fn toggle_publish(&self, id: Uuid) -> RepoResult<Option<Video>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.videos.iter_mut().find(|v| v.id == id).map(|video| {
            video.is_published = !video.is_published;
            video.clone()
        }))
    }

    // --- Comments ---

    async fn list_comments(&self, video_id: Uuid, page: Page) -> RepoResult<Vec<CommentWithOwner>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .iter()
            .rev()
            .filter(|c| c.video_id == video_id)
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .map(|c| CommentWithOwner {
                comment: c.clone(),
                owner: store.owner(c.owner_id),
                likes_count: store.likes_on(LikeTarget::Comment(c.id)),
            })
            .collect())
    }

    async fn create_comment(&self, video_id: Uuid, owner_id: Uuid, content: String) -> RepoResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            video_id,
            owner_id,
            content,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let store = self.store.lock().unwrap();
        Ok(store.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, id: Uuid, content: String) -> RepoResult<Option<Comment>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.content = content;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.comments.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        store.likes.retain(|l| l.comment_id != Some(id));
        Ok(Some(store.comments.remove(pos)))
    }

    // --- Likes ---

    async fn toggle_like(&self, user_id: Uuid, target: LikeTarget) -> RepoResult<LikeToggle> {
        let mut store = self.store.lock().unwrap();
        if let Some(pos) = store
            .likes
            .iter()
            .position(|l| l.liked_by == user_id && like_matches(l, target))
        {
            return Ok(LikeToggle::Removed(store.likes.remove(pos)));
        }

        let mut like = Like {
            id: Uuid::new_v4(),
            liked_by: user_id,
            created_at: Utc::now(),
            ..Like::default()
        };
        match target {
            LikeTarget::Video(id) => like.video_id = Some(id),
            LikeTarget::Comment(id) => like.comment_id = Some(id),
            LikeTarget::Tweet(id) => like.tweet_id = Some(id),
        }
        store.likes.push(like.clone());
        Ok(LikeToggle::Added(like))
    }

    async fn liked_videos(&self, user_id: Uuid) -> RepoResult<Vec<LikedVideo>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .likes
            .iter()
            .rev()
            .filter(|l| l.liked_by == user_id)
            .filter_map(|l| {
                let video = store.videos.iter().find(|v| Some(v.id) == l.video_id)?;
                Some(LikedVideo {
                    id: l.id,
                    created_at: l.created_at,
                    video: VideoSummary {
                        id: video.id,
                        video_file: video.video_file.clone(),
                        thumbnail: video.thumbnail.clone(),
                        duration: video.duration,
                        title: video.title.clone(),
                        views: video.views,
                    },
                })
            })
            .collect())
    }

    // --- Tweets ---

    async fn create_tweet(&self, owner_id: Uuid, content: String) -> RepoResult<Tweet> {
        let now = Utc::now();
        let tweet = Tweet {
            id: Uuid::new_v4(),
            owner_id,
            content,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().tweets.push(tweet.clone());
        Ok(tweet)
    }

    async fn find_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>> {
        let store = self.store.lock().unwrap();
        Ok(store.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn user_tweets(&self, owner_id: Uuid) -> RepoResult<Vec<TweetWithOwner>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .tweets
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id)
            .map(|t| TweetWithOwner {
                tweet: t.clone(),
                owner: store.owner(t.owner_id),
                likes_count: store.likes_on(LikeTarget::Tweet(t.id)),
            })
            .collect())
    }

    async fn update_tweet(&self, id: Uuid, content: String) -> RepoResult<Option<Tweet>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.tweets.iter_mut().find(|t| t.id == id).map(|tweet| {
            tweet.content = content;
            tweet.clone()
        }))
    }

    async fn delete_tweet(&self, id: Uuid) -> RepoResult<Option<Tweet>> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.tweets.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        store.likes.retain(|l| l.tweet_id != Some(id));
        Ok(Some(store.tweets.remove(pos)))
    }

    // --- Playlists ---

    async fn create_playlist(&self, owner_id: Uuid, name: String, description: String) -> RepoResult<Playlist> {
        let now = Utc::now();
        let playlist = Playlist {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn find_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>> {
        let store = self.store.lock().unwrap();
        Ok(store.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn playlist_with_videos(&self, id: Uuid) -> RepoResult<Option<PlaylistWithVideos>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .playlists
            .iter()
            .find(|p| p.id == id)
            .map(|p| store.playlist_with_videos(p)))
    }

    async fn user_playlists(&self, owner_id: Uuid) -> RepoResult<Vec<PlaylistWithVideos>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .playlists
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| store.playlist_with_videos(p))
            .collect())
    }

    async fn update_playlist(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> RepoResult<Option<Playlist>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.playlists.iter_mut().find(|p| p.id == id).map(|playlist| {
            if let Some(name) = name {
                playlist.name = name;
            }
            if let Some(description) = description {
                playlist.description = description;
            }
            playlist.clone()
        }))
    }

    async fn delete_playlist(&self, id: Uuid) -> RepoResult<Option<Playlist>> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.playlists.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        store.playlist_videos.retain(|(pid, _)| *pid != id);
        Ok(Some(store.playlists.remove(pos)))
    }

    async fn add_video_to_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        if store.playlist_videos.contains(&(playlist_id, video_id)) {
            return Ok(false);
        }
        store.playlist_videos.push((playlist_id, video_id));
        Ok(true)
    }

    async fn remove_video_from_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.playlist_videos.len();
        store
            .playlist_videos
            .retain(|entry| *entry != (playlist_id, video_id));
        Ok(store.playlist_videos.len() < before)
    }

    // --- Subscriptions ---

    async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: Uuid) -> RepoResult<SubscriptionToggle> {
        let mut store = self.store.lock().unwrap();
        if let Some(pos) = store
            .subscriptions
            .iter()
            .position(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id)
        {
            return Ok(SubscriptionToggle::Unsubscribed(store.subscriptions.remove(pos)));
        }
        let subscription = Subscription {
            id: Uuid::new_v4(),
            subscriber_id,
            channel_id,
            created_at: Utc::now(),
        };
        store.subscriptions.push(subscription.clone());
        Ok(SubscriptionToggle::Subscribed(subscription))
    }

    async fn channel_subscribers(&self, channel_id: Uuid) -> RepoResult<Vec<UserSummary>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.channel_id == channel_id)
            .map(|s| store.owner(s.subscriber_id))
            .collect())
    }

    async fn subscribed_channels(&self, subscriber_id: Uuid) -> RepoResult<Vec<UserSummary>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.subscriber_id == subscriber_id)
            .map(|s| store.owner(s.channel_id))
            .collect())
    }

    // --- Dashboard ---

    async fn channel_stats(&self, owner_id: Uuid) -> RepoResult<Option<ChannelStats>> {
        let store = self.store.lock().unwrap();
        let Some(channel) = store.users.iter().find(|u| u.id == owner_id).cloned() else {
            return Ok(None);
        };
        let owned: Vec<&Video> = store.videos.iter().filter(|v| v.owner_id == owner_id).collect();
        Ok(Some(ChannelStats {
            channel,
            subscribers: store.subscriptions.iter().filter(|s| s.channel_id == owner_id).count() as i64,
            videos_count: owned.len() as i64,
            views: owned.iter().map(|v| v.views).sum(),
            likes: owned
                .iter()
                .map(|v| store.likes_on(LikeTarget::Video(v.id)))
                .sum(),
        }))
    }

    async fn channel_videos(&self, owner_id: Uuid) -> RepoResult<Vec<Video>> {
        let store = self.store.lock().unwrap();
        let mut videos: Vec<Video> = store
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}

// --- TEST UTILITIES ---

/// AppState over the in-memory repository and the mock media host.
pub fn test_state(repo: Arc<MockRepository>, storage: Arc<MockStorageService>) -> AppState {
    AppState {
        repo,
        storage,
        config: AppConfig::default(),
    }
}

pub fn test_app(repo: Arc<MockRepository>, storage: Arc<MockStorageService>) -> Router {
    vidtube_api::create_router(test_state(repo, storage))
}

/// `Authorization` header value carrying a valid access token for `user`.
pub fn bearer(user: &User) -> String {
    let token = create_access_token(&AppConfig::default(), user).unwrap();
    format!("Bearer {}", token)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestResponse {
    pub fn data(&self) -> &serde_json::Value {
        &self.body["data"]
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// Drives one request through the router and decodes the JSON envelope.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, auth: Option<&User>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, auth: Option<&User>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    builder.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "vidtube-test-boundary";

/// A `multipart/form-data` request with text fields and `(field, filename, bytes)` files.
pub fn multipart_request(
    method: &str,
    uri: &str,
    auth: Option<&User>,
    texts: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(user) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    builder.body(Body::from(body)).unwrap()
}
