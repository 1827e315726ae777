use async_trait::async_trait;
use aws_sdk_s3 as s3;
use axum::body::Bytes;
use s3::primitives::ByteStream;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },
    #[error("delete of {key} failed: {reason}")]
    Delete { key: String, reason: String },
    #[error("url {0} does not belong to the media host")]
    ForeignUrl(String),
}

/// MediaFolder
///
/// Top-level prefix an uploaded object is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Videos,
    Thumbnails,
    Avatars,
    Covers,
}

impl MediaFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFolder::Videos => "videos",
            MediaFolder::Thumbnails => "thumbnails",
            MediaFolder::Avatars => "avatars",
            MediaFolder::Covers => "covers",
        }
    }
}

/// An uploaded object: where it lives and how clients reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub key: String,
    pub url: String,
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the hosted media service. Handlers only see this trait, so the
/// real S3-compatible client can be swapped for `MockStorageService` in tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if it is missing. Local setups only.
    async fn ensure_bucket_exists(&self);

    /// Stores `data` under `key` and returns its public URL.
    async fn upload(&self, key: &str, content_type: &str, data: Bytes) -> Result<StoredMedia, StorageError>;

    /// Removes the object a previously returned URL points at.
    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError>;
}

/// media_key
///
/// Builds a collision-free object key `"{folder}/{uuid}.{ext}"`. The extension comes from
/// the client filename and falls back to `bin`.
pub fn media_key(folder: MediaFolder, filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("{}/{}.{}", folder.as_str(), Uuid::new_v4(), extension)
}

/// key_from_url
///
/// Recovers the object key from a URL minted under `public_base`.
pub fn key_from_url(public_base: &str, url: &str) -> Option<String> {
    let base = public_base.trim_end_matches('/');
    let key = sanitize_key(url.strip_prefix(base)?.split(['?', '#']).next()?);
    if key.is_empty() { None } else { Some(key) }
}

/// sanitize_key
///
/// Drops directory navigation segments (`..`, `.`) and empty segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 2. The Real Implementation (S3-compatible media host)
/// S3StorageClient
///
/// Media host client on the AWS SDK. Works against any S3-compatible endpoint (MinIO
/// locally, a managed bucket in production); `force_path_style(true)` is required for them.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_url: String,
}

impl S3StorageClient {
    /// Constructs the S3 client from the media settings of `AppConfig`.
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket already exists.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket skipped: {}", e);
        }
    }

    async fn upload(&self, key: &str, content_type: &str, data: Bytes) -> Result<StoredMedia, StorageError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(key = %key, size, "media uploaded");
        Ok(StoredMedia {
            key: key.to_string(),
            url: format!("{}/{}", self.public_url, key),
        })
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_url, url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(key = %key, "media deleted");
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-process stand-in for the media host. Returns deterministic URLs and records deleted
/// URLs so tests can assert on clean-up.
#[derive(Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    deleted: std::sync::Mutex<Vec<String>>,
}

impl MockStorageService {
    pub const BASE_URL: &'static str = "http://localhost:9000/mock-bucket";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// URLs passed to `delete_by_url` so far.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(&self, key: &str, _content_type: &str, _data: Bytes) -> Result<StoredMedia, StorageError> {
        if self.should_fail {
            return Err(StorageError::Upload {
                key: key.to_string(),
                reason: "simulated failure".to_string(),
            });
        }

        let key = sanitize_key(key);
        Ok(StoredMedia {
            url: format!("{}/{}", Self::BASE_URL, key),
            key,
        })
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Delete {
                key: url.to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(url.to_string());
        }
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share media host access across the application state.
pub type StorageState = Arc<dyn StorageService>;
