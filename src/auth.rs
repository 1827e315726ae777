use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    response::AppendHeaders,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::{TokenPair, User},
    repository::RepositoryState,
};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token could not be signed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Claims
///
/// Payload of an access token. Carries enough identity for clients to render the session
/// without another round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub iat: usize,
    pub exp: usize,
}

/// RefreshClaims
///
/// Payload of a refresh token. Signed with its own secret and only accepted by the
/// refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

fn now_and_expiry(lifetime_secs: i64) -> (usize, usize) {
    let now = Utc::now().timestamp();
    (now as usize, (now + lifetime_secs) as usize)
}

pub fn create_access_token(config: &AppConfig, user: &User) -> Result<String, AuthError> {
    let (iat, exp) = now_and_expiry(config.access_token_expiry);
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        iat,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

pub fn create_refresh_token(config: &AppConfig, user_id: Uuid) -> Result<String, AuthError> {
    let (iat, exp) = now_and_expiry(config.refresh_token_expiry);
    encode(
        &Header::default(),
        &RefreshClaims { sub: user_id, iat, exp },
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

/// issue_tokens
///
/// Mints a fresh access/refresh pair for `user`. The caller persists the refresh token.
pub fn issue_tokens(config: &AppConfig, user: &User) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access_token: create_access_token(config, user)?,
        refresh_token: create_refresh_token(config, user.id)?,
    })
}

fn validation() -> Validation {
    let mut validation = Validation::default();
    // Expiry is always enforced, with no clock leeway.
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}

pub fn decode_access(config: &AppConfig, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.access_token_secret.as_bytes());
    Ok(decode::<Claims>(token, &key, &validation())?.claims)
}

pub fn decode_refresh(config: &AppConfig, token: &str) -> Result<RefreshClaims, AuthError> {
    let key = DecodingKey::from_secret(config.refresh_token_secret.as_bytes());
    Ok(decode::<RefreshClaims>(token, &key, &validation())?.claims)
}

// --- Passwords ---

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

// --- Cookies ---

/// cookie_value
///
/// Looks up one cookie in the `Cookie` request header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .find(|value| !value.is_empty())
}

/// Builds a `Set-Cookie` value for a session token. `HttpOnly` always, `Secure` in production.
pub fn session_cookie(config: &AppConfig, name: &str, value: &str, max_age_secs: i64) -> HeaderValue {
    let secure = if config.is_production() { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}{}",
        name, value, max_age_secs, secure
    );
    // Token characters are base64url and dots, always valid header bytes.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub type SessionCookies = AppendHeaders<[(HeaderName, HeaderValue); 2]>;

/// Set-Cookie headers carrying a freshly issued token pair.
pub fn token_cookies(config: &AppConfig, tokens: &TokenPair) -> SessionCookies {
    AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(config, ACCESS_COOKIE, &tokens.access_token, config.access_token_expiry),
        ),
        (
            header::SET_COOKIE,
            session_cookie(config, REFRESH_COOKIE, &tokens.refresh_token, config.refresh_token_expiry),
        ),
    ])
}

/// Set-Cookie headers expiring both session cookies.
pub fn cleared_cookies(config: &AppConfig) -> SessionCookies {
    AppendHeaders([
        (header::SET_COOKIE, session_cookie(config, ACCESS_COOKIE, "", 0)),
        (header::SET_COOKIE, session_cookie(config, REFRESH_COOKIE, "", 0)),
    ])
}

/// Access token from the `accessToken` cookie, else from `Authorization: Bearer`.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers destructure it
/// (`AuthUser { id, .. }`) to get the caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub user: User,
}

impl AuthUser {
    pub fn new(user: User) -> Self {
        Self { id: user.id, user }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse: an identity already resolved by the auth middleware is taken from the request
///    extensions.
/// 2. Local Bypass: in `Env::Local`, an `x-user-id` header naming an existing user.
/// 3. Token Validation: cookie or Bearer token, decoded against the access secret.
/// 4. DB Lookup: the user must still exist.
///
/// Rejection: 401 in the uniform error envelope.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<AuthUser>() {
            return Ok(resolved.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.find_user(user_id).await? {
                    tracing::debug!(%user_id, "local x-user-id bypass");
                    return Ok(AuthUser::new(user));
                }
            }
        }

        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

        let claims = decode_access(&config, &token).map_err(|e| {
            tracing::debug!("access token rejected: {}", e);
            ApiError::unauthorized("Invalid access token")
        })?;

        // A valid token for a deleted account is still refused.
        let user = repo
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

        Ok(AuthUser::new(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; accessToken=abc.def; other=1")]);
        assert_eq!(cookie_value(&map, ACCESS_COOKIE).as_deref(), Some("abc.def"));
        assert_eq!(cookie_value(&map, REFRESH_COOKIE), None);
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let map = headers(&[
            (header::COOKIE, "accessToken=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_access_token(&map).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_used_without_cookie() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer tok")]);
        assert_eq!(extract_access_token(&map).as_deref(), Some("tok"));

        let map = headers(&[(header::AUTHORIZATION, "Basic tok")]);
        assert_eq!(extract_access_token(&map), None);
    }

    #[test]
    fn access_token_round_trips_and_rejects_wrong_secret() {
        let config = AppConfig::default();
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            ..User::default()
        };
        let token = create_access_token(&config, &user).unwrap();
        let claims = decode_access(&config, &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");

        // Refresh secret must not validate an access token.
        assert!(decode_refresh(&config, &token).is_err());
    }

    #[test]
    fn session_cookie_is_secure_only_in_production() {
        let mut config = AppConfig::default();
        let local = session_cookie(&config, ACCESS_COOKIE, "v", 60);
        assert!(!local.to_str().unwrap().contains("Secure"));

        config.env = Env::Production;
        let prod = session_cookie(&config, ACCESS_COOKIE, "v", 60);
        let prod = prod.to_str().unwrap();
        assert!(prod.contains("HttpOnly"));
        assert!(prod.contains("Secure"));
        assert!(prod.starts_with("accessToken=v;"));
    }
}
