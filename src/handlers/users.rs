use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::HeaderMap,
    response::IntoResponse,
};

use super::{MultipartForm, discard_media, store_file};
use crate::{
    AppState,
    auth::{self, AuthUser, REFRESH_COOKIE},
    error::{ApiError, ApiResult, required_text},
    models::{
        ChangePasswordRequest, ChannelProfile, LoginRequest, LoginResponse, NewUser,
        RefreshTokenRequest, TokenPair, UpdateAccountRequest, User, VideoWithOwner,
    },
    response::ApiResponse,
    storage::MediaFolder,
};

/// register_user
///
/// [Public Route] Creates an account from a multipart form. The avatar is mandatory, the
/// cover image optional. Both are pushed to the media host before the row is written; if
/// the insert fails they are removed again.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "users",
    request_body(content_type = "multipart/form-data", description = "full_name, email, username, password, avatar, cover_image?"),
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Missing field or avatar"),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<User>> {
    let mut form = MultipartForm::read(multipart?).await?;

    let full_name = required_text(form.text("full_name"), "All fields are required")?;
    let email = required_text(form.text("email"), "All fields are required")?;
    let username = required_text(form.text("username"), "All fields are required")?.to_lowercase();
    let password = required_text(form.text("password"), "All fields are required")?;

    if state
        .repo
        .find_user_by_login(Some(username.clone()), Some(email.clone()))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::bad_request("Avatar file is required"))?;

    let avatar = store_file(&state.storage, MediaFolder::Avatars, avatar_file).await?;
    let cover_image = match form.take_file("cover_image") {
        Some(file) => Some(store_file(&state.storage, MediaFolder::Covers, file).await?),
        None => None,
    };

    let password_hash = auth::hash_password(password).await?;

    let created = state
        .repo
        .create_user(NewUser {
            username,
            email,
            full_name,
            avatar: avatar.url.clone(),
            cover_image: cover_image.as_ref().map(|c| c.url.clone()),
            password_hash,
        })
        .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            discard_media(&state.storage, &avatar.url).await;
            if let Some(cover) = &cover_image {
                discard_media(&state.storage, &cover.url).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// login_user
///
/// [Public Route] Authenticates by email or username. Issues a token pair, stores the
/// refresh token on the user row and sets both as HttpOnly cookies.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or email missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User does not exist")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let username = payload
        .username
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());
    let email = payload
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    if username.is_none() && email.is_none() {
        return Err(ApiError::bad_request("Username or email is required"));
    }
    let password = required_text(payload.password, "Password is required")?;

    let user = state
        .repo
        .find_user_by_login(username, email)
        .await?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    if !auth::verify_password(password, user.password_hash.clone()).await? {
        return Err(ApiError::unauthorized("Invalid user credentials"));
    }

    let tokens = auth::issue_tokens(&state.config, &user)?;
    state
        .repo
        .set_refresh_token(user.id, Some(tokens.refresh_token.clone()))
        .await?;

    tracing::info!(user_id = %user.id, "user logged in");
    let cookies = auth::token_cookies(&state.config, &tokens);
    let body = ApiResponse::ok(
        LoginResponse {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
        "User logged in successfully",
    );
    Ok((cookies, body))
}

/// logout_user
///
/// [Authenticated Route] Forgets the stored refresh token and expires both cookies.
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "users",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    state.repo.set_refresh_token(id, None).await?;
    tracing::info!(user_id = %id, "user logged out");
    Ok((
        auth::cleared_cookies(&state.config),
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully"),
    ))
}

/// refresh_access_token
///
/// [Public Route] Rotates the token pair. The refresh token comes from the cookie or the
/// JSON body and must match the one stored on the user row, so a used token cannot be
/// replayed.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    tag = "users",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPair),
        (status = 401, description = "Missing, invalid or used refresh token")
    )
)]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    // The body is optional here: cookie-based clients send none.
    let incoming = auth::cookie_value(&headers, REFRESH_COOKIE)
        .or_else(|| {
            serde_json::from_slice::<RefreshTokenRequest>(&body)
                .ok()
                .and_then(|payload| payload.refresh_token)
        })
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    let claims = auth::decode_refresh(&state.config, &incoming)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user = state
        .repo
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(ApiError::unauthorized("Refresh token is expired or used"));
    }

    let tokens = auth::issue_tokens(&state.config, &user)?;
    state
        .repo
        .set_refresh_token(user.id, Some(tokens.refresh_token.clone()))
        .await?;

    let cookies = auth::token_cookies(&state.config, &tokens);
    Ok((cookies, ApiResponse::ok(tokens, "Access token refreshed")))
}

/// change_password
///
/// [Authenticated Route] Verifies the old password before storing the new hash.
#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing field or wrong old password")
    )
)]
pub async fn change_password(
    AuthUser { user, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let Json(payload) = payload?;
    let old_password = required_text(payload.old_password, "Old and new password are required")?;
    let new_password = required_text(payload.new_password, "Old and new password are required")?;

    if !auth::verify_password(old_password, user.password_hash.clone()).await? {
        return Err(ApiError::bad_request("Invalid old password"));
    }

    let hash = auth::hash_password(new_password).await?;
    state.repo.update_password(user.id, hash).await?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

/// get_current_user
///
/// [Authenticated Route] Returns the caller as resolved by the auth layer.
#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    tag = "users",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn get_current_user(AuthUser { user, .. }: AuthUser) -> ApiResponse<User> {
    ApiResponse::ok(user, "Current user fetched successfully")
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    tag = "users",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = User),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Email taken")
    )
)]
pub async fn update_account(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<User>> {
    let Json(payload) = payload?;
    let full_name = required_text(payload.full_name, "All fields are required")?;
    let email = required_text(payload.email, "All fields are required")?;

    let user = state
        .repo
        .update_account(id, full_name, email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

/// update_avatar
///
/// [Authenticated Route] Replaces the avatar. The previous file is removed from the media
/// host once the row points at the new one.
#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    tag = "users",
    request_body(content_type = "multipart/form-data", description = "avatar"),
    responses(
        (status = 200, description = "Avatar updated", body = User),
        (status = 400, description = "Avatar file missing")
    )
)]
pub async fn update_avatar(
    AuthUser { user: current, .. }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<User>> {
    let mut form = MultipartForm::read(multipart?).await?;
    let file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::bad_request("Avatar file is missing"))?;

    let stored = store_file(&state.storage, MediaFolder::Avatars, file).await?;
    let updated = state
        .repo
        .update_avatar(current.id, stored.url.clone())
        .await
        .map_err(ApiError::from)
        .and_then(|user| user.ok_or_else(|| ApiError::not_found("User not found")));
    let user = match updated {
        Ok(user) => user,
        Err(e) => {
            discard_media(&state.storage, &stored.url).await;
            return Err(e);
        }
    };

    if !current.avatar.is_empty() {
        discard_media(&state.storage, &current.avatar).await;
    }

    Ok(ApiResponse::ok(user, "Avatar image updated successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    tag = "users",
    request_body(content_type = "multipart/form-data", description = "cover_image"),
    responses(
        (status = 200, description = "Cover image updated", body = User),
        (status = 400, description = "Cover image file missing")
    )
)]
pub async fn update_cover_image(
    AuthUser { user: current, .. }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<User>> {
    let mut form = MultipartForm::read(multipart?).await?;
    let file = form
        .take_file("cover_image")
        .ok_or_else(|| ApiError::bad_request("Cover image file is missing"))?;

    let stored = store_file(&state.storage, MediaFolder::Covers, file).await?;
    let updated = state
        .repo
        .update_cover_image(current.id, stored.url.clone())
        .await
        .map_err(ApiError::from)
        .and_then(|user| user.ok_or_else(|| ApiError::not_found("User not found")));
    let user = match updated {
        Ok(user) => user,
        Err(e) => {
            discard_media(&state.storage, &stored.url).await;
            return Err(e);
        }
    };

    if let Some(old) = current.cover_image.as_deref() {
        discard_media(&state.storage, old).await;
    }

    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

/// get_channel_profile
///
/// [Authenticated Route] Public channel page with subscription counters, resolved for the
/// caller (`is_subscribed`).
#[utoipa::path(
    get,
    path = "/api/v1/users/c/{username}",
    tag = "users",
    params(("username" = String, Path, description = "Channel username")),
    responses(
        (status = 200, description = "Channel profile", body = ChannelProfile),
        (status = 400, description = "Blank username"),
        (status = 404, description = "Channel does not exist")
    )
)]
pub async fn get_channel_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<ApiResponse<ChannelProfile>> {
    let username = required_text(Some(username), "Username is missing")?.to_lowercase();

    let profile = state
        .repo
        .channel_profile(username, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel does not exist"))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/history",
    tag = "users",
    responses((status = 200, description = "Watch history, most recent first", body = [VideoWithOwner]))
)]
pub async fn get_watch_history(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let history = state.repo.watch_history(id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
