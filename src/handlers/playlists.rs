use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use uuid::Uuid;

use super::{ensure_owner, visible_video};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, parse_id, required_text},
    models::{CreatePlaylistRequest, Playlist, PlaylistWithVideos, UpdatePlaylistRequest},
    response::ApiResponse,
};

async fn owned_playlist(state: &AppState, playlist_id: Uuid, caller: Uuid) -> ApiResult<Playlist> {
    let playlist = state
        .repo
        .find_playlist(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;
    ensure_owner(playlist.owner_id, caller, "You can only modify your own playlists")?;
    Ok(playlist)
}

/// Resolves both ids of an add/remove call: the video must be visible to the caller and
/// the playlist must be the caller's.
async fn playlist_and_video(
    state: &AppState,
    video_id: &str,
    playlist_id: &str,
    caller: Uuid,
) -> ApiResult<(Uuid, Uuid)> {
    let video_id = parse_id(video_id, "video")?;
    let playlist_id = parse_id(playlist_id, "playlist")?;

    visible_video(state, video_id, caller).await?;
    owned_playlist(state, playlist_id, caller).await?;
    Ok((playlist_id, video_id))
}

async fn load_with_videos(state: &AppState, playlist_id: Uuid) -> ApiResult<PlaylistWithVideos> {
    state
        .repo
        .playlist_with_videos(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))
}

#[utoipa::path(
    post,
    path = "/api/v1/playlist",
    tag = "playlists",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = Playlist),
        (status = 400, description = "Name or description missing")
    )
)]
pub async fn create_playlist(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreatePlaylistRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Playlist>> {
    let Json(payload) = payload?;
    let name = required_text(payload.name, "Name and description are required")?;
    let description = required_text(payload.description, "Name and description are required")?;

    let playlist = state.repo.create_playlist(id, name, description).await?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

/// get_playlist_by_id
///
/// [Authenticated Route] A playlist with its videos in insertion order, each carrying its
/// owner summary.
#[utoipa::path(
    get,
    path = "/api/v1/playlist/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist found", body = PlaylistWithVideos),
        (status = 404, description = "Playlist not found")
    )
)]
pub async fn get_playlist_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<ApiResponse<PlaylistWithVideos>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let playlist = load_with_videos(&state, playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlist/user/{user_id}",
    tag = "playlists",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User playlists", body = [PlaylistWithVideos]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_playlists(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<PlaylistWithVideos>>> {
    let user_id = parse_id(&user_id, "user")?;
    if state.repo.find_user(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let playlists = state.repo.user_playlists(user_id).await?;
    Ok(ApiResponse::ok(playlists, "User playlists fetched successfully"))
}

/// update_playlist
///
/// [Authenticated Route] Owner-only partial update. Blank fields count as absent; at least
/// one field must remain.
#[utoipa::path(
    patch,
    path = "/api/v1/playlist/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = Playlist),
        (status = 400, description = "Nothing to update"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Playlist not found")
    )
)]
pub async fn update_playlist(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    payload: Result<Json<UpdatePlaylistRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let Json(payload) = payload?;

    let name = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if name.is_none() && description.is_none() {
        return Err(ApiError::bad_request("Provide a name or description to update"));
    }

    owned_playlist(&state, playlist_id, caller).await?;

    let playlist = state
        .repo
        .update_playlist(playlist_id, name, description)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/playlist/{playlist_id}",
    tag = "playlists",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist deleted", body = Playlist),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Playlist not found")
    )
)]
pub async fn delete_playlist(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, playlist_id, caller).await?;

    let playlist = state
        .repo
        .delete_playlist(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;
    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/add/{video_id}/{playlist_id}",
    tag = "playlists",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("playlist_id" = String, Path, description = "Playlist ID")
    ),
    responses(
        (status = 200, description = "Video added", body = PlaylistWithVideos),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video or playlist not found"),
        (status = 409, description = "Video already in playlist")
    )
)]
pub async fn add_video_to_playlist(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<PlaylistWithVideos>> {
    let (playlist_id, video_id) = playlist_and_video(&state, &video_id, &playlist_id, caller).await?;

    if !state.repo.add_video_to_playlist(playlist_id, video_id).await? {
        return Err(ApiError::Conflict("Video already exists in playlist".to_string()));
    }

    let playlist = load_with_videos(&state, playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Video added to playlist successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/remove/{video_id}/{playlist_id}",
    tag = "playlists",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("playlist_id" = String, Path, description = "Playlist ID")
    ),
    responses(
        (status = 200, description = "Video removed", body = PlaylistWithVideos),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video, playlist or entry not found")
    )
)]
pub async fn remove_video_from_playlist(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<PlaylistWithVideos>> {
    let (playlist_id, video_id) = playlist_and_video(&state, &video_id, &playlist_id, caller).await?;

    if !state.repo.remove_video_from_playlist(playlist_id, video_id).await? {
        return Err(ApiError::not_found("Video is not in this playlist"));
    }

    let playlist = load_with_videos(&state, playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Video removed from playlist successfully"))
}
