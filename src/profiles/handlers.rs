use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{auth::jwt::AuthUser, state::AppState};

use super::dto::{CreateProfileRequest, ProfileResponse, UpdateProfileRequest};
use super::repo::{self, Profile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(list_profiles).post(create_profile))
        .route(
            "/profile/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

fn to_response(p: Profile) -> ProfileResponse {
    ProfileResponse {
        id: p.id,
        display_name: p.display_name,
        bio: p.bio,
        created_at: p.created_at,
    }
}

#[instrument(skip(state))]
pub async fn list_profiles(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ProfileResponse>>, (StatusCode, String)> {
    let profiles = repo::list_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(profiles.into_iter().map(to_response).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ProfileResponse>), (StatusCode, String)> {
    if payload.display_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "display_name is required".into()));
    }

    let profile = repo::create(
        &state.db,
        user_id,
        payload.display_name.trim(),
        payload.bio.as_deref(),
    )
    .await
    .map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/profile/{}", profile.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(to_response(profile))))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let profile = repo::get(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;
    Ok(Json(to_response(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    if payload.display_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "display_name is required".into()));
    }

    let profile = repo::update(
        &state.db,
        user_id,
        id,
        payload.display_name.trim(),
        payload.bio.as_deref(),
    )
    .await
    .map_err(internal)?
    .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;

    Ok(Json(to_response(profile)))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Profile not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}
