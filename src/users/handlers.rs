use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{dto::PublicUser, jwt::AuthUser, repo},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/self_user", get(self_user))
        .route("/admin/user/:id", get(admin_get_user).delete(admin_delete_user))
}

/// The authenticated caller's own record.
#[instrument(skip(state))]
pub async fn self_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(user_id = %user_id, "token subject no longer exists");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
        confirmed: user.confirmed,
    }))
}

#[instrument(skip(state))]
pub async fn admin_get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
        confirmed: user.confirmed,
    }))
}

#[instrument(skip(state))]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }
    info!(user_id = %id, deleted_by = %caller, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}
