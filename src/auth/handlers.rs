use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
        jwt::JwtKeys,
        password, repo,
    },
    error::ApiError,
    mailer::build_confirm_url,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm/:token", get(confirm).post(confirm))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (email, password) = payload.validated()?;

    if !password::is_valid_email(email) {
        warn!(email = %email, "invalid email format");
        return Err(ApiError::InvalidEmailFormat);
    }

    if !password::is_strong_password(password) {
        warn!("weak password rejected");
        return Err(ApiError::WeakPassword);
    }

    // Pre-check for a friendly error; the unique constraint still backstops
    // concurrent registrations for the same address.
    if repo::find_by_email(&state.db, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = password::hash_password(password)?;

    let user = match repo::create(&state.db, email, &hash).await {
        Ok(u) => u,
        Err(e) if repo::is_unique_violation(&e) => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::DuplicateEmail);
        }
        Err(e) => return Err(ApiError::Persistence(e)),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_confirm(&user.email)?;
    let confirm_url = build_confirm_url(&state.config.public_base_url, &token);

    // The user record stays either way; a failed send only degrades the
    // response so the caller knows confirmation must be retried.
    if let Err(e) = state
        .mailer
        .send_confirmation(&user.email, &confirm_url)
        .await
    {
        warn!(error = %e, user_id = %user.id, "confirmation email failed after user creation");
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse {
                message: "account created, but the confirmation email could not be sent"
                    .to_string(),
            }),
        ));
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "account created; check your inbox to confirm your email address"
                .to_string(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = payload.validated()?;

    // Unknown email and wrong password must be indistinguishable.
    let user = match repo::find_by_email(&state.db, email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !password::verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse { access_token }))
}

#[instrument(skip(state, token))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let email = keys
        .verify_confirm(&token)
        .map_err(|_| ApiError::InvalidOrExpiredToken)?;

    // A token for an address with no account is reported like any other
    // invalid token.
    let user = repo::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::InvalidOrExpiredToken)?;

    repo::mark_confirmed(&state.db, user.id).await?;

    info!(user_id = %user.id, "email confirmed");
    Ok(Json(MessageResponse {
        message: "email confirmed".to_string(),
    }))
}
