use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors surfaced by the auth workflow, mapped to a JSON body and status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid email format")]
    InvalidEmailFormat,
    #[error("password must have at least 8 characters, 1 uppercase, 1 lowercase, 1 digit and 1 special character")]
    WeakPassword,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired confirmation token")]
    InvalidOrExpiredToken,
    #[error("database error")]
    Persistence(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::InvalidEmailFormat
            | ApiError::WeakPassword
            | ApiError::DuplicateEmail
            | ApiError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal detail stays in the logs; clients get a generic message.
        let message = match &self {
            ApiError::Persistence(e) => {
                error!(error = %e, "persistence failure");
                "internal server error".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        assert_eq!(ApiError::MissingField("email").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidEmailFormat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::WeakPassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidOrExpiredToken.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn credential_errors_map_to_401() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_errors_map_to_500() {
        let err = ApiError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = ApiError::Persistence(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_field_names_the_field() {
        assert_eq!(ApiError::MissingField("email").to_string(), "email is required");
        assert_eq!(
            ApiError::MissingField("password").to_string(),
            "password is required"
        );
    }
}
