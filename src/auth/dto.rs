use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Request body for user registration. Fields are optional so that missing
/// ones surface as structured errors instead of a generic decode failure.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn require<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    field
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingField(name))
}

impl RegisterRequest {
    pub fn validated(&self) -> Result<(&str, &str), ApiError> {
        Ok((
            require(&self.email, "email")?,
            require(&self.password, "password")?,
        ))
    }
}

impl LoginRequest {
    pub fn validated(&self) -> Result<(&str, &str), ApiError> {
        Ok((
            require(&self.email, "email")?,
            require(&self.password, "password")?,
        ))
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Generic message body for registration/confirmation outcomes.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_rejects_missing_email() {
        let req = RegisterRequest {
            email: None,
            password: Some("Abcdef1!".into()),
        };
        let err = req.validated().unwrap_err();
        assert!(matches!(err, ApiError::MissingField("email")));
    }

    #[test]
    fn validated_rejects_empty_password() {
        let req = LoginRequest {
            email: Some("a@b.com".into()),
            password: Some(String::new()),
        };
        let err = req.validated().unwrap_err();
        assert!(matches!(err, ApiError::MissingField("password")));
    }

    #[test]
    fn validated_passes_both_fields_through() {
        let req = RegisterRequest {
            email: Some("a@b.com".into()),
            password: Some("Abcdef1!".into()),
        };
        assert_eq!(req.validated().unwrap(), ("a@b.com", "Abcdef1!"));
    }

    #[test]
    fn login_response_serialization() {
        let response = LoginResponse {
            access_token: "tok".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"access_token":"tok"}"#);
    }

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: 3,
            email: "test@example.com".to_string(),
            confirmed: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"confirmed\":false"));
    }
}
