use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Confirm,
}

/// Session JWT payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Confirmation JWT payload. Carries no `exp`: age is computed from `iat`
/// against the configured max-age at verification time.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmClaims {
    pub sub: String,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub confirm_max_age: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            confirm_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            confirm_max_age: Duration::from_secs((confirm_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign_access(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.access_ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        // No leeway: a token is rejected the moment `exp` passes.
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    pub fn sign_confirm(&self, email: &str) -> anyhow::Result<String> {
        self.sign_confirm_at(email, OffsetDateTime::now_utc())
    }

    fn sign_confirm_at(&self, email: &str, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let claims = ConfirmClaims {
            sub: email.to_owned(),
            iat: issued_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Confirm,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email = %email, "confirmation token signed");
        Ok(token)
    }

    /// Returns the email the token was issued for. Signature mismatch, wrong
    /// token kind, malformed payload and expiry all collapse into the same
    /// error so callers cannot probe which check failed.
    pub fn verify_confirm(&self, token: &str) -> anyhow::Result<String> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<ConfirmClaims>(token, &self.decoding, &validation)
            .map_err(|_| anyhow::anyhow!("invalid confirmation token"))?;
        let claims = data.claims;
        if claims.kind != TokenKind::Confirm {
            anyhow::bail!("invalid confirmation token");
        }
        let age = OffsetDateTime::now_utc().unix_timestamp() - claims.iat as i64;
        // Open interval: a token exactly max-age old is already expired.
        if age >= self.confirm_max_age.as_secs() as i64 {
            anyhow::bail!("invalid confirmation token");
        }
        Ok(claims.sub)
    }
}

pub struct AuthUser(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn make_keys_with_secret(secret: &str) -> JwtKeys {
        let base = make_keys();
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ..base
        }
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(42).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = make_keys_with_secret("some-other-secret");
        let token = other.sign_access(1).expect("sign access");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_expired_session() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            sub: 7,
            iat: past.unix_timestamp() as usize,
            exp: (past + TimeDuration::hours(1)).unix_timestamp() as usize,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify("not.a.token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[tokio::test]
    async fn confirm_roundtrip_returns_email() {
        let keys = make_keys();
        let token = keys.sign_confirm("a@b.com").expect("sign confirm");
        let email = keys.verify_confirm(&token).expect("verify confirm");
        assert_eq!(email, "a@b.com");
    }

    #[tokio::test]
    async fn confirm_rejects_token_at_exact_max_age() {
        let keys = make_keys();
        let issued = OffsetDateTime::now_utc()
            - TimeDuration::seconds(keys.confirm_max_age.as_secs() as i64);
        let token = keys.sign_confirm_at("a@b.com", issued).expect("sign");
        assert!(keys.verify_confirm(&token).is_err());
    }

    #[tokio::test]
    async fn confirm_accepts_token_within_window() {
        let keys = make_keys();
        let issued = OffsetDateTime::now_utc()
            - TimeDuration::seconds(keys.confirm_max_age.as_secs() as i64 - 5);
        let token = keys.sign_confirm_at("a@b.com", issued).expect("sign");
        assert_eq!(keys.verify_confirm(&token).expect("verify"), "a@b.com");
    }

    #[tokio::test]
    async fn confirm_rejects_tampered_and_foreign_tokens() {
        let keys = make_keys();
        let other = make_keys_with_secret("some-other-secret");
        let foreign = other.sign_confirm("a@b.com").expect("sign");
        assert!(keys.verify_confirm(&foreign).is_err());
        assert!(keys.verify_confirm("garbage").is_err());
    }

    #[tokio::test]
    async fn confirm_rejects_access_token() {
        let keys = make_keys();
        let access = keys.sign_access(1).expect("sign access");
        assert!(keys.verify_confirm(&access).is_err());
    }

    #[tokio::test]
    async fn session_verify_rejects_confirm_token() {
        let keys = make_keys();
        let confirm = keys.sign_confirm("a@b.com").expect("sign confirm");
        assert!(keys.verify(&confirm).is_err());
    }
}
