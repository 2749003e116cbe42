use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, state::AppState};

/// Token purpose: short-lived API access or one-hour email confirmation.
/// Both are signed with the same server secret; the `kind` claim keeps one
/// from being redeemed as the other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Confirm,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // subject email
    pub exp: usize,
    pub iat: usize,
    pub kind: TokenKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub access_ttl: Duration,
    pub confirm_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            access_ttl_minutes,
            confirm_ttl_seconds,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            confirm_ttl: Duration::from_secs(confirm_ttl_seconds as u64),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Confirm => self.confirm_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(%email, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(email, TokenKind::Access)
    }

    pub fn sign_confirmation(&self, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(email, TokenKind::Confirm)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;
        if data.claims.kind != expected {
            return Err(TokenError::Invalid);
        }
        debug!(email = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims.sub)
    }

    /// Verify a bearer token and return the subject email.
    pub fn verify_access(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    /// Verify an email-confirmation token and return the subject email.
    pub fn verify_confirmation(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenKind::Confirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.sign_access("a@x.com").expect("sign access");
        let email = keys.verify_access(&token).expect("verify token");
        assert_eq!(email, "a@x.com");
    }

    #[tokio::test]
    async fn sign_and_verify_confirmation_token() {
        let keys = make_keys();
        let token = keys.sign_confirmation("b@x.com").expect("sign confirm");
        let email = keys.verify_confirmation(&token).expect("verify confirm");
        assert_eq!(email, "b@x.com");
    }

    #[tokio::test]
    async fn access_token_is_not_a_confirmation_token() {
        let keys = make_keys();
        let access = keys.sign_access("a@x.com").expect("sign access");
        assert_eq!(keys.verify_confirmation(&access), Err(TokenError::Invalid));
        let confirm = keys.sign_confirmation("a@x.com").expect("sign confirm");
        assert_eq!(keys.verify_access(&confirm), Err(TokenError::Invalid));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_as_expired() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "a@x.com".into(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize, // well past the default leeway
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert_eq!(keys.verify_access(&token), Err(TokenError::Expired));
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let keys = make_keys();
        let mut token = keys.sign_access("a@x.com").expect("sign access");
        token.push('x');
        assert_eq!(keys.verify_access(&token), Err(TokenError::Invalid));

        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"another-secret"),
            decoding: DecodingKey::from_secret(b"another-secret"),
            access_ttl: Duration::from_secs(1800),
            confirm_ttl: Duration::from_secs(3600),
        };
        let foreign = other.sign_access("a@x.com").expect("sign");
        assert_eq!(keys.verify_access(&foreign), Err(TokenError::Invalid));
    }
}
