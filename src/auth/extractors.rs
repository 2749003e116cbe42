use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// The authenticated principal: bearer token verified, then the user row
/// resolved by the token's subject email.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Auth("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Auth("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let email = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::Auth("Could not validate credentials".into())
        })?;

        let user = User::find_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| ApiError::Auth("Could not validate credentials".into()))?;

        Ok(AuthUser(user))
    }
}
