use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Query, State},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::dto::{
    AvatarResponse, ConfirmParams, EmailParams, MessageResponse, RegisterRequest, TokenForm,
    TokenResponse,
};
use crate::auth::extractors::AuthUser;
use crate::auth::jwt::{JwtKeys, TokenError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{is_valid_email, normalize_email};
use crate::error::{is_unique_violation, ApiError};
use crate::mailer::confirmation_email_body;
use crate::state::AppState;
use crate::storage::ext_from_mime;
use crate::users::dto::PublicUser;
use crate::users::repo::User;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(token))
        .route("/send-confirmation-email/", post(send_confirmation_email))
        .route("/confirm", get(confirm_email))
        .route(
            "/update-avatar/",
            post(update_avatar).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    // Fast path only; the unique index decides under concurrency.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("User with this email already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("User with this email already exists".into())
            } else {
                e.into()
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    spawn_confirmation_email(&state, user.email.clone());

    Ok(Json(PublicUser::from(user)))
}

/// Fire-and-forget: the response does not wait for delivery, and a delivery
/// failure is logged, never surfaced.
fn spawn_confirmation_email(state: &AppState, email: String) {
    let keys = JwtKeys::from_ref(state);
    let mailer = state.mailer.clone();
    let base_url = state.config.public_base_url.clone();
    tokio::spawn(async move {
        let token = match keys.sign_confirmation(&email) {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, %email, "sign confirmation token failed");
                return;
            }
        };
        let body = confirmation_email_body(&base_url, &token);
        if let Err(e) = mailer.send(&email, "Email Confirmation", &body).await {
            error!(error = %e, %email, "confirmation email delivery failed");
        }
    });
}

#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = normalize_email(&form.username);
    let user = User::find_by_email(&state.db, &username).await?;
    let ok = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash)?,
        None => false,
    };
    let Some(user) = user.filter(|_| ok) else {
        warn!(username = %form.username, "login rejected");
        return Err(ApiError::BadRequest("Incorrect username or password".into()));
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[instrument(skip(state))]
pub async fn send_confirmation_email(
    State(state): State<AppState>,
    Query(p): Query<EmailParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(&p.email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_confirmation(&user.email)?;
    let body = confirmation_email_body(&state.config.public_base_url, &token);

    state
        .mailer
        .send(&user.email, "Email Confirmation", &body)
        .await
        .map_err(|e| ApiError::Internal(e.context("send confirmation email")))?;

    Ok(Json(MessageResponse {
        message: "Confirmation email sent successfully".into(),
    }))
}

#[instrument(skip(state, p))]
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(p): Query<ConfirmParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let email = keys.verify_confirmation(&p.token).map_err(|e| match e {
        TokenError::Expired => ApiError::BadRequest("Token has expired".into()),
        TokenError::Invalid => ApiError::BadRequest("Invalid token".into()),
    })?;

    // Idempotent: confirming an already verified email succeeds again.
    let user = User::mark_verified(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, email = %user.email, "email confirmed");
    Ok(Json(MessageResponse {
        message: "Email successfully confirmed".into(),
    }))
}

#[instrument(skip(state, user, multipart))]
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, ApiError> {
    let Some((data, content_type)) = read_upload(&mut multipart).await? else {
        return Err(ApiError::BadRequest("No image uploaded".into()));
    };

    let ext = ext_from_mime(&content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user.id, Uuid::new_v4(), ext);

    // Synchronous within the request: the URL is persisted only after the
    // gateway has accepted the object.
    let avatar_url = state
        .storage
        .upload(&key, data, &content_type)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "avatar upload failed");
            ApiError::Upstream("Avatar upload failed".into())
        })?;

    let user = User::set_avatar_url(&state.db, user.id, &avatar_url).await?;
    info!(user_id = %user.id, "avatar updated");

    Ok(Json(AvatarResponse {
        message: "Avatar updated successfully".into(),
        avatar_url,
    }))
}

/// First file field of the form, or None when the form carries no file.
/// A body that fails to parse is a 400, not a missing file.
async fn read_upload(
    multipart: &mut Multipart,
) -> Result<Option<(bytes::Bytes, String)>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(None),
            Err(e) => return Err(ApiError::BadRequest(e.to_string())),
        };
        if field.file_name().is_some() || field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            return Ok(Some((data, content_type)));
        }
    }
}
