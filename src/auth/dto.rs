use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2-style password form posted to /token.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub message: String,
    pub avatar_url: String,
}

/// Query string for /send-confirmation-email/.
#[derive(Debug, Deserialize)]
pub struct EmailParams {
    pub email: String,
}

/// Query string for /confirm.
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub token: String,
}
