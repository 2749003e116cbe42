use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{PublicUser, UserPagination};
use crate::users::repo::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users))
        .route("/verified-users/", get(list_verified_users))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(p): Query<UserPagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list(&state.db, p.skip.max(0), p.limit.clamp(1, 100)).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_verified_users(
    State(state): State<AppState>,
    Query(p): Query<UserPagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list_verified(&state.db, p.skip.max(0), p.limit.clamp(1, 100)).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
