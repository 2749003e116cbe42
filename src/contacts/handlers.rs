use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::contacts::dto::{ContactFields, Pagination, SearchParams};
use crate::contacts::repo::Contact;
use crate::error::{is_unique_violation, ApiError};
use crate::rate_limit;
use crate::state::AppState;

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts/", get(list_contacts).post(create_contact))
        .route("/contacts/search/", get(search_contacts))
        .route("/contacts/birthdays/", get(upcoming_birthdays))
        .route(
            "/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

/// The unique index on contacts.email is the source of truth for duplicates;
/// create and update hit it the same way.
fn map_contact_write_err(e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::Conflict("Contact with this email already exists".into())
    } else {
        e.into()
    }
}

/// Existence before ownership: an absent contact is 404 for everyone, an
/// existing one owned by someone else is 403.
async fn load_owned(db: &PgPool, id: Uuid, principal: Uuid) -> Result<Contact, ApiError> {
    let contact = Contact::find_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact not found".into()))?;
    if contact.owner_id != principal {
        return Err(ApiError::Forbidden("Access denied".into()));
    }
    Ok(contact)
}

#[instrument(skip(state, fields))]
pub async fn create_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(fields): Json<ContactFields>,
) -> Result<Json<Contact>, ApiError> {
    fields.validate()?;
    let contact = Contact::create(&state.db, user.id, &fields)
        .await
        .map_err(map_contact_write_err)?;
    info!(contact_id = %contact.id, owner_id = %user.id, "contact created");
    Ok(Json(contact))
}

/// Public listing, rate-limited per client.
#[instrument(skip(state, headers))]
pub async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let key = rate_limit::client_key(&headers, peer.map(|ConnectInfo(addr)| addr));
    rate_limit::check(&state.contacts_limiter, &key)?;

    let (offset, limit) = p.clamp();
    let contacts = Contact::list(&state.db, offset, limit).await?;
    Ok(Json(contacts))
}

#[instrument(skip(state, user))]
pub async fn get_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
    let contact = load_owned(&state.db, id, user.id).await?;
    Ok(Json(contact))
}

#[instrument(skip(state, user, fields))]
pub async fn update_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(fields): Json<ContactFields>,
) -> Result<Json<Contact>, ApiError> {
    fields.validate()?;
    load_owned(&state.db, id, user.id).await?;
    let updated = Contact::update(&state.db, id, &fields)
        .await
        .map_err(map_contact_write_err)?
        .ok_or_else(|| ApiError::NotFound("Contact not found".into()))?;
    info!(contact_id = %id, owner_id = %user.id, "contact updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
    load_owned(&state.db, id, user.id).await?;
    let deleted = Contact::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact not found".into()))?;
    info!(contact_id = %id, owner_id = %user.id, "contact deleted");
    Ok(Json(deleted))
}

#[instrument(skip(state))]
pub async fn search_contacts(
    State(state): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = Contact::search(&state.db, &p.query).await?;
    Ok(Json(contacts))
}

#[instrument(skip(state))]
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let today = time::OffsetDateTime::now_utc().date();
    let contacts = Contact::upcoming_birthdays(&state.db, today).await?;
    Ok(Json(contacts))
}
