use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, is_verified, avatar_url, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, avatar_url, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, avatar_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Users in registration order.
    pub async fn list(db: &PgPool, offset: i64, limit: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, avatar_url, created_at
            FROM users
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn list_verified(db: &PgPool, offset: i64, limit: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, avatar_url, created_at
            FROM users
            WHERE is_verified = TRUE
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Idempotent: re-confirming a confirmed user re-sets the same flag.
    pub async fn mark_verified(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE
            WHERE email = $1
            RETURNING id, email, password_hash, is_verified, avatar_url, created_at
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Only called after the media gateway has accepted the upload.
    pub async fn set_avatar_url(db: &PgPool, id: Uuid, url: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET avatar_url = $2
            WHERE id = $1
            RETURNING id, email, password_hash, is_verified, avatar_url, created_at
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_one(db)
        .await
    }
}
