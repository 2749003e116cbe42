use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::contacts::dto::ContactFields;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: Date,
    pub created_at: OffsetDateTime,
}

impl Contact {
    pub async fn create(db: &PgPool, owner_id: Uuid, fields: &ContactFields) -> sqlx::Result<Contact> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (owner_id, first_name, last_name, email, phone_number, birth_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            "#,
        )
        .bind(owner_id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(fields.birth_date)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Full replace of the five mutable fields. The owner never changes.
    pub async fn update(db: &PgPool, id: Uuid, fields: &ContactFields) -> sqlx::Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = $2, last_name = $3, email = $4, phone_number = $5, birth_date = $6
            WHERE id = $1
            RETURNING id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            "#,
        )
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(fields.birth_date)
        .fetch_optional(db)
        .await
    }

    /// Returns the deleted snapshot, or None if the contact was already gone.
    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            DELETE FROM contacts
            WHERE id = $1
            RETURNING id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Insertion-order stable pagination.
    pub async fn list(db: &PgPool, offset: i64, limit: i64) -> sqlx::Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            FROM contacts
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Case-insensitive substring match, OR-combined across name, email and
    /// phone. No ranking; storage order.
    pub async fn search(db: &PgPool, query: &str) -> sqlx::Result<Vec<Contact>> {
        let pattern = format!("%{}%", query);
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            FROM contacts
            WHERE first_name ILIKE $1
               OR last_name ILIKE $1
               OR email ILIKE $1
               OR phone_number ILIKE $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(db)
        .await
    }

    /// Contacts whose birthday (month/day) falls within the next seven days,
    /// today inclusive. Comparison deliberately ignores the birth year.
    pub async fn upcoming_birthdays(db: &PgPool, today: Date) -> sqlx::Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, owner_id, first_name, last_name, email, phone_number, birth_date, created_at
            FROM contacts
            WHERE to_char(birth_date, 'MMDD') = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(birthday_window_keys(today))
        .fetch_all(db)
        .await
    }
}

/// Month/day keys ("MMDD") for [today, today + 7 days], wrapping over the
/// year boundary. Matched against `to_char(birth_date, 'MMDD')` so the birth
/// year never takes part in the comparison.
pub fn birthday_window_keys(today: Date) -> Vec<String> {
    (0..=7)
        .map(|offset| {
            let d = today + Duration::days(offset);
            format!("{:02}{:02}", d.month() as u8, d.day())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn window_is_today_through_seventh_day_inclusive() {
        let keys = birthday_window_keys(date!(2026 - 06 - 15));
        assert_eq!(keys.len(), 8);
        assert_eq!(keys.first().map(String::as_str), Some("0615"));
        assert_eq!(keys.last().map(String::as_str), Some("0622"));
        assert!(!keys.contains(&"0614".to_string()));
        assert!(!keys.contains(&"0623".to_string()));
    }

    #[test]
    fn window_wraps_over_new_year() {
        let keys = birthday_window_keys(date!(2026 - 12 - 29));
        assert!(keys.contains(&"1231".to_string()));
        assert!(keys.contains(&"0102".to_string()));
        assert!(keys.contains(&"0105".to_string()));
        assert!(!keys.contains(&"0106".to_string()));
    }

    #[test]
    fn keys_are_zero_padded_month_day() {
        let keys = birthday_window_keys(date!(2026 - 02 - 03));
        assert_eq!(keys.first().map(String::as_str), Some("0203"));
        // Matches Postgres to_char(birth_date, 'MMDD') output exactly.
        assert!(keys.iter().all(|k| k.len() == 4));
    }
}
