use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Public part of a user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_verified: u.is_verified,
            avatar_url: u.avatar_url,
        }
    }
}

/// `skip` is the wire name for the listing offset.
#[derive(Debug, Deserialize)]
pub struct UserPagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_verified: true,
            avatar_url: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn pagination_uses_skip_on_the_wire() {
        let p: UserPagination = serde_json::from_str(r#"{"skip": 5, "limit": 20}"#).unwrap();
        assert_eq!(p.skip, 5);
        assert_eq!(p.limit, 20);

        let p: UserPagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 100);
    }
}
