use serde::Deserialize;
use time::Date;

use crate::auth::is_valid_email;
use crate::error::ApiError;

/// The five mutable contact fields; create and update take the full set.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: Date,
}

impl ContactFields {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.first_name.trim().is_empty() {
            return Err(ApiError::Validation("first_name must not be empty".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(ApiError::Validation("last_name must not be empty".into()));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::Validation("invalid email".into()));
        }
        if self.phone_number.trim().is_empty() {
            return Err(ApiError::Validation("phone_number must not be empty".into()));
        }
        Ok(())
    }
}

/// `page` is an offset into the listing, kept for wire compatibility.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

impl Pagination {
    pub fn clamp(&self) -> (i64, i64) {
        (self.page.max(0), self.limit.clamp(1, 100))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn fields() -> ContactFields {
        ContactFields {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "j@x.com".into(),
            phone_number: "1".into(),
            birth_date: date!(1990 - 06 - 15),
        }
    }

    #[test]
    fn valid_fields_pass() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn blank_or_malformed_fields_fail() {
        let mut f = fields();
        f.first_name = "  ".into();
        assert!(matches!(f.validate(), Err(ApiError::Validation(_))));

        let mut f = fields();
        f.email = "not-an-email".into();
        assert!(matches!(f.validate(), Err(ApiError::Validation(_))));

        let mut f = fields();
        f.phone_number = "".into();
        assert!(matches!(f.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination { page: -3, limit: 500 };
        assert_eq!(p.clamp(), (0, 100));
        let p = Pagination { page: 2, limit: 0 };
        assert_eq!(p.clamp(), (2, 1));
        let p = Pagination { page: 0, limit: 10 };
        assert_eq!(p.clamp(), (0, 10));
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page, 0);
        assert_eq!(p.limit, 10);
    }
}
