pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

use crate::state::AppState;
use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Canonical form for stored and looked-up emails. Every handler that touches
/// the users table by email goes through this, so a mixed-case login finds
/// the row its registration created.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, normalize_email};

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("john.doe+tag@example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn normalization_is_case_and_whitespace_insensitive() {
        assert_eq!(normalize_email("  John@X.com "), "john@x.com");
        assert_eq!(normalize_email("john@x.com"), "john@x.com");
        // Registration and login must canonicalize to the same key.
        assert_eq!(
            normalize_email("John@X.com"),
            normalize_email("john@X.COM")
        );
    }
}
