use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use axum::http::HeaderMap;
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use tracing::warn;

use crate::error::ApiError;

/// Per-client GCRA limiter, keyed by caller address.
pub type ClientRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub fn per_minute(max_requests: u32) -> ClientRateLimiter {
    let max = NonZeroU32::new(max_requests.max(1)).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(Duration::from_secs(60) / max.get())
        .unwrap_or_else(|| Quota::per_minute(max))
        .allow_burst(max);
    RateLimiter::keyed(quota)
}

/// Key the limiter on the first `X-Forwarded-For` hop when behind a proxy,
/// falling back to the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn check(limiter: &ClientRateLimiter, key: &str) -> Result<(), ApiError> {
    if limiter.check_key(&key.to_string()).is_err() {
        warn!(%key, "rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allows_quota_then_rejects() {
        let limiter = per_minute(10);
        for _ in 0..10 {
            assert!(check(&limiter, "1.2.3.4").is_ok());
        }
        assert!(matches!(
            check(&limiter, "1.2.3.4"),
            Err(ApiError::RateLimited)
        ));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = per_minute(1);
        assert!(check(&limiter, "1.2.3.4").is_ok());
        assert!(check(&limiter, "1.2.3.4").is_err());
        assert!(check(&limiter, "5.6.7.8").is_ok());
    }

    #[test]
    fn key_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.9");
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "127.0.0.1");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }
}
