/// Session token claims
///
/// The payload of a session token: who it asserts and its validity window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Authenticated username
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Claims valid from `now` for `ttl`.
    pub fn new(username: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            username: username.into(),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let now = Utc::now();
        let claims = SessionClaims::new("alice", now, Duration::hours(24));

        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 86400);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let claims = SessionClaims::new("alice", now, Duration::seconds(60));

        assert!(!claims.is_expired_at(now + Duration::seconds(59)));
        assert!(claims.is_expired_at(now + Duration::seconds(60)));
        assert!(claims.is_expired_at(now + Duration::seconds(61)));
    }

    #[test]
    fn test_timestamp_accessors() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = SessionClaims::new("alice", now, Duration::seconds(10));

        assert_eq!(claims.issued_at(), Some(now));
        assert_eq!(claims.expires_at(), Some(now + Duration::seconds(10)));
    }
}
