/// Session Token Issuance and Verification
///
/// HS256 JWTs (`header.payload.signature`, base64url segments) carrying
/// `SessionClaims`. Stateless: nothing is stored server side and a token stays
/// valid until it expires.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::auth::claims::SessionClaims;
use crate::clock::Clock;
use crate::configuration::AuthSettings;
use crate::error::{AppError, TokenError};

/// Issues and verifies session tokens with one signing key.
///
/// The key is fixed at construction; cloning shares it. Expiry is checked
/// against the injected `Clock` rather than the system time, with no leeway.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` must be present, but its comparison uses our clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }

    /// Build from configuration, resolving (or generating) the signing key.
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` for a short secret or an out-of-range TTL.
    pub fn from_settings(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        settings.validate()?;
        let secret = settings.signing_secret()?;
        Ok(Self::new(
            &secret,
            Duration::seconds(settings.token_ttl_seconds),
            clock,
        ))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `username`, valid from now for the configured TTL.
    ///
    /// # Errors
    /// `TokenError::SigningFailed` if serialization or signing fails
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let claims = SessionClaims::new(username, self.clock.now(), self.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()).into())
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// - `TokenError::Malformed`: wrong segment count, bad base64, bad JSON,
    ///   missing claims
    /// - `TokenError::BadSignature`: signature does not match this key, or the
    ///   header names another algorithm
    /// - `TokenError::Expired`: the current time is at or past `exp`
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                AppError::from(classify_jwt_error(e))
            })?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired.into());
        }

        Ok(claims)
    }
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SystemClock};
    use chrono::Utc;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-characters-long";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(24), Arc::new(SystemClock))
    }

    fn service_at(now: chrono::DateTime<Utc>) -> TokenService {
        TokenService::new(SECRET, Duration::hours(24), Arc::new(FixedClock(now)))
    }

    fn assert_rejected(result: Result<SessionClaims, AppError>) {
        match result {
            Err(AppError::Token(TokenError::BadSignature))
            | Err(AppError::Token(TokenError::Malformed(_))) => {}
            other => panic!("expected BadSignature or Malformed, got {:?}", other),
        }
    }

    fn flip(c: char) -> char {
        if c == 'A' {
            'B'
        } else {
            'A'
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service();
        let token = service.issue("alice").expect("Failed to issue token");

        assert_eq!(token.split('.').count(), 3);

        let claims = service.verify(&token).expect("Failed to verify token");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc::now() - Duration::hours(48);
        let token = service_at(issued).issue("alice").unwrap();

        let result = service().verify(&token);
        assert!(matches!(result, Err(AppError::Token(TokenError::Expired))));
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let issued = Utc::now();
        let token = service_at(issued).issue("alice").unwrap();

        let just_before = service_at(issued + Duration::hours(24) - Duration::seconds(1));
        assert!(just_before.verify(&token).is_ok());

        let at_expiry = service_at(issued + Duration::hours(24));
        assert!(matches!(
            at_expiry.verify(&token),
            Err(AppError::Token(TokenError::Expired))
        ));
    }

    #[test]
    fn test_wrong_key() {
        let token = service().issue("alice").unwrap();
        let other = TokenService::new(
            b"another-secret-key-at-least-32-characters",
            Duration::hours(24),
            Arc::new(SystemClock),
        );

        let result = other.verify(&token);
        assert!(matches!(result, Err(AppError::Token(TokenError::BadSignature))));
    }

    #[test]
    fn test_malformed_tokens() {
        let service = service();

        for token in ["", "invalid", "only.two", "a.b.c.d", "invalid.token.here"] {
            assert!(
                matches!(service.verify(token), Err(AppError::Token(TokenError::Malformed(_)))),
                "token {:?} should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_tampered_payload_and_signature() {
        let service = service();
        let token = service.issue("alice").unwrap();
        let header_len = token.find('.').unwrap() + 1;

        // Every character after the header: payload, separator and signature.
        for (i, c) in token.char_indices().skip(header_len) {
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &flip(c).to_string());
            assert_rejected(service.verify(&tampered));
        }
    }

    #[test]
    fn test_forged_claims_rejected() {
        let service = service();
        let token = service.issue("alice").unwrap();
        let mallory = service.issue("mallory").unwrap();

        // alice's header and signature around mallory's payload
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = mallory.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            service.verify(&forged),
            Err(AppError::Token(TokenError::BadSignature))
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = SessionClaims::new("alice", Utc::now(), Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            service().verify(&token),
            Err(AppError::Token(TokenError::BadSignature))
        ));
    }

    #[test]
    fn test_from_settings() {
        let settings = AuthSettings {
            secret: Some(String::from_utf8(SECRET.to_vec()).unwrap()),
            token_ttl_seconds: 900,
            bcrypt_cost: 4,
        };
        let service = TokenService::from_settings(&settings, Arc::new(SystemClock)).unwrap();
        assert_eq!(service.ttl(), Duration::seconds(900));

        // Same configured secret, same key.
        let token = service.issue("alice").unwrap();
        assert_eq!(service_verify_with(SECRET, &token), "alice");
    }

    #[test]
    fn test_from_settings_rejects_oversized_ttl() {
        let settings = AuthSettings {
            secret: Some(String::from_utf8(SECRET.to_vec()).unwrap()),
            token_ttl_seconds: i64::MAX,
            bcrypt_cost: 4,
        };

        assert!(matches!(
            TokenService::from_settings(&settings, Arc::new(SystemClock)),
            Err(AppError::Config(_))
        ));
    }

    fn service_verify_with(secret: &[u8], token: &str) -> String {
        TokenService::new(secret, Duration::hours(1), Arc::new(SystemClock))
            .verify(token)
            .unwrap()
            .username
    }
}
