//! Token authentication primitives
//!
//! Pure functions only, no HTTP framework dependencies. The gateway calls
//! `verify_token` at handshake time; token issuance belongs to the auth
//! subsystem, but `issue_token` is provided here so that subsystem and the
//! test suites share one format.
//!
//! # Token format
//!
//! `{user_uuid}.{issued_at_ms}.{signature}`
//!
//! where `signature` is the lowercase-hex SHA-256 of
//! `"{user_uuid}.{issued_at_ms}.{shared_secret}"`. Verification fails closed:
//! any missing, malformed, expired, or wrongly-signed token is rejected.

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// ========================================
// Error Types
// ========================================

/// Handshake authentication failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token presented
    Missing,

    /// Token does not have the `uuid.timestamp.signature` shape
    Malformed,

    /// Token issued too long ago (or stamped in the future)
    Expired { age_ms: i64, max_age_ms: u64 },

    /// Signature does not match the shared secret
    BadSignature,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Missing => write!(f, "Missing credential token"),
            AuthError::Malformed => write!(f, "Malformed credential token"),
            AuthError::Expired { age_ms, max_age_ms } => {
                write!(f, "Token expired: age {}ms exceeds {}ms", age_ms, max_age_ms)
            }
            AuthError::BadSignature => write!(f, "Token signature mismatch"),
        }
    }
}

impl std::error::Error for AuthError {}

// ========================================
// Shared Secret
// ========================================

/// Generate a crypto-random non-zero shared secret
///
/// Used at first startup when no secret is configured.
pub fn generate_shared_secret() -> i64 {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            return val;
        }
    }
}

// ========================================
// Issue / Verify
// ========================================

/// Current time in milliseconds since the UNIX epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Signature over the token body and shared secret (64 lowercase hex chars)
fn sign(user_id: Uuid, issued_at_ms: u64, shared_secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}.{}.{}", user_id, issued_at_ms, shared_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue a token for a user, stamped with the current time
pub fn issue_token(user_id: Uuid, shared_secret: i64) -> String {
    issue_token_at(user_id, now_ms(), shared_secret)
}

/// Issue a token with an explicit issue timestamp (tests, clock injection)
pub fn issue_token_at(user_id: Uuid, issued_at_ms: u64, shared_secret: i64) -> String {
    let signature = sign(user_id, issued_at_ms, shared_secret);
    format!("{}.{}.{}", user_id, issued_at_ms, signature)
}

/// Verify a token and extract the user identity
///
/// # Errors
///
/// - `AuthError::Missing` for an empty token
/// - `AuthError::Malformed` when the shape or uuid/timestamp fields are invalid
/// - `AuthError::Expired` when older than `max_age_ms` (future-stamped tokens
///   beyond 1s of clock skew are also rejected as expired)
/// - `AuthError::BadSignature` when the signature does not verify
pub fn verify_token(token: &str, shared_secret: i64, max_age_ms: u64) -> Result<Uuid, AuthError> {
    if token.is_empty() {
        return Err(AuthError::Missing);
    }

    // Token body is "uuid.issued_at.signature"; uuid contains no '.' so a
    // simple 3-way split is unambiguous.
    let mut parts = token.splitn(3, '.');
    let (user_part, ts_part, sig_part) = match (parts.next(), parts.next(), parts.next()) {
        (Some(u), Some(t), Some(s)) => (u, t, s),
        _ => return Err(AuthError::Malformed),
    };

    let user_id = Uuid::parse_str(user_part).map_err(|_| AuthError::Malformed)?;
    let issued_at_ms: u64 = ts_part.parse().map_err(|_| AuthError::Malformed)?;

    let age_ms = now_ms() as i64 - issued_at_ms as i64;
    if age_ms > max_age_ms as i64 || age_ms < -1000 {
        return Err(AuthError::Expired {
            age_ms,
            max_age_ms,
        });
    }

    let expected = sign(user_id, issued_at_ms, shared_secret);
    if sig_part != expected {
        return Err(AuthError::BadSignature);
    }

    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: i64 = 987654321;
    const MAX_AGE: u64 = 60_000;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let user = Uuid::new_v4();
        let token = issue_token(user, SECRET);
        assert_eq!(verify_token(&token, SECRET, MAX_AGE), Ok(user));
    }

    #[test]
    fn test_empty_token_is_missing() {
        assert_eq!(verify_token("", SECRET, MAX_AGE), Err(AuthError::Missing));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert_eq!(
            verify_token("not-a-token", SECRET, MAX_AGE),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            verify_token("a.b.c", SECRET, MAX_AGE),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let user = Uuid::new_v4();
        let old = now_ms() - MAX_AGE - 5_000;
        let token = issue_token_at(user, old, SECRET);
        match verify_token(&token, SECRET, MAX_AGE) {
            Err(AuthError::Expired { age_ms, .. }) => assert!(age_ms > MAX_AGE as i64),
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let user = Uuid::new_v4();
        let token = issue_token(user, SECRET);
        assert_eq!(
            verify_token(&token, SECRET + 1, MAX_AGE),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_user_id_rejected() {
        let token = issue_token(Uuid::new_v4(), SECRET);
        let parts: Vec<&str> = token.splitn(3, '.').collect();
        let forged = format!("{}.{}.{}", Uuid::new_v4(), parts[1], parts[2]);
        assert!(verify_token(&forged, SECRET, MAX_AGE).is_err());
    }

    #[test]
    fn test_generated_secret_nonzero() {
        assert_ne!(generate_shared_secret(), 0);
    }
}
