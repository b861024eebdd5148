use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgscope_core::{NodeId, UserId};

use crate::{Identity, Role};

/// Identity claims carried by a verified token (transport-agnostic).
///
/// Decoding and signature verification happen outside this crate; this is
/// the shape expected once that is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the acting user.
    pub sub: UserId,

    pub role: Role,

    /// Home org node of the subject.
    pub node_id: NodeId,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Check the claim time window and produce the request's [`Identity`].
pub fn validate_claims(
    claims: &IdentityClaims,
    now: DateTime<Utc>,
) -> Result<Identity, TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(Identity::new(claims.sub, claims.role, claims.node_id))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> IdentityClaims {
        IdentityClaims {
            sub: UserId::new(),
            role: Role::Manager,
            node_id: NodeId::new(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn valid_window_yields_identity() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(5), Duration::hours(2));
        let identity = validate_claims(&c, now).unwrap();
        assert_eq!(identity.user_id, c.sub);
        assert_eq!(identity.role, Role::Manager);
        assert_eq!(identity.home_node_id, c.node_id);
    }

    #[test]
    fn rejects_expired_future_and_inverted_windows() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims(now - Duration::hours(3), Duration::hours(2)), now),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims(now + Duration::minutes(1), Duration::hours(2)), now),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(now, Duration::zero()), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
