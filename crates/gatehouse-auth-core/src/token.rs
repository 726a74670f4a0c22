//! Access token codec
//!
//! Issues and verifies compact signed access tokens (HS256 JWTs). Tokens
//! are stateless: nothing here touches storage. Expiry and issued-at are
//! checked against the injected clock with a small skew tolerance, and the
//! keyring supports zero-downtime signing-key rotation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use gatehouse_types::{AccessClaims, Role, UserId, TOKEN_TYPE_ACCESS};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use uuid::Uuid;

use crate::{AuthError, Clock, Keyring};

/// Access token codec
///
/// The keyring is an immutable snapshot behind a pointer swap: rotation
/// installs a new snapshot, readers clone the `Arc` and never hold the
/// lock across any other work.
pub struct TokenCodec {
    keyring: RwLock<Arc<Keyring>>,
    clock: Arc<dyn Clock>,
    skew: Duration,
    rotation_grace: Duration,
}

impl TokenCodec {
    /// Create a codec over a keyring
    pub fn new(
        keyring: Keyring,
        clock: Arc<dyn Clock>,
        skew: Duration,
        rotation_grace: Duration,
    ) -> Self {
        Self {
            keyring: RwLock::new(Arc::new(keyring)),
            clock,
            skew,
            rotation_grace,
        }
    }

    /// Issue a signed access token for `user_id` with the given role.
    pub fn issue(
        &self,
        user_id: UserId,
        role: Role,
        ttl: Duration,
    ) -> Result<(String, AccessClaims), AuthError> {
        let now = self.clock.now();
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|_| AuthError::Configuration("access token ttl out of range".to_string()))?;

        let claims = AccessClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
            typ: TOKEN_TYPE_ACCESS.to_string(),
        };

        let keyring = self.snapshot();
        let key = keyring.current();
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(key.kid().to_string());

        let token = encode(&header, &claims, key.encoding()).map_err(|e| {
            tracing::error!("token encoding failed: {}", e);
            AuthError::Internal("token encoding failed".to_string())
        })?;

        Ok((token, claims))
    }

    /// Verify a token: signature, expiry, and issued-at (skew-tolerant).
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode_claims(token, true)
    }

    /// Verify only the signature and shape, ignoring the time window.
    ///
    /// Used at logout to extract the jti of an access token that may
    /// already be past its expiry.
    pub fn peek(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode_claims(token, false)
    }

    /// Install a new signing key. The old current key keeps verifying
    /// tokens for the rotation grace window; issuance switches immediately.
    pub fn rotate_keys(&self, next: crate::SigningKey) {
        let now = self.clock.now();
        let mut guard = match self.keyring.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let rotated = (**guard).clone().rotated(next, now);
        *guard = Arc::new(rotated);
    }

    fn snapshot(&self) -> Arc<Keyring> {
        match self.keyring.read() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn decode_claims(&self, token: &str, enforce_time: bool) -> Result<AccessClaims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!("failed to decode token header: {}", e);
            AuthError::MalformedToken
        })?;
        if header.alg != Algorithm::HS256 {
            return Err(AuthError::BadSignature);
        }
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let now = self.clock.now();
        let keyring = self.snapshot();
        let key = keyring
            .decoding_key(&kid, now, self.rotation_grace)
            .ok_or_else(|| {
                tracing::debug!("no live key for kid {}", kid);
                AuthError::BadSignature
            })?;

        // Time-window checks run below against the injected clock; the
        // library's own exp validation (which reads the system clock) is
        // disabled.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(token, key, &validation).map_err(|e| {
            tracing::debug!("token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = data.claims;
        if claims.typ != TOKEN_TYPE_ACCESS {
            return Err(AuthError::MalformedToken);
        }

        if enforce_time {
            let now_ts = now.timestamp();
            let skew = self.skew.as_secs() as i64;
            if now_ts > claims.exp + skew {
                return Err(AuthError::Expired);
            }
            if claims.iat > now_ts + skew {
                return Err(AuthError::NotYetValid);
            }
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("skew", &self.skew)
            .field("rotation_grace", &self.rotation_grace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SigningKey;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(ts: i64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.timestamp_opt(ts, 0).unwrap())))
        }

        fn advance_secs(&self, secs: i64) {
            let mut guard = self.0.lock().unwrap();
            *guard += ChronoDuration::seconds(secs);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    const T0: i64 = 1_700_000_000;

    fn codec_with_clock(clock: Arc<FixedClock>) -> TokenCodec {
        let keyring = Keyring::new(SigningKey::new("k1", "a".repeat(32)).unwrap());
        TokenCodec::new(
            keyring,
            clock,
            Duration::from_secs(30),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let user_id = UserId::new();

        let (token, issued) = codec
            .issue(user_id, Role::Admin, Duration::from_secs(900))
            .unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified, issued);
        assert_eq!(verified.sub, user_id);
        assert_eq!(verified.role, Role::Admin);
        assert_eq!(verified.exp, T0 + 900);
    }

    #[test]
    fn test_expired_beyond_skew() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let (token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();

        // inside the skew window: still accepted
        clock.advance_secs(900 + 29);
        assert!(codec.verify(&token).is_ok());

        // beyond it: expired
        clock.advance_secs(2);
        assert!(matches!(codec.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_not_yet_valid_beyond_skew() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let (token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();

        // rewind: iat is now 31s in this verifier's future
        let clock2 = FixedClock::at(T0 - 31);
        let verifier = codec_with_clock(clock2);
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::NotYetValid)
        ));

        // 30s of skew is tolerated
        let clock3 = FixedClock::at(T0 - 30);
        let verifier = codec_with_clock(clock3);
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock);
        let (token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();

        // flip the first character of the payload segment; the signature
        // no longer covers what is presented
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut chars: Vec<char> = parts[1].chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        parts[1] = chars.into_iter().collect();
        let tampered = parts.join(".");

        assert!(matches!(
            codec.verify(&tampered),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let (token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();

        // a codec whose k1 has different secret bytes
        let other = TokenCodec::new(
            Keyring::new(SigningKey::new("k1", "b".repeat(32)).unwrap()),
            clock,
            Duration::from_secs(30),
            Duration::from_secs(3600),
        );
        assert!(matches!(other.verify(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock);

        for garbage in ["", "nodots", "a.b", "!!!.???.###"] {
            assert!(matches!(
                codec.verify(garbage),
                Err(AuthError::MalformedToken)
            ));
        }
    }

    #[test]
    fn test_key_rotation_grace_window() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let (old_token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(7200))
            .unwrap();

        codec.rotate_keys(SigningKey::new("k2", "c".repeat(32)).unwrap());

        // new issuance uses k2 immediately
        let (new_token, _) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();
        let header = decode_header(&new_token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("k2"));

        // k1-signed token still verifies inside the grace window
        assert!(codec.verify(&old_token).is_ok());

        // and stops verifying once the grace window lapses
        clock.advance_secs(3601);
        assert!(matches!(
            codec.verify(&old_token),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_peek_ignores_expiry_but_not_signature() {
        let clock = FixedClock::at(T0);
        let codec = codec_with_clock(clock.clone());
        let (token, issued) = codec
            .issue(UserId::new(), Role::User, Duration::from_secs(900))
            .unwrap();

        clock.advance_secs(10_000);
        assert!(matches!(codec.verify(&token), Err(AuthError::Expired)));
        assert_eq!(codec.peek(&token).unwrap().jti, issued.jti);

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(codec.peek(&tampered).is_err());
    }
}
