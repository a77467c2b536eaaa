//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying `{nickname, expiration}`. Expiry is checked
//! here rather than by `jsonwebtoken` so that an expired but correctly signed
//! token is classified as [`TokenError::Expired`].

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session lifetime: 7 days.
pub const SESSION_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub nickname: String,
    /// Unix timestamp, seconds.
    pub expiration: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key is empty")]
    EmptyKey,
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("invalid authentication token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("expired session")]
    Expired,
}

/// Issues and verifies session tokens with one process-wide HMAC secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    key_is_empty: bool,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        // Only the HMAC family is accepted; anything else in the header is
        // rejected before the signature is checked.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            key_is_empty: secret.is_empty(),
        }
    }

    pub fn issue(&self, nickname: &str) -> Result<String, TokenError> {
        self.issue_at(nickname, Utc::now().timestamp())
    }

    /// Issues a token as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, nickname: &str, now: i64) -> Result<String, TokenError> {
        if self.key_is_empty {
            return Err(TokenError::EmptyKey);
        }
        let claims = Claims {
            nickname: nickname.to_string(),
            expiration: now + SESSION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Checks signature and claim shape, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if self.key_is_empty {
            return Err(TokenError::EmptyKey);
        }
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(TokenError::Invalid)?
            .claims;
        if now > claims.expiration {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;

    use super::{Claims, TokenError, TokenSigner, SESSION_LIFETIME_SECS};

    const SECRET: &str = "test-secret-key";

    #[test]
    fn issued_token_verifies_to_same_nickname() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("dummy-user").unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.nickname, "dummy-user");
    }

    #[test]
    fn expiration_is_seven_days_after_issue() {
        let signer = TokenSigner::new(SECRET);
        let now = 1_700_000_000;
        let token = signer.issue_at("dummy-user", now).unwrap();

        let claims = signer.verify_at(&token, now).unwrap();
        assert_eq!(claims.expiration, now + SESSION_LIFETIME_SECS);
        assert_eq!(SESSION_LIFETIME_SECS, 604_800);
    }

    #[test]
    fn token_is_valid_until_expiration_inclusive() {
        let signer = TokenSigner::new(SECRET);
        let now = 1_700_000_000;
        let token = signer.issue_at("dummy-user", now).unwrap();

        assert!(signer
            .verify_at(&token, now + SESSION_LIFETIME_SECS)
            .is_ok());
        assert!(matches!(
            signer.verify_at(&token, now + SESSION_LIFETIME_SECS + 1),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let signer = TokenSigner::new(SECRET);
        let issued = Utc::now().timestamp() - SESSION_LIFETIME_SECS - 60;
        let token = signer.issue_at("dummy-user", issued).unwrap();

        assert!(matches!(signer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_from_other_key_is_invalid() {
        let token = TokenSigner::new("another-key").issue("dummy-user").unwrap();

        let result = TokenSigner::new(SECRET).verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        assert!(matches!(
            signer.verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(signer.verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("dummy-user").unwrap();
        let other = signer.issue("someone-else").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        parts[1] = other_parts[1];
        let forged = parts.join(".");

        assert!(matches!(signer.verify(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_without_expected_claims_is_invalid() {
        #[derive(Serialize)]
        struct Other {
            sub: String,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Other {
                sub: String::from("dummy-user"),
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = TokenSigner::new(SECRET).verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn other_hmac_variants_with_same_key_are_accepted() {
        let claims = Claims {
            nickname: String::from("dummy-user"),
            expiration: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(TokenSigner::new(SECRET).verify(&token).unwrap(), claims);
    }

    // Header segment of the signed token replaced with a pre-encoded one.
    fn with_header(token: &str, header: &str) -> String {
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = header;
        parts.join(".")
    }

    #[test]
    fn unsigned_none_algorithm_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("dummy-user").unwrap();
        // {"typ":"JWT","alg":"none"}
        let header = "eyJ0eXAiOiJKV1QiLCJhbGciOiJub25lIn0";

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = header;
        parts[2] = "";
        let unsigned = parts.join(".");
        assert!(matches!(signer.verify(&unsigned), Err(TokenError::Invalid(_))));

        let resigned = with_header(&token, header);
        assert!(matches!(signer.verify(&resigned), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn hmac_token_relabelled_as_rsa_is_invalid() {
        let signer = TokenSigner::new(SECRET);
        let token = signer.issue("dummy-user").unwrap();
        // {"typ":"JWT","alg":"RS256"}
        let relabelled = with_header(&token, "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9");

        assert!(matches!(
            signer.verify(&relabelled),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn empty_key_refuses_to_sign() {
        let signer = TokenSigner::new("");
        assert!(matches!(
            signer.issue("dummy-user"),
            Err(TokenError::EmptyKey)
        ));
    }
}
