use std::{fmt, sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// Signed session payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Same shape as [`Claims`] but tolerant of a missing subject, so that case
/// can be told apart from a token that does not decode at all.
#[derive(Debug, Deserialize)]
struct IncomingClaims {
    #[serde(default)]
    sub: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Missing,
    Malformed,
    Expired,
    BadSignature,
    MissingSubject,
    WrongIssuerOrAudience,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvalidReason::Missing => "missing token",
            InvalidReason::Malformed => "malformed token",
            InvalidReason::Expired => "expired token",
            InvalidReason::BadSignature => "signature mismatch",
            InvalidReason::MissingSubject => "token has no subject",
            InvalidReason::WrongIssuerOrAudience => "unexpected issuer or audience",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerdict {
    Valid(Uuid),
    Invalid(InvalidReason),
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(
                u64::try_from(cfg.ttl_minutes)
                    .unwrap_or_default()
                    .saturating_mul(60),
            ),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let ttl = i64::try_from(self.ttl.as_secs())
            .ok()
            .map(TimeDuration::seconds)
            .context("token lifetime out of range")?;
        let exp = issued_at
            .checked_add(ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    pub fn verify(&self, token: &str) -> TokenVerdict {
        let data = match decode::<IncomingClaims>(token, &self.decoding, &self.validation()) {
            Ok(data) => data,
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => InvalidReason::Expired,
                    ErrorKind::InvalidSignature => InvalidReason::BadSignature,
                    ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                        InvalidReason::WrongIssuerOrAudience
                    }
                    _ => InvalidReason::Malformed,
                };
                return TokenVerdict::Invalid(reason);
            }
        };

        let Some(sub) = data.claims.sub else {
            return TokenVerdict::Invalid(InvalidReason::MissingSubject);
        };
        match Uuid::parse_str(&sub) {
            Ok(user_id) => {
                debug!(user_id = %user_id, "jwt verified");
                TokenVerdict::Valid(user_id)
            }
            Err(_) => TokenVerdict::Invalid(InvalidReason::Malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60,
        })
    }

    fn keys() -> JwtKeys {
        make_keys("dev-secret", "test-issuer", "test-aud")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        assert_eq!(keys.verify(&token), TokenVerdict::Valid(user_id));
    }

    #[test]
    fn token_is_valid_right_up_to_expiry() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        // Issued a few seconds short of one full lifetime ago.
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(60) + TimeDuration::seconds(5);
        let token = keys.issue_at(user_id, issued).unwrap();
        assert_eq!(keys.verify(&token), TokenVerdict::Valid(user_id));
    }

    #[test]
    fn token_is_rejected_after_expiry() {
        let keys = keys();
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(60) - TimeDuration::seconds(5);
        let token = keys.issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(keys.verify(&token), TokenVerdict::Invalid(InvalidReason::Expired));
    }

    #[test]
    fn oversized_lifetime_fails_instead_of_panicking() {
        for ttl_minutes in [10_000_000_000_000, i64::MAX] {
            let keys = JwtKeys::from_config(&JwtConfig {
                secret: "dev-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes,
            });
            let err = keys.issue(Uuid::new_v4()).unwrap_err();
            assert!(err.to_string().contains("out of range"), "ttl: {ttl_minutes}");
        }
    }

    #[test]
    fn negative_lifetime_yields_expired_tokens_not_a_panic() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: -5,
        });
        assert_eq!(keys.ttl, Duration::ZERO);
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(5);
        let token = keys.issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(keys.verify(&token), TokenVerdict::Invalid(InvalidReason::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4()).unwrap();
        let forged = make_keys("other-secret", "test-issuer", "test-aud")
            .issue(Uuid::new_v4())
            .unwrap();
        // Payload of one token glued to the signature of another.
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_sig = forged.rsplit('.').next().unwrap();
        parts[2] = forged_sig;
        assert_eq!(
            keys.verify(&parts.join(".")),
            TokenVerdict::Invalid(InvalidReason::BadSignature)
        );
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = make_keys("other", "test-issuer", "test-aud")
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(
            keys().verify(&token),
            TokenVerdict::Invalid(InvalidReason::BadSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            keys().verify("not.a.jwt"),
            TokenVerdict::Invalid(InvalidReason::Malformed)
        );
        assert_eq!(keys().verify(""), TokenVerdict::Invalid(InvalidReason::Malformed));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let token = make_keys("dev-secret", "bad-iss", "test-aud")
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(
            keys().verify(&token),
            TokenVerdict::Invalid(InvalidReason::WrongIssuerOrAudience)
        );
    }

    #[test]
    fn payload_without_subject_is_rejected() {
        #[derive(Serialize)]
        struct NoSub {
            exp: i64,
            iss: String,
            aud: String,
        }
        let keys = keys();
        let claims = NoSub {
            exp: (OffsetDateTime::now_utc() + TimeDuration::minutes(5)).unix_timestamp(),
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert_eq!(
            keys.verify(&token),
            TokenVerdict::Invalid(InvalidReason::MissingSubject)
        );
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let keys = keys();
        let claims = Claims {
            sub: "42".into(),
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            exp: (OffsetDateTime::now_utc() + TimeDuration::minutes(5)).unix_timestamp(),
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert_eq!(keys.verify(&token), TokenVerdict::Invalid(InvalidReason::Malformed));
    }
}
