//! HS256 bearer-token validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Turns a raw bearer token into verified claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret HS256 validator.
///
/// The signature is checked by `jsonwebtoken`; the time window is checked by
/// [`validate_claims`] against the caller's clock, since the claims use
/// `issued_at`/`expires_at` timestamps rather than numeric `iat`/`exp`.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            TokenValidationError::Malformed(e.to_string())
        })?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, Role};
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(secret: &str, alg: Algorithm, claims: &JwtClaims) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            email: Some("clerk@example.com".to_string()),
            roles: vec![Role::ADMIN],
            issued_at: now,
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn accepts_token_signed_with_the_same_secret() {
        let now = Utc::now();
        let c = claims(now);
        let token = mint("s3cret", Algorithm::HS256, &c);

        let validated = Hs256JwtValidator::new("s3cret").validate(&token, now).unwrap();
        assert_eq!(validated, c);
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let now = Utc::now();
        let token = mint("s3cret", Algorithm::HS256, &claims(now));
        let validator = Hs256JwtValidator::new("other");

        assert!(matches!(
            validator.validate(&token, now),
            Err(TokenValidationError::Malformed(_))
        ));
        assert!(matches!(
            validator.validate("not-a-jwt", now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_other_algorithms() {
        let now = Utc::now();
        let token = mint("s3cret", Algorithm::HS512, &claims(now));
        assert!(Hs256JwtValidator::new("s3cret").validate(&token, now).is_err());
    }

    #[test]
    fn applies_time_window_with_callers_clock() {
        let now = Utc::now();
        let token = mint("s3cret", Algorithm::HS256, &claims(now));
        let later = now + Duration::minutes(11);

        assert_eq!(
            Hs256JwtValidator::new("s3cret").validate(&token, later),
            Err(TokenValidationError::Expired)
        );
    }
}
