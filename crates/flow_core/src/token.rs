//! Bearer token issuance and verification.
//!
//! Tokens are stateless HS256 JWTs carrying the account id and email. They
//! live for 72 hours and cannot be revoked.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{TokenError, TokenResult};

pub const TOKEN_LIFETIME_HOURS: i64 = 72;

/// Claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub id: i64,
    pub email: String,
    pub iss: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Signs and checks bearer tokens for a single issuer.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(issuer: impl Into<String>, secret: &str) -> Self {
        // Expiry and issuer are checked by hand so the failures stay distinct
        // and the clock can be injected.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.issuer.clone(), &config.secret)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for an account, valid from now.
    pub fn issue(&self, id: i64, email: &str) -> TokenResult<String> {
        self.issue_at(id, email, Utc::now())
    }

    pub fn issue_at(&self, id: i64, email: &str, now: DateTime<Utc>) -> TokenResult<String> {
        let claims = Claims {
            id,
            email: email.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Check the signature and return the claims without judging them.
    pub fn decode(&self, token: &str) -> TokenResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    /// Verify a token and return the account id it was issued for.
    pub fn verify(&self, token: &str) -> TokenResult<i64> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<i64> {
        let claims = self.decode(token)?;
        self.check_claims(&claims, now)?;
        Ok(claims.id)
    }

    /// Expiry is checked first: an expired token is `Expired` whoever issued it.
    pub fn check_claims(&self, claims: &Claims, now: DateTime<Utc>) -> TokenResult<()> {
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.iss != self.issuer {
            return Err(TokenError::WrongIssuer);
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
