// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RS256 access tokens.
//!
//! Tokens are self-contained: there is no server-side record of issued
//! tokens, and validity depends only on the signature and the `exp` claim.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::user::{Role, User};

const ALGORITHM: Algorithm = Algorithm::RS256;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: u64,
    /// Issued-at, unix seconds.
    pub iat: u64,
}

/// A freshly signed token and its expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// PEM key material could not be parsed.
    Key(String),
    Signing(String),
    /// Malformed token, wrong algorithm or bad signature.
    Invalid(String),
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(e) => write!(f, "cannot parse key material: {e}"),
            Self::Signing(e) => write!(f, "cannot sign token: {e}"),
            Self::Invalid(e) => write!(f, "invalid token: {e}"),
            Self::Expired => f.write_str("token has expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies access tokens with an RSA key pair.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    duration: Duration,
}

impl TokenManager {
    /// Parse the PEM-encoded key pair once, up front.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        duration: Duration,
    ) -> Result<Self, TokenError> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| TokenError::Key(format!("private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| TokenError::Key(format!("public key: {e}")))?;
        Ok(Self { encoding, decoding, duration })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, SystemTime::now())
    }

    /// Sign a token for `user` as if the current time were `now`.
    pub fn issue_at(&self, user: &User, now: SystemTime) -> Result<IssuedToken, TokenError> {
        let iat = unix_secs(now);
        let exp = iat.saturating_add(self.duration.as_secs());
        let claims = Claims { sub: user.username.clone(), role: user.role, exp, iat };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, expires_at: exp })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, SystemTime::now())
    }

    /// Verify signature and algorithm, then compare `exp` against `now`.
    pub fn verify_at(&self, token: &str, now: SystemTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.algorithms = vec![ALGORITHM];
        // Expiry is checked below against the supplied clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if data.claims.exp <= unix_secs(now) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").field("duration", &self.duration).finish_non_exhaustive()
    }
}

/// Seconds since the unix epoch; times before the epoch clamp to zero.
pub fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
