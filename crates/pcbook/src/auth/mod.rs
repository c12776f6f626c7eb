// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication and authorization.
//!
//! Users log in through [`AuthService`] and receive an RS256 token from the
//! [`TokenManager`]. Every later call is checked by the [`Authorizer`]
//! against a [`RolePolicy`] before it reaches a handler.

pub mod policy;
pub mod service;
pub mod token;
pub mod user;

use std::fmt;
use std::sync::Arc;

pub use policy::{Access, Method, RolePolicy};
pub use service::{AuthService, INVALID_CREDENTIALS};
pub use token::{Claims, IssuedToken, TokenError, TokenManager};
pub use user::{Role, SeedUser, User, UserStore};

use crate::error::ErrorCode;

/// Why a call was refused at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken(TokenError),
    PermissionDenied { role: Role, method: Option<Method> },
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) => ErrorCode::Unauthenticated,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
        }
    }

    pub fn to_status(&self) -> tonic::Status {
        self.code().to_grpc_status(self.to_string())
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => f.write_str("authorization token is not provided"),
            Self::InvalidToken(e) => write!(f, "access token is invalid: {e}"),
            Self::PermissionDenied { .. } => f.write_str("no permission to access this RPC"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Decides whether a call may proceed, given its method and the raw
/// `authorization` header value.
#[derive(Debug, Clone)]
pub struct Authorizer {
    tokens: Arc<TokenManager>,
    policy: Arc<RolePolicy>,
}

impl Authorizer {
    pub fn new(tokens: Arc<TokenManager>, policy: RolePolicy) -> Self {
        Self { tokens, policy: Arc::new(policy) }
    }

    /// `Ok(None)` for public methods, `Ok(Some(claims))` for an authorized
    /// caller. Unknown methods and methods without a rule are denied once the
    /// caller is authenticated.
    pub fn authorize(
        &self,
        method: Option<Method>,
        header: Option<&str>,
    ) -> Result<Option<Claims>, AuthError> {
        let access = method.and_then(|m| self.policy.access(m));
        if let Some(Access::Public) = access {
            return Ok(None);
        }

        let token = header.and_then(bearer_token).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token).map_err(AuthError::InvalidToken)?;

        match access {
            Some(Access::Roles(roles)) if roles.contains(&claims.role) => Ok(Some(claims)),
            _ => Err(AuthError::PermissionDenied { role: claims.role, method }),
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer "))?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
