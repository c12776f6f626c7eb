// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::auth::token::{IssuedToken, TokenManager};
use crate::auth::user::{Role, User, UserStore};
use crate::error::ErrorCode;

/// Message returned for both unknown users and wrong passwords.
pub const INVALID_CREDENTIALS: &str = "incorrect username/password";

/// Verifies credentials and issues access tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<UserStore>,
    tokens: Arc<TokenManager>,
    /// Compared against when the username is unknown, so both failure paths
    /// pay for one bcrypt verification.
    dummy: User,
}

impl AuthService {
    pub fn new(
        users: Arc<UserStore>,
        tokens: Arc<TokenManager>,
        bcrypt_cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        let dummy = User::new("", "pcbook-dummy-password", Role::User, bcrypt_cost)?;
        Ok(Self { users, tokens, dummy })
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Check `password` for `username` and sign a token on success.
    ///
    /// Unknown user and wrong password both fail with `NotFound`.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, ErrorCode> {
        let user = self.users.find(username);
        let candidate = user.clone().unwrap_or_else(|| self.dummy.clone());
        let password = password.to_owned();

        let matched = tokio::task::spawn_blocking(move || candidate.verify_password(&password))
            .await
            .map_err(|e| {
                tracing::error!(err = %e, "password verification task failed");
                ErrorCode::Internal
            })?;

        let user = match user {
            Some(user) if matched => user,
            Some(_) => {
                tracing::warn!(username, "login rejected: wrong password");
                return Err(ErrorCode::NotFound);
            }
            None => {
                tracing::warn!(username, "login rejected: unknown user");
                return Err(ErrorCode::NotFound);
            }
        };

        let issued = self.tokens.issue(&user).map_err(|e| {
            tracing::error!(username, err = %e, "cannot issue access token");
            ErrorCode::Internal
        })?;
        tracing::info!(username, role = %user.role, "user logged in");
        Ok(issued)
    }
}
