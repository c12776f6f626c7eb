// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Role carried by a user and embedded in their token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => anyhow::bail!("invalid role: {other}"),
        }
    }
}

/// A registered user. The bcrypt hash never leaves this type; callers can
/// only ask whether a password matches.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub role: Role,
    hashed_password: String,
}

impl User {
    /// Hash `password` with bcrypt at `cost`.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        role: Role,
        cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        let hashed_password = bcrypt::hash(password, cost)?;
        Ok(Self { username: username.into(), role, hashed_password })
    }

    /// Check a cleartext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.hashed_password).unwrap_or(false)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Users keyed by username.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, user: User) -> Result<(), ErrorCode> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(ErrorCode::AlreadyExists);
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    pub fn find(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

/// One entry of a users seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Accounts seeded when no users file is configured.
pub fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "admin1".to_owned(),
            password: "secret".to_owned(),
            role: Role::Admin,
        },
        SeedUser { username: "user1".to_owned(), password: "secret".to_owned(), role: Role::User },
    ]
}

/// Hash and store every seed user.
pub fn seed_users(store: &UserStore, seeds: &[SeedUser], cost: u32) -> anyhow::Result<()> {
    for seed in seeds {
        let user = User::new(seed.username.clone(), &seed.password, seed.role, cost)?;
        store
            .save(user)
            .map_err(|code| anyhow::anyhow!("cannot seed user {}: {code}", seed.username))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
