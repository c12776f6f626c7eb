// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-method access table consulted by the authorization layer.

use std::collections::{HashMap, HashSet};

use crate::auth::user::Role;

pub const AUTH_SERVICE: &str = "pcbook.v1.AuthService";
pub const LAPTOP_SERVICE: &str = "pcbook.v1.LaptopService";

/// Every RPC exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Login,
    CreateLaptop,
    SearchLaptop,
    UploadImage,
    RateLaptop,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Self::Login,
        Self::CreateLaptop,
        Self::SearchLaptop,
        Self::UploadImage,
        Self::RateLaptop,
    ];

    /// RPC name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::CreateLaptop => "CreateLaptop",
            Self::SearchLaptop => "SearchLaptop",
            Self::UploadImage => "UploadImage",
            Self::RateLaptop => "RateLaptop",
        }
    }

    /// Fully qualified service the RPC belongs to.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Login => AUTH_SERVICE,
            _ => LAPTOP_SERVICE,
        }
    }

    /// HTTP/2 request path, e.g. `/pcbook.v1.LaptopService/CreateLaptop`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service(), self.name())
    }

    pub fn from_name(service: &str, name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.service() == service && m.name() == name)
    }

    /// Resolve a request path. Unknown services or methods yield `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let (service, name) = path.strip_prefix('/')?.split_once('/')?;
        Self::from_name(service, name)
    }
}

/// Who may call a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No token required.
    Public,
    /// Authenticated callers whose role is in the set.
    Roles(HashSet<Role>),
}

/// Method → access table. Methods without an entry are denied.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    rules: HashMap<Method, Access>,
}

impl RolePolicy {
    /// An empty policy: every method is denied.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, method: Method) -> Self {
        self.rules.insert(method, Access::Public);
        self
    }

    /// Grant `roles` access to `method`, replacing any previous rule.
    pub fn allow(mut self, method: Method, roles: impl IntoIterator<Item = Role>) -> Self {
        self.rules.insert(method, Access::Roles(roles.into_iter().collect()));
        self
    }

    pub fn access(&self, method: Method) -> Option<&Access> {
        self.rules.get(&method)
    }

    /// The catalog's standard rules.
    pub fn standard() -> Self {
        Self::new()
            .public(Method::Login)
            .allow(Method::CreateLaptop, [Role::Admin])
            .allow(Method::UploadImage, [Role::Admin])
            .allow(Method::SearchLaptop, [Role::Admin, Role::User])
            .allow(Method::RateLaptop, [Role::Admin, Role::User])
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
