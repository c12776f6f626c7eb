// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side access token: how it is obtained, cached and attached.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use tokio::time::Instant;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::auth::token::unix_secs;
use crate::auth::Method;
use crate::transport::grpc::proto;

/// An access token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Instant) -> Self {
        Self { token: token.into(), expires_at }
    }

    /// Convert the server's unix-seconds expiry into a local deadline.
    pub fn from_unix_expiry(token: impl Into<String>, expires_at: i64) -> Self {
        let now = i64::try_from(unix_secs(SystemTime::now())).unwrap_or(i64::MAX);
        let remaining = u64::try_from(expires_at.saturating_sub(now)).unwrap_or(0);
        Self::new(token, Instant::now() + Duration::from_secs(remaining))
    }

    /// Validity left; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Something that can log in and hand back a fresh access token.
///
/// Object-safe for use as `Arc<dyn Authenticate>`.
pub trait Authenticate: Send + Sync + 'static {
    fn login(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<AccessToken>> + Send + '_>>;
}

/// Logs in over gRPC with fixed credentials.
#[derive(Clone)]
pub struct GrpcAuthenticator {
    channel: Channel,
    username: String,
    password: String,
}

impl GrpcAuthenticator {
    pub fn new(channel: Channel, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { channel, username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for GrpcAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Authenticate for GrpcAuthenticator {
    fn login(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<AccessToken>> + Send + '_>> {
        Box::pin(async move {
            let mut client =
                proto::auth_service_client::AuthServiceClient::new(self.channel.clone());
            let req = proto::LoginRequest {
                username: self.username.clone(),
                password: self.password.clone(),
            };
            let resp = client.login(req).await?.into_inner();
            Ok(AccessToken::from_unix_expiry(resp.access_token, resp.expires_at))
        })
    }
}

/// Shared slot holding the current access token and its expiry.
#[derive(Debug, Clone)]
pub struct TokenCache {
    current: Arc<RwLock<AccessToken>>,
}

impl TokenCache {
    pub fn new(token: AccessToken) -> Self {
        Self { current: Arc::new(RwLock::new(token)) }
    }

    pub fn get(&self) -> String {
        self.current.read().token.clone()
    }

    pub fn expires_at(&self) -> Instant {
        self.current.read().expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.current.read().is_expired()
    }

    pub fn set(&self, token: AccessToken) {
        *self.current.write() = token;
    }
}

/// Client interceptor attaching `authorization: Bearer <token>`.
///
/// Methods in the skip set go out undecorated. The token is read from the
/// cache; the interceptor never logs in itself.
#[derive(Debug, Clone)]
pub struct TokenInterceptor {
    cache: TokenCache,
    skip: Arc<HashSet<Method>>,
}

impl TokenInterceptor {
    /// Interceptor that skips `Login`.
    pub fn new(cache: TokenCache) -> Self {
        Self::with_skip(cache, [Method::Login])
    }

    pub fn with_skip(cache: TokenCache, skip: impl IntoIterator<Item = Method>) -> Self {
        Self { cache, skip: Arc::new(skip.into_iter().collect()) }
    }

    fn skips(&self, req: &Request<()>) -> bool {
        req.extensions()
            .get::<tonic::GrpcMethod>()
            .and_then(|m| Method::from_name(m.service(), m.method()))
            .is_some_and(|m| self.skip.contains(&m))
    }
}

impl tonic::service::Interceptor for TokenInterceptor {
    fn call(&mut self, mut req: Request<()>) -> Result<Request<()>, Status> {
        if self.skips(&req) {
            return Ok(req);
        }
        let value: AsciiMetadataValue = format!("Bearer {}", self.cache.get())
            .parse()
            .map_err(|_| Status::unauthenticated("cached access token is not valid metadata"))?;
        req.metadata_mut().insert("authorization", value);
        Ok(req)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
