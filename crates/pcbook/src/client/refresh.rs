// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background access token refresh with retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::token::{AccessToken, Authenticate, TokenCache, TokenInterceptor};

/// Floor for an interval shortened to fit the token lifetime.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// How often to refresh and how hard to retry each round.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    pub interval: Duration,
    /// Extra attempts per round after the first failure.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Log in with exponential backoff retries.
pub async fn login_with_retries(
    auth: &dyn Authenticate,
    policy: &RefreshPolicy,
) -> anyhow::Result<AccessToken> {
    let mut backoff = policy.initial_backoff;

    for attempt in 0..=policy.max_retries {
        match auth.login().await {
            Ok(token) => return Ok(token),
            Err(e) => {
                if attempt == policy.max_retries {
                    return Err(e);
                }
                tracing::debug!(attempt, err = %e, "login attempt failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    }

    anyhow::bail!("login exhausted all retries")
}

/// The refresh period to use for a token valid for `validity`.
///
/// An interval that would let the token lapse between refreshes is replaced
/// by half the validity, never below one second.
pub fn refresh_interval(configured: Duration, validity: Duration) -> Duration {
    if !configured.is_zero() && configured < validity {
        return configured;
    }
    let clamped = (validity / 2).max(MIN_REFRESH_INTERVAL);
    tracing::warn!(
        configured = ?configured,
        validity = ?validity,
        interval = ?clamped,
        "refresh interval is not shorter than the token lifetime, shortening it"
    );
    clamped
}

/// Owns the token cache and the loop that keeps it fresh.
pub struct TokenRefresher {
    cache: TokenCache,
    interval: Duration,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TokenRefresher {
    /// Log in once (with retries), then refresh every `policy.interval`
    /// until `shutdown` fires. The interval is shortened when it is not
    /// below the first token's remaining validity.
    ///
    /// Fails when no first token can be obtained.
    pub async fn start(
        auth: Arc<dyn Authenticate>,
        mut policy: RefreshPolicy,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let token = login_with_retries(auth.as_ref(), &policy).await?;
        policy.interval = refresh_interval(policy.interval, token.remaining());
        tracing::info!(
            interval = ?policy.interval,
            valid_for = ?token.remaining(),
            "access token acquired"
        );
        let cache = TokenCache::new(token);
        let shutdown = shutdown.child_token();

        let interval = policy.interval;
        let handle = tokio::spawn(refresh_loop(auth, policy, cache.clone(), shutdown.clone()));
        Ok(Self { cache, interval, shutdown, handle: Some(handle) })
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn interceptor(&self) -> TokenInterceptor {
        TokenInterceptor::new(self.cache.clone())
    }

    /// Period the background loop actually refreshes at.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TokenRefresher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn refresh_loop(
    auth: Arc<dyn Authenticate>,
    policy: RefreshPolicy,
    cache: TokenCache,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + policy.interval, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = login_with_retries(auth.as_ref(), &policy) => result,
        };
        match result {
            Ok(token) => {
                cache.set(token);
                tracing::debug!("access token refreshed");
            }
            Err(e) if cache.is_expired() => {
                tracing::warn!(err = %e, "token refresh failed and the cached token has expired");
            }
            Err(e) => {
                tracing::warn!(err = %e, "token refresh failed, keeping cached token");
            }
        }
    }
    tracing::debug!("token refresh stopped");
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
