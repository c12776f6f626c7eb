// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-call cancellation and deadline tracking.
//!
//! Handlers check the context between loop iterations (search results,
//! upload chunks, rating messages) and abort with `Cancelled` or
//! `DeadlineExceeded` instead of running to completion.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ErrorCode;

/// Cancellation signal plus optional deadline for one in-flight call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context from request metadata, honouring `grpc-timeout`.
    pub fn from_metadata(metadata: &tonic::metadata::MetadataMap) -> Self {
        let timeout = metadata
            .get("grpc-timeout")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout);
        match timeout {
            Some(timeout) => Self::new().with_timeout(timeout),
            None => Self::new(),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cooperative check: `Err` once the call was cancelled or its deadline passed.
    pub fn check(&self) -> Result<(), ErrorCode> {
        if self.cancel.is_cancelled() {
            return Err(ErrorCode::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ErrorCode::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolve once the call is cancelled or the deadline is reached.
    ///
    /// Never resolves for a context with neither a deadline nor a cancellation.
    pub async fn done(&self) -> ErrorCode {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => ErrorCode::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ErrorCode::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                ErrorCode::Cancelled
            }
        }
    }
}

/// Parse a `grpc-timeout` header value (`<digits><unit>`, unit one of
/// `H M S m u n`).
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
