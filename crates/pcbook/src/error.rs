// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error kinds shared by the stores, the auth layer and the gRPC
/// handlers. Call sites branch on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    Unauthenticated,
    PermissionDenied,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl ErrorCode {
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::InvalidArgument => tonic::Code::InvalidArgument,
            Self::AlreadyExists => tonic::Code::AlreadyExists,
            Self::NotFound => tonic::Code::NotFound,
            Self::Unauthenticated => tonic::Code::Unauthenticated,
            Self::PermissionDenied => tonic::Code::PermissionDenied,
            Self::Cancelled => tonic::Code::Cancelled,
            Self::DeadlineExceeded => tonic::Code::DeadlineExceeded,
            Self::Internal => tonic::Code::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Cancelled => "CANCELLED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Internal => "INTERNAL",
        }
    }

    /// Convert this error code into a [`tonic::Status`] with the given message.
    pub fn to_grpc_status(&self, message: impl Into<String>) -> tonic::Status {
        tonic::Status::new(self.grpc_code(), message)
    }

    /// Message used when the code itself is all the caller needs.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::AlreadyExists => "record already exists",
            Self::NotFound => "record not found",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "no permission to access this RPC",
            Self::Cancelled => "request is canceled",
            Self::DeadlineExceeded => "request deadline exceeded",
            Self::Internal => "internal error",
        }
    }
}

impl From<ErrorCode> for tonic::Status {
    fn from(code: ErrorCode) -> Self {
        code.to_grpc_status(code.default_message())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ErrorCode {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
